//! WebSocket Stream Client
//!
//! tokio-tungstenite adapter behind the stream ports. The connected
//! WebSocket is split into its sink and stream halves: the write half is
//! registered with the connection manager, the read half is handed to that
//! client's reader loop.
//!
//! Ping frames are answered by tungstenite itself on the next read/flush;
//! the read port only surfaces data frames.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::application::ports::{StreamConnector, StreamRead, StreamWrite, TransportError};
use crate::domain::streaming::FrameKind;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn map_ws_error(error: tokio_tungstenite::tungstenite::Error) -> TransportError {
    use tokio_tungstenite::tungstenite::Error;
    match error {
        Error::ConnectionClosed | Error::AlreadyClosed => TransportError::Closed,
        other => TransportError::Io(other.to_string()),
    }
}

// =============================================================================
// Connector
// =============================================================================

/// [`StreamConnector`] backed by a TLS WebSocket dial.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    /// Create a new WebSocket connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Box<dyn StreamWrite>, Box<dyn StreamRead>), TransportError> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let (write, read) = ws_stream.split();
        Ok((
            Box::new(WsStreamWrite { write }),
            Box::new(WsStreamRead { read }),
        ))
    }
}

// =============================================================================
// Write Half
// =============================================================================

struct WsStreamWrite {
    write: SplitSink<WsStream, Message>,
}

#[async_trait]
impl StreamWrite for WsStreamWrite {
    async fn write(&mut self, kind: FrameKind, payload: Vec<u8>) -> Result<(), TransportError> {
        let message = match kind {
            FrameKind::Text => {
                let text = String::from_utf8(payload)
                    .map_err(|e| TransportError::Io(format!("invalid UTF-8 text frame: {e}")))?;
                Message::Text(text.into())
            }
            FrameKind::Binary => Message::Binary(payload.into()),
        };

        self.write.send(message).await.map_err(map_ws_error)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // Normal-closure frame before releasing the socket.
        self.write
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: "close requested".into(),
            })))
            .await
            .map_err(map_ws_error)?;

        self.write.close().await.map_err(map_ws_error)
    }
}

// =============================================================================
// Read Half
// =============================================================================

struct WsStreamRead {
    read: SplitStream<WsStream>,
}

#[async_trait]
impl StreamRead for WsStreamRead {
    async fn read(&mut self) -> Result<(FrameKind, Vec<u8>), TransportError> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok((FrameKind::Text, text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok((FrameKind::Binary, data.to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                Some(Ok(_)) => {
                    // Ping/pong and raw frames are transport noise.
                }
                Some(Err(e)) => return Err(map_ws_error(e)),
            }
        }
    }
}
