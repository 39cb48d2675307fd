//! CCData WebSocket Message Types
//!
//! Wire format types for the CCData index streamer. Outbound subscription
//! requests are JSON text frames; inbound records carry a `"TYPE"` field
//! identifying which decoding schema applies.
//!
//! # Message Types
//!
//! ## Outbound (client -> server)
//! - `SubscriptionRequest`: add or remove subscriptions for one product
//!
//! ## Inbound (server -> client)
//! - `IndexTickMessage`: aggregate index tick, type tag `"1101"`
//! - Anything else is observed by tag only and left undecoded
//!
//! # Wire Format (outbound)
//!
//! ```json
//! {
//!   "action": "SUB_ADD",
//!   "type": "1101",
//!   "groups": ["VALUE", "CURRENT_HOUR"],
//!   "subscriptions": [{"market": "cadli", "instrument": "BTC-USD"}]
//! }
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{INDEX_TICK_PRODUCT, InstrumentSpec, ProductName};

// =============================================================================
// Subscription Protocol (Outbound)
// =============================================================================

/// Action of a subscription request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionAction {
    /// Add subscriptions.
    #[serde(rename = "SUB_ADD")]
    Add,
    /// Remove subscriptions.
    #[serde(rename = "SUB_REMOVE")]
    Remove,
}

/// A named subset of fields the provider includes in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseGroup {
    /// Current index value and its update timestamps.
    #[serde(rename = "VALUE")]
    Value,
    /// Rolling current-hour aggregates.
    #[serde(rename = "CURRENT_HOUR")]
    CurrentHour,
}

/// Inbound message classes this client knows how to decode.
///
/// The provider identifies message schemas by a numeric-string type tag;
/// the same tag doubles as the subscription `type` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// Aggregate index tick (tag `"1101"`).
    IndexTick,
}

impl MessageClass {
    /// Resolve the message class subscribed by a catalog product name.
    ///
    /// Returns `None` for product names with no registered class, which the
    /// subscription layer reports as an error.
    #[must_use]
    pub fn for_product(name: &ProductName) -> Option<Self> {
        match name.as_str() {
            INDEX_TICK_PRODUCT => Some(Self::IndexTick),
            _ => None,
        }
    }

    /// Resolve a class from an inbound `"TYPE"` tag.
    #[must_use]
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "1101" => Some(Self::IndexTick),
            _ => None,
        }
    }

    /// The numeric-string type tag used on the wire.
    #[must_use]
    pub const fn type_tag(self) -> &'static str {
        match self {
            Self::IndexTick => "1101",
        }
    }

    /// The fixed response groups enabled for this class's subscriptions.
    #[must_use]
    pub const fn response_groups(self) -> &'static [ResponseGroup] {
        match self {
            Self::IndexTick => &[ResponseGroup::Value, ResponseGroup::CurrentHour],
        }
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IndexTick => "index_tick",
        }
    }
}

/// One market/instrument pair inside a subscription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentPair {
    /// Market (index family).
    pub market: String,
    /// Instrument identifier.
    pub instrument: String,
}

impl From<&InstrumentSpec> for InstrumentPair {
    fn from(spec: &InstrumentSpec) -> Self {
        Self {
            market: spec.market.clone(),
            instrument: spec.instrument.clone(),
        }
    }
}

/// Subscription request for one product.
///
/// Immutable once constructed; serialized to the wire verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    /// Request action.
    pub action: SubscriptionAction,

    /// Numeric-string product code.
    #[serde(rename = "type")]
    pub message_type: &'static str,

    /// Enabled response groups, in protocol order.
    pub groups: Vec<ResponseGroup>,

    /// Instruments to subscribe, in input order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subscriptions: Vec<InstrumentPair>,
}

impl SubscriptionRequest {
    /// Create an add request with the class's fixed response groups.
    #[must_use]
    pub fn add(class: MessageClass, subscriptions: Vec<InstrumentPair>) -> Self {
        Self {
            action: SubscriptionAction::Add,
            message_type: class.type_tag(),
            groups: class.response_groups().to_vec(),
            subscriptions,
        }
    }

    /// Create a remove request with the class's fixed response groups.
    #[must_use]
    pub fn remove(class: MessageClass, subscriptions: Vec<InstrumentPair>) -> Self {
        Self {
            action: SubscriptionAction::Remove,
            message_type: class.type_tag(),
            groups: class.response_groups().to_vec(),
            subscriptions,
        }
    }
}

// =============================================================================
// Index Tick (Inbound)
// =============================================================================

/// Aggregate index tick from the streamer.
///
/// `CURRENT_HOUR` fields only arrive when that response group is enabled,
/// so they default to zero when absent.
///
/// # Wire Format (JSON, abridged)
/// ```json
/// {
///   "TYPE": "1101",
///   "MARKET": "cadli",
///   "INSTRUMENT": "BTC-USD",
///   "CCSEQ": 4182,
///   "VALUE": 64250.37,
///   "VALUE_FLAG": "UP",
///   "VALUE_LAST_UPDATE_TS": 1722470400,
///   "VALUE_LAST_UPDATE_TS_NS": 250000000,
///   "CURRENT_HOUR_VOLUME": 1845.2,
///   "CURRENT_HOUR_OPEN": 64110.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTickMessage {
    /// Message type (always "1101").
    #[serde(rename = "TYPE")]
    pub msg_type: String,

    /// Market (index family) the tick belongs to.
    #[serde(rename = "MARKET")]
    pub market: String,

    /// Instrument identifier, e.g. "BTC-USD".
    #[serde(rename = "INSTRUMENT")]
    pub instrument: String,

    /// Per-instrument sequence number, monotonically nondecreasing.
    #[serde(rename = "CCSEQ")]
    pub sequence: u64,

    /// Current index value.
    #[serde(rename = "VALUE")]
    pub value: Decimal,

    /// Direction flag for the last value change ("UP", "DOWN", ...).
    #[serde(rename = "VALUE_FLAG", default)]
    pub value_flag: String,

    /// Seconds component of the last value update time.
    #[serde(rename = "VALUE_LAST_UPDATE_TS")]
    pub value_updated_ts: u64,

    /// Nanosecond offset of the last value update time.
    #[serde(rename = "VALUE_LAST_UPDATE_TS_NS")]
    pub value_updated_ts_ns: u64,

    /// Base volume in the current hour.
    #[serde(rename = "CURRENT_HOUR_VOLUME", default)]
    pub hour_volume: Decimal,

    /// Quote volume in the current hour.
    #[serde(rename = "CURRENT_HOUR_QUOTE_VOLUME", default)]
    pub hour_quote_volume: Decimal,

    /// Top-tier base volume in the current hour.
    #[serde(rename = "CURRENT_HOUR_VOLUME_TOP_TIER", default)]
    pub hour_volume_top_tier: Decimal,

    /// Top-tier quote volume in the current hour.
    #[serde(rename = "CURRENT_HOUR_QUOTE_VOLUME_TOP_TIER", default)]
    pub hour_quote_volume_top_tier: Decimal,

    /// Direct base volume in the current hour.
    #[serde(rename = "CURRENT_HOUR_VOLUME_DIRECT", default)]
    pub hour_volume_direct: Decimal,

    /// Direct quote volume in the current hour.
    #[serde(rename = "CURRENT_HOUR_QUOTE_VOLUME_DIRECT", default)]
    pub hour_quote_volume_direct: Decimal,

    /// Top-tier direct base volume in the current hour.
    #[serde(rename = "CURRENT_HOUR_VOLUME_TOP_TIER_DIRECT", default)]
    pub hour_volume_top_tier_direct: Decimal,

    /// Top-tier direct quote volume in the current hour.
    #[serde(rename = "CURRENT_HOUR_QUOTE_VOLUME_TOP_TIER_DIRECT", default)]
    pub hour_quote_volume_top_tier_direct: Decimal,

    /// Index value at the start of the current hour.
    #[serde(rename = "CURRENT_HOUR_OPEN", default)]
    pub hour_open: Decimal,

    /// Highest index value in the current hour.
    #[serde(rename = "CURRENT_HOUR_HIGH", default)]
    pub hour_high: Decimal,

    /// Lowest index value in the current hour.
    #[serde(rename = "CURRENT_HOUR_LOW", default)]
    pub hour_low: Decimal,

    /// Number of index updates in the current hour.
    #[serde(rename = "CURRENT_HOUR_TOTAL_INDEX_UPDATES", default)]
    pub hour_total_index_updates: u64,

    /// Absolute value change over the current hour.
    #[serde(rename = "CURRENT_HOUR_CHANGE", default)]
    pub hour_change: Decimal,

    /// Percentage value change over the current hour.
    #[serde(rename = "CURRENT_HOUR_CHANGE_PERCENTAGE", default)]
    pub hour_change_percentage: Decimal,
}

impl IndexTickMessage {
    /// The last value update instant as a UTC datetime.
    ///
    /// Returns `None` if the seconds/nanoseconds pair is out of range for
    /// a representable datetime.
    #[must_use]
    pub fn value_timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.value_updated_ts).ok()?;
        let nanos = u32::try_from(self.value_updated_ts_ns).ok()?;
        DateTime::from_timestamp(secs, nanos)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn serialize_add_request() {
        let request = SubscriptionRequest::add(
            MessageClass::IndexTick,
            vec![InstrumentPair {
                market: "cadli".to_string(),
                instrument: "BTC-USD".to_string(),
            }],
        );

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""action":"SUB_ADD""#));
        assert!(json.contains(r#""type":"1101""#));
        assert!(json.contains(r#""groups":["VALUE","CURRENT_HOUR"]"#));
        assert!(json.contains(r#"{"market":"cadli","instrument":"BTC-USD"}"#));
    }

    #[test]
    fn serialize_remove_request() {
        let request = SubscriptionRequest::remove(
            MessageClass::IndexTick,
            vec![InstrumentPair {
                market: "cadli".to_string(),
                instrument: "ETH-USD".to_string(),
            }],
        );

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""action":"SUB_REMOVE""#));
    }

    #[test]
    fn empty_subscriptions_are_omitted() {
        let request = SubscriptionRequest::add(MessageClass::IndexTick, vec![]);
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("subscriptions"));
    }

    #[test]
    fn message_class_tag_round_trip() {
        let class = MessageClass::IndexTick;
        assert_eq!(MessageClass::from_type_tag(class.type_tag()), Some(class));
        assert_eq!(MessageClass::from_type_tag("9999"), None);
    }

    #[test]
    fn message_class_for_known_product() {
        assert_eq!(
            MessageClass::for_product(&ProductName::from(INDEX_TICK_PRODUCT)),
            Some(MessageClass::IndexTick)
        );
        assert_eq!(MessageClass::for_product(&ProductName::from("orderbook")), None);
    }

    #[test]
    fn deserialize_index_tick() {
        let json = r#"{
            "TYPE": "1101",
            "MARKET": "cadli",
            "INSTRUMENT": "BTC-USD",
            "CCSEQ": 4182,
            "VALUE": 64250.37,
            "VALUE_FLAG": "UP",
            "VALUE_LAST_UPDATE_TS": 1722470400,
            "VALUE_LAST_UPDATE_TS_NS": 250000000,
            "CURRENT_HOUR_VOLUME": 1845.2,
            "CURRENT_HOUR_QUOTE_VOLUME": 118570000.5,
            "CURRENT_HOUR_OPEN": 64110.0,
            "CURRENT_HOUR_HIGH": 64310.5,
            "CURRENT_HOUR_LOW": 64050.25,
            "CURRENT_HOUR_TOTAL_INDEX_UPDATES": 913,
            "CURRENT_HOUR_CHANGE": 140.37,
            "CURRENT_HOUR_CHANGE_PERCENTAGE": 0.22
        }"#;

        let tick: IndexTickMessage = serde_json::from_str(json).unwrap();
        assert_eq!(tick.msg_type, "1101");
        assert_eq!(tick.instrument, "BTC-USD");
        assert_eq!(tick.sequence, 4182);
        assert_eq!(tick.value, Decimal::new(6_425_037, 2));
        assert_eq!(tick.hour_total_index_updates, 913);
    }

    #[test]
    fn deserialize_index_tick_without_hour_group() {
        let json = r#"{
            "TYPE": "1101",
            "MARKET": "cadli",
            "INSTRUMENT": "BTC-USD",
            "CCSEQ": 1,
            "VALUE": 100.0,
            "VALUE_LAST_UPDATE_TS": 1722470400,
            "VALUE_LAST_UPDATE_TS_NS": 0
        }"#;

        let tick: IndexTickMessage = serde_json::from_str(json).unwrap();
        assert_eq!(tick.hour_volume, Decimal::ZERO);
        assert_eq!(tick.hour_total_index_updates, 0);
        assert!(tick.value_flag.is_empty());
    }

    #[test]
    fn value_timestamp_combines_seconds_and_nanos() {
        let json = r#"{
            "TYPE": "1101",
            "MARKET": "cadli",
            "INSTRUMENT": "BTC-USD",
            "CCSEQ": 1,
            "VALUE": 100.0,
            "VALUE_LAST_UPDATE_TS": 1722470400,
            "VALUE_LAST_UPDATE_TS_NS": 250000000
        }"#;

        let tick: IndexTickMessage = serde_json::from_str(json).unwrap();
        let ts = tick.value_timestamp().unwrap();
        assert_eq!(ts.timestamp(), 1_722_470_400);
        assert_eq!(ts.timestamp_subsec_nanos(), 250_000_000);
    }

    proptest! {
        #[test]
        fn one_subscription_entry_per_instrument_in_order(
            instruments in proptest::collection::vec("[A-Z]{2,5}-USD", 0..8)
        ) {
            let pairs: Vec<InstrumentPair> = instruments
                .iter()
                .map(|instrument| InstrumentPair {
                    market: "cadli".to_string(),
                    instrument: instrument.clone(),
                })
                .collect();

            let request = SubscriptionRequest::add(MessageClass::IndexTick, pairs);
            prop_assert_eq!(request.subscriptions.len(), instruments.len());
            for (pair, instrument) in request.subscriptions.iter().zip(&instruments) {
                prop_assert_eq!(&pair.instrument, instrument);
            }
        }
    }
}
