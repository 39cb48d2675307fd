//! Product Catalog
//!
//! Static lookup of the index products this process subscribes to. The
//! catalog is an external collaborator of the ingestion core: it only maps
//! product names to instrument lists. Which response groups a product
//! enables is protocol knowledge and lives with the wire types.

use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Types
// =============================================================================

/// Name of the aggregate index tick product.
pub const INDEX_TICK_PRODUCT: &str = "index_tick";

/// A named product from the catalog.
///
/// Product names are opaque to the catalog; the subscription layer resolves
/// them to message classes and response groups, and reports names it does
/// not know.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductName(String);

impl ProductName {
    /// Create a product name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// One market/instrument pair a product subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSpec {
    /// Market (index family) the instrument belongs to.
    pub market: String,
    /// Instrument identifier, e.g. `BTC-USD`.
    pub instrument: String,
}

/// Mapping from product name to the instruments to subscribe for it.
pub type ProductSubscriptions = HashMap<ProductName, Vec<InstrumentSpec>>;

// =============================================================================
// Catalog
// =============================================================================

/// Load the configured product subscriptions.
#[must_use]
pub fn load() -> ProductSubscriptions {
    HashMap::from([(
        ProductName::from(INDEX_TICK_PRODUCT),
        vec![InstrumentSpec {
            market: "cadli".to_string(),
            instrument: "BTC-USD".to_string(),
        }],
    )])
}
