//! Domain primitives: Sku, AdId, Nicho.

use serde::{Deserialize, Serialize};

/// Product SKU code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sku(pub String);

impl Sku {
    pub fn new(sku: impl Into<String>) -> Self {
        Sku(sku.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Advertisement identifier. Empty for organic sales.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdId(pub String);

impl AdId {
    pub fn new(ad: impl Into<String>) -> Self {
        AdId(ad.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for AdId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Merchandising niche assigned to a SKU.
///
/// A SKU without any niche assignment falls into the canonical
/// [`Nicho::sem_nicho`] bucket; it is a trackable state, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Nicho(pub String);

/// Label of the bucket for SKUs with no niche assignment.
pub const SEM_NICHO: &str = "Sem nicho";

impl Nicho {
    pub fn new(nicho: impl Into<String>) -> Self {
        Nicho(nicho.into())
    }

    /// The "no niche" bucket.
    pub fn sem_nicho() -> Self {
        Nicho(SEM_NICHO.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_sem_nicho(&self) -> bool {
        self.0 == SEM_NICHO
    }
}

impl std::fmt::Display for Nicho {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
