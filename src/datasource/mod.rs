//! Order-store collaborator boundary.
//!
//! The engine never talks to persistence directly: it consumes this trait,
//! implemented by an HTTP client against the upstream sells API in
//! production and by [`MockOrderStore`] in tests.

use crate::domain::{NicheMap, Order};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

pub mod http;
pub mod mock;

pub use http::HttpOrderStore;
pub use mock::MockOrderStore;

/// Query interface over the external order store.
///
/// Implementations must handle retry/backoff and rate limiting; callers
/// treat any error as `StoreUnavailable` and degrade to an error-status
/// report rather than crashing.
#[async_trait]
pub trait OrderStore: Send + Sync + fmt::Debug {
    /// Fetch orders whose payment date falls in `[start, end]` inclusive.
    async fn fetch_orders(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Order>, OrderStoreError>;

    /// Fetch the current SKU → niche mapping.
    async fn fetch_niche_map(&self) -> Result<NicheMap, OrderStoreError>;
}

/// Error type for order-store operations.
#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Error: {0}")]
    Other(String),
}
