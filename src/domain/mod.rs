//! Domain types and determinism layer for the sales reporting engine.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: Sku, AdId, Nicho
//! - The Order record with the recomputed net-profit invariant
//! - The read-only SKU → niche mapping

pub mod decimal;
pub mod mapping;
pub mod order;
pub mod primitives;

pub use decimal::Decimal;
pub use mapping::NicheMap;
pub use order::Order;
pub use primitives::{AdId, Nicho, Sku, SEM_NICHO};
