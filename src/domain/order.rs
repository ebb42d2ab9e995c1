//! Order type representing a single fulfilled sale line.

use crate::domain::{AdId, Decimal, Nicho, Sku};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One fulfilled sale line, as ingested from the order store.
///
/// Orders are immutable once ingested for a given computation; corrections
/// arrive as fresh snapshots reprocessed from the store, not as deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier, unique within a cart. May be empty on malformed
    /// upstream rows; `order_key` falls back to a content hash then.
    pub order_id: String,
    /// Cart the order line belongs to.
    pub cart_id: String,
    /// Advertisement identifier; empty for organic sales.
    pub ad: AdId,
    pub sku: Sku,
    pub title: String,
    pub quantity: u32,
    /// Gross order value (revenue).
    pub total_value: Decimal,
    /// Payment timestamp; drives all time bucketing.
    pub payment_date: NaiveDateTime,
    pub status: String,
    pub cost: Decimal,
    pub gross_profit: Decimal,
    pub taxes: Decimal,
    pub freight: Decimal,
    /// Marketplace commission fee.
    pub committee: Decimal,
    /// Fractional allocation factor for multi-line carts.
    pub fraction: Decimal,
    pub profitability: Decimal,
    pub rentability: Decimal,
    pub store: String,
    /// Net profit as persisted upstream. Treated as a display cache only;
    /// aggregation always recomputes via [`Order::net_profit`].
    pub profit: Decimal,
    /// Niche carried on the order row itself, when the upstream join
    /// already resolved one.
    pub nicho: Option<Nicho>,
}

impl Order {
    /// Net profit derived from the cost fields.
    ///
    /// `gross_profit - taxes - freight - committee`. The stored `profit`
    /// column is never trusted here so that late corrections to any cost
    /// field propagate into every recomputed aggregate.
    pub fn net_profit(&self) -> Decimal {
        self.gross_profit - self.taxes - self.freight - self.committee
    }

    /// Stable unique key for this order line.
    ///
    /// Priority: `order_id` (if non-empty) > hash of deterministic fields.
    pub fn order_key(&self) -> String {
        if !self.order_id.is_empty() {
            return format!("id:{}:{}", self.cart_id, self.order_id);
        }

        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(self.cart_id.as_bytes());
        hasher.update(self.sku.as_str().as_bytes());
        hasher.update(self.payment_date.and_utc().timestamp_millis().to_le_bytes());
        hasher.update(self.quantity.to_le_bytes());
        hasher.update(self.total_value.to_canonical_string().as_bytes());
        hasher.update(self.gross_profit.to_canonical_string().as_bytes());
        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }
}
