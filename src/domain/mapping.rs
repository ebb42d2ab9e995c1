//! SKU to niche association, supplied read-only at computation time.

use crate::domain::{Nicho, Order, Sku};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only SKU → niche lookup.
///
/// Externally managed (bulk upload, manual entry); the engine only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicheMap {
    entries: BTreeMap<Sku, Nicho>,
}

impl NicheMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (Sku, Nicho)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, sku: Sku, nicho: Nicho) {
        self.entries.insert(sku, nicho);
    }

    pub fn get(&self, sku: &Sku) -> Option<&Nicho> {
        self.entries.get(sku)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the niche bucket for an order.
    ///
    /// Resolution order: mapping hit, then the niche carried on the order
    /// row, then the "Sem nicho" bucket. Every order lands in exactly one
    /// bucket.
    pub fn resolve(&self, order: &Order) -> Nicho {
        if let Some(nicho) = self.entries.get(&order.sku) {
            return nicho.clone();
        }
        order.nicho.clone().unwrap_or_else(Nicho::sem_nicho)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdId, Decimal};
    use chrono::NaiveDate;

    fn order_with(sku: &str, nicho: Option<&str>) -> Order {
        Order {
            order_id: "O-1".to_string(),
            cart_id: "C-1".to_string(),
            ad: AdId::new(""),
            sku: Sku::new(sku),
            title: String::new(),
            quantity: 1,
            total_value: Decimal::from_i64(10),
            payment_date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            status: "pago".to_string(),
            cost: Decimal::zero(),
            gross_profit: Decimal::zero(),
            taxes: Decimal::zero(),
            freight: Decimal::zero(),
            committee: Decimal::zero(),
            fraction: Decimal::from_i64(1),
            profitability: Decimal::zero(),
            rentability: Decimal::zero(),
            store: String::new(),
            profit: Decimal::zero(),
            nicho: nicho.map(Nicho::new),
        }
    }

    #[test]
    fn test_resolve_prefers_mapping() {
        let map = NicheMap::from_entries([(Sku::new("A"), Nicho::new("calcados"))]);
        let order = order_with("A", Some("roupas"));
        assert_eq!(map.resolve(&order), Nicho::new("calcados"));
    }

    #[test]
    fn test_resolve_falls_back_to_order_field() {
        let map = NicheMap::new();
        let order = order_with("A", Some("roupas"));
        assert_eq!(map.resolve(&order), Nicho::new("roupas"));
    }

    #[test]
    fn test_resolve_unmapped_is_sem_nicho() {
        let map = NicheMap::new();
        let order = order_with("A", None);
        assert!(map.resolve(&order).is_sem_nicho());
    }
}
