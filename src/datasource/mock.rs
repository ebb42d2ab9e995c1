//! Mock order store for testing without network calls.

use super::{OrderStore, OrderStoreError};
use crate::domain::{NicheMap, Order};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Mock order store returning predefined test data.
#[derive(Debug, Clone, Default)]
pub struct MockOrderStore {
    orders: Vec<Order>,
    niche_map: NicheMap,
    failure: Option<OrderStoreError>,
}

impl MockOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn with_orders(mut self, orders: Vec<Order>) -> Self {
        self.orders.extend(orders);
        self
    }

    pub fn with_niche_map(mut self, niche_map: NicheMap) -> Self {
        self.niche_map = niche_map;
        self
    }

    /// Make every fetch fail with the given error.
    pub fn with_failure(mut self, failure: OrderStoreError) -> Self {
        self.failure = Some(failure);
        self
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn fetch_orders(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Order>, OrderStoreError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self
            .orders
            .iter()
            .filter(|o| {
                let dia = o.payment_date.date();
                dia >= start && dia <= end
            })
            .cloned()
            .collect())
    }

    async fn fetch_niche_map(&self) -> Result<NicheMap, OrderStoreError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self.niche_map.clone())
    }
}
