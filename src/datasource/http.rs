//! HTTP client for the upstream sells API.
//!
//! The upstream responds with a cart-keyed object: `{"<cart_id>": [order,
//! ...], ...}` (or a flat list on some deployments). Malformed order entries
//! are logged and skipped; they must never poison a whole fetch.

use super::{OrderStore, OrderStoreError};
use crate::domain::{AdId, Decimal, NicheMap, Nicho, Order, Sku};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Order store backed by the upstream sells REST API.
#[derive(Debug, Clone)]
pub struct HttpOrderStore {
    client: Client,
    base_url: String,
    session_token: Option<String>,
}

impl HttpOrderStore {
    pub fn new(base_url: String, session_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            session_token,
        }
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, OrderStoreError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let mut request = self.client.get(url);
            if let Some(token) = &self.session_token {
                request = request.header("session", token);
            }

            let response = request.send().await.map_err(|e| {
                backoff::Error::transient(OrderStoreError::Network(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(OrderStoreError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(OrderStoreError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(OrderStoreError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(OrderStoreError::Parse(e.to_string())))
        })
        .await
    }

    fn sells_url(&self, start: NaiveDate, end: NaiveDate) -> String {
        if start == end {
            format!("{}/sells?r={}", self.base_url, start)
        } else {
            format!("{}/sells?r={}/{}", self.base_url, start, end)
        }
    }
}

#[async_trait]
impl OrderStore for HttpOrderStore {
    async fn fetch_orders(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Order>, OrderStoreError> {
        let url = self.sells_url(start, end);
        debug!(%url, "buscando pedidos no store externo");
        let response = self.get_json(&url).await?;

        let mut orders = Vec::new();
        match &response {
            serde_json::Value::Object(carts) => {
                for (cart_id, entries) in carts {
                    let Some(entries) = entries.as_array() else {
                        warn!(cart = %cart_id, "carrinho sem lista de pedidos, ignorado");
                        continue;
                    };
                    for entry in entries {
                        match parse_order(entry, cart_id) {
                            Ok(order) => orders.push(order),
                            Err(e) => warn!(cart = %cart_id, error = %e, "pedido malformado ignorado"),
                        }
                    }
                }
            }
            serde_json::Value::Array(entries) => {
                for entry in entries {
                    let cart_id = entry.get("cart").and_then(|v| v.as_str()).unwrap_or("");
                    match parse_order(entry, cart_id) {
                        Ok(order) => orders.push(order),
                        Err(e) => warn!(error = %e, "pedido malformado ignorado"),
                    }
                }
            }
            _ => {
                return Err(OrderStoreError::Parse(
                    "Expected object or array response".to_string(),
                ))
            }
        }

        debug!(count = orders.len(), "pedidos obtidos");
        Ok(orders)
    }

    async fn fetch_niche_map(&self) -> Result<NicheMap, OrderStoreError> {
        let url = format!("{}/sku_nichos", self.base_url);
        let response = self.get_json(&url).await?;

        let entries = response
            .as_array()
            .ok_or_else(|| OrderStoreError::Parse("Expected array response".to_string()))?;

        let mut map = NicheMap::new();
        for entry in entries {
            let sku = entry.get("sku").and_then(|v| v.as_str());
            let nicho = entry.get("nicho").and_then(|v| v.as_str());
            match (sku, nicho) {
                (Some(sku), Some(nicho)) if !sku.is_empty() => {
                    map.insert(Sku::new(sku), Nicho::new(nicho));
                }
                _ => warn!("entrada de sku_nicho malformada ignorada"),
            }
        }
        Ok(map)
    }
}

/// Parse one upstream order entry.
fn parse_order(value: &serde_json::Value, cart_id: &str) -> Result<Order, OrderStoreError> {
    let payment_date = get_str(value, "payment_date")?;
    let payment_date = parse_payment_date(&payment_date)?;

    Ok(Order {
        order_id: get_str(value, "order").unwrap_or_default(),
        cart_id: cart_id.to_string(),
        ad: AdId::new(get_str(value, "ad").unwrap_or_default()),
        sku: Sku::new(get_str(value, "sku")?),
        title: get_str(value, "title").unwrap_or_default(),
        quantity: value
            .get("quantity")
            .and_then(|v| v.as_u64())
            .and_then(|q| u32::try_from(q).ok())
            .unwrap_or(0),
        total_value: get_decimal(value, "total_value"),
        payment_date,
        status: get_str(value, "status").unwrap_or_default(),
        cost: get_decimal(value, "cost"),
        gross_profit: get_decimal(value, "gross_profit"),
        taxes: get_decimal(value, "taxes"),
        freight: get_decimal(value, "freight"),
        committee: get_decimal(value, "committee"),
        fraction: get_decimal_or(value, "fraction", Decimal::from_i64(1)),
        profitability: get_decimal(value, "profitability"),
        rentability: get_decimal(value, "rentability"),
        store: get_str(value, "store").unwrap_or_default(),
        profit: get_decimal(value, "profit"),
        nicho: get_str(value, "nicho").ok().filter(|s| !s.is_empty()).map(Nicho::new),
    })
}

fn get_str(value: &serde_json::Value, key: &str) -> Result<String, OrderStoreError> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| OrderStoreError::Parse(format!("Missing field: {}", key)))
}

/// Numeric fields arrive as JSON numbers or strings depending on upstream
/// version; both parse through the decimal string path so nothing is lost
/// to float conversion.
fn get_decimal(value: &serde_json::Value, key: &str) -> Decimal {
    get_decimal_or(value, key, Decimal::zero())
}

fn get_decimal_or(value: &serde_json::Value, key: &str, default: Decimal) -> Decimal {
    match value.get(key) {
        Some(serde_json::Value::Number(n)) => {
            Decimal::from_str_canonical(&n.to_string()).unwrap_or(default)
        }
        Some(serde_json::Value::String(s)) => Decimal::from_str_canonical(s).unwrap_or(default),
        _ => default,
    }
}

fn parse_payment_date(raw: &str) -> Result<NaiveDateTime, OrderStoreError> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    // Date-only rows bucket at midnight.
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }
    Err(OrderStoreError::Parse(format!(
        "Invalid payment_date: {}",
        raw
    )))
}
