//! Period report composition.
//!
//! The composer is the only place that sequences fetch, aggregate and
//! forecast. The pure computation runs on a blocking thread under a timeout
//! so a pathological range can never wedge the async runtime.

use crate::datasource::{OrderStore, OrderStoreError};
use crate::engine::{aggregate, forecast};
use crate::report::shapes::{PeriodReport, Periodo, ReportStatus};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Errors surfaced by period report composition.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Order store unavailable: {0}")]
    StoreUnavailable(#[from] OrderStoreError),
    #[error("Report computation timed out")]
    Timeout,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Builds bounded period reports from the order store.
#[derive(Debug, Clone)]
pub struct ReportComposer {
    store: Arc<dyn OrderStore>,
    timeout: Duration,
}

impl ReportComposer {
    pub fn new(store: Arc<dyn OrderStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Compose the full report for the inclusive `[inicio, fim]` range.
    ///
    /// An empty range yields a `sem_dados` report; only a reversed range is
    /// rejected as invalid.
    pub async fn period_report(
        &self,
        inicio: NaiveDate,
        fim: NaiveDate,
    ) -> Result<PeriodReport, ReportError> {
        if inicio > fim {
            return Err(ReportError::InvalidRange(format!(
                "data_inicio {} posterior a data_fim {}",
                inicio, fim
            )));
        }

        let orders = self.store.fetch_orders(inicio, fim).await?;
        let map = self.store.fetch_niche_map().await?;
        debug!(count = orders.len(), %inicio, %fim, "compondo relatorio de periodo");

        let computed = tokio::time::timeout(
            self.timeout,
            tokio::task::spawn_blocking(move || {
                let agg = aggregate(&orders, inicio, fim, &map);
                let previsao = forecast(&agg.serie_diaria);
                (agg, previsao)
            }),
        )
        .await
        .map_err(|_| {
            error!(%inicio, %fim, "computacao do relatorio excedeu o tempo limite");
            ReportError::Timeout
        })?
        .map_err(|e| ReportError::Internal(e.to_string()))?;

        let (agg, previsao) = computed;
        let status = if agg.is_empty() {
            ReportStatus::SemDados
        } else {
            ReportStatus::Sucesso
        };

        Ok(PeriodReport {
            periodo: Periodo {
                inicio,
                fim,
                dias_totais: (fim - inicio).num_days() + 1,
            },
            status,
            erro: None,
            kpis_gerais: agg.kpis_gerais,
            relatorios: agg.relatorios,
            rankings: agg.rankings,
            previsao,
        })
    }
}
