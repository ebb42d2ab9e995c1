use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use crate::api::AppState;
use crate::error::AppError;
use crate::report::{PeriodReport, ReportError};

#[derive(Debug, Deserialize)]
pub struct RelatorioFlexQuery {
    pub data_inicio: String,
    pub data_fim: String,
}

fn parse_date(name: &str, input: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(format!("{} invalida: {} (esperado YYYY-MM-DD)", name, input))
    })
}

/// Bounded period report over `[data_inicio, data_fim]`.
///
/// A malformed or reversed range is a 400; upstream failures degrade to a
/// 200 with an error-status envelope so dashboards keep rendering.
pub async fn get_relatorio_flex(
    Query(params): Query<RelatorioFlexQuery>,
    State(state): State<AppState>,
) -> Result<Json<PeriodReport>, AppError> {
    let inicio = parse_date("data_inicio", &params.data_inicio)?;
    let fim = parse_date("data_fim", &params.data_fim)?;

    match state.composer.period_report(inicio, fim).await {
        Ok(report) => Ok(Json(report)),
        Err(ReportError::InvalidRange(msg)) => Err(AppError::BadRequest(msg)),
        Err(e) => {
            warn!(error = %e, %inicio, %fim, "relatorio de periodo degradado para envelope de erro");
            Ok(Json(PeriodReport::erro(inicio, fim, e.to_string())))
        }
    }
}
