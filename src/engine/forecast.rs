//! Next-period profit projection from the per-day net-profit series.
//!
//! The model is a trailing moving average over a 7-day window of strictly
//! prior days. Deliberately simple: deterministic, cheap, and free of
//! lookahead bias (a point for day D never reads day D or later).

use crate::domain::Decimal;
use crate::report::shapes::ForecastPoint;
use chrono::NaiveDate;

/// Trailing window, in days, feeding each projection.
pub const JANELA_DIAS: usize = 7;

/// Produce one forecast point per input day.
///
/// `serie` must be chronologically ordered (the aggregator guarantees this).
/// With fewer than 2 known days the projection equals the single known value;
/// there is nothing to extrapolate from.
pub fn forecast(serie: &[(NaiveDate, Decimal)]) -> Vec<ForecastPoint> {
    if serie.len() < 2 {
        return serie
            .iter()
            .map(|(data, realizado)| ForecastPoint {
                data: *data,
                lucro_realizado: *realizado,
                lucro_previsto: *realizado,
            })
            .collect();
    }

    serie
        .iter()
        .enumerate()
        .map(|(idx, (data, realizado))| {
            let previsto = if idx == 0 {
                // No prior day exists; the first point carries its own value.
                *realizado
            } else {
                let inicio = idx.saturating_sub(JANELA_DIAS);
                let janela = &serie[inicio..idx];
                let soma: Decimal = janela.iter().map(|(_, lucro)| *lucro).sum();
                soma.div_or_zero(Decimal::from_i64(janela.len() as i64))
            };
            ForecastPoint {
                data: *data,
                lucro_realizado: *realizado,
                lucro_previsto: previsto,
            }
        })
        .collect()
}
