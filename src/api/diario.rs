use axum::extract::State;
use axum::Json;

use crate::api::AppState;
use crate::report::LiveDailyReport;

/// Last published live report, for clients that poll instead of holding a
/// WebSocket open.
///
/// Serves the publisher's latest value rather than asking the tracker for a
/// fresh snapshot: snapshotting advances the ranking-movement baseline, and
/// only the refresher's publish stream may do that.
pub async fn get_relatorio_diario(State(state): State<AppState>) -> Json<LiveDailyReport> {
    let snapshot = state.publisher.latest();
    Json(snapshot.as_ref().clone())
}
