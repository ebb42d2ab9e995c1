pub mod diario;
pub mod health;
pub mod relatorio;
pub mod ws;

use crate::config::Config;
use crate::datasource::OrderStore;
use crate::engine::LiveDailyTracker;
use crate::publish::ReportPublisher;
use crate::report::ReportComposer;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub tracker: Arc<LiveDailyTracker>,
    pub publisher: Arc<ReportPublisher>,
    pub composer: ReportComposer,
    pub config: Config,
}

impl AppState {
    pub fn new(
        store: Arc<dyn OrderStore>,
        tracker: Arc<LiveDailyTracker>,
        publisher: Arc<ReportPublisher>,
        config: Config,
    ) -> Self {
        let composer = ReportComposer::new(
            store.clone(),
            Duration::from_millis(config.report_timeout_ms),
        );
        Self {
            store,
            tracker,
            publisher,
            composer,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/relatorio_flex", get(relatorio::get_relatorio_flex))
        .route("/v1/relatorio_diario", get(diario::get_relatorio_diario))
        .route("/ws/relatorio_diario", get(ws::ws_relatorio_diario))
        .layer(cors)
        .with_state(state)
}
