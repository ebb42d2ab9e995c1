use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use vendalytics::engine::{Clock, LiveDailyTracker, OffsetClock};
use vendalytics::publish::{Refresher, ReportPublisher};
use vendalytics::{api, Config, HttpOrderStore, NicheMap, OrderStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("configuration error")?;
    let port = config.port;

    let store: Arc<dyn OrderStore> = Arc::new(HttpOrderStore::new(
        config.store_api_url.clone(),
        config.store_session_token.clone(),
    ));
    let clock: Arc<dyn Clock> = Arc::new(OffsetClock::new(config.tz_offset_hours));
    let tracker = Arc::new(LiveDailyTracker::new(clock.clone(), NicheMap::new()));
    let publisher = Arc::new(ReportPublisher::new(tracker.current_snapshot()));

    let refresher = Refresher::new(
        store.clone(),
        tracker.clone(),
        publisher.clone(),
        clock,
        Duration::from_secs(config.update_interval_secs),
    );
    tokio::spawn(refresher.run());

    let app = api::create_router(api::AppState::new(store, tracker, publisher, config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
