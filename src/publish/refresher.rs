//! Periodic live-report refresh task.
//!
//! Every tick it fetches the current day's orders from the store, feeds
//! them into the tracker and publishes a snapshot only when the tracker
//! state actually changed. A store failure publishes an error-status report
//! and the loop keeps running.

use crate::datasource::OrderStore;
use crate::engine::{Clock, LiveDailyTracker};
use crate::publish::ReportPublisher;
use crate::report::LiveDailyReport;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct Refresher {
    store: Arc<dyn OrderStore>,
    tracker: Arc<LiveDailyTracker>,
    publisher: Arc<ReportPublisher>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    last_published_version: AtomicU64,
    last_publish_errored: AtomicBool,
}

impl Refresher {
    pub fn new(
        store: Arc<dyn OrderStore>,
        tracker: Arc<LiveDailyTracker>,
        publisher: Arc<ReportPublisher>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            tracker,
            publisher,
            clock,
            interval,
            last_published_version: AtomicU64::new(0),
            last_publish_errored: AtomicBool::new(false),
        }
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.refresh_once().await;
        }
    }

    /// One refresh pass. Publishes only when the tracker state changed
    /// since the last publish.
    pub async fn refresh_once(&self) {
        let now = self.clock.now();
        let hoje = now.date();

        let fetched = match self.store.fetch_orders(hoje, hoje).await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "falha ao buscar pedidos do dia, publicando relatorio de erro");
                self.last_publish_errored.store(true, Ordering::Release);
                self.publisher
                    .publish(Arc::new(LiveDailyReport::erro(hoje, now, e.to_string())));
                return;
            }
        };

        match self.store.fetch_niche_map().await {
            Ok(map) => self.tracker.set_niche_map(map),
            Err(e) => warn!(error = %e, "falha ao atualizar mapa de nichos, mantendo o atual"),
        }

        let accepted = self.tracker.ingest_batch(&fetched);
        let version = self.tracker.version();
        let previous = self.last_published_version.swap(version, Ordering::AcqRel);
        // An erro publish must be replaced on the next successful pass even
        // when no order changed, or subscribers keep seeing a stale error.
        let recovering = self.last_publish_errored.swap(false, Ordering::AcqRel);
        if version != previous || recovering {
            debug!(accepted, version, recovering, "publicando snapshot do dia");
            self.publisher.publish(self.tracker.current_snapshot());
        }
    }
}
