//! Change-notification fan-out.
//!
//! Built on `tokio::sync::watch`: every subscriber observes the latest
//! published snapshot, and a slow subscriber skips intermediate snapshots
//! instead of queueing them. Publishing with zero subscribers is a no-op.

use crate::report::LiveDailyReport;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Broadcasts live daily report snapshots to WebSocket sessions.
#[derive(Debug)]
pub struct ReportPublisher {
    tx: watch::Sender<Arc<LiveDailyReport>>,
}

impl ReportPublisher {
    pub fn new(initial: Arc<LiveDailyReport>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the current snapshot and wake all subscribers.
    pub fn publish(&self, report: Arc<LiveDailyReport>) {
        debug!(
            dia = %report.dia,
            subscribers = self.tx.receiver_count(),
            "publicando snapshot do relatorio diario"
        );
        self.tx.send_replace(report);
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Arc<LiveDailyReport> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<LiveDailyReport>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn report(dia: &str) -> Arc<LiveDailyReport> {
        let dia: NaiveDate = dia.parse().unwrap();
        Arc::new(LiveDailyReport::sem_dados(
            dia,
            dia.and_hms_opt(0, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_subscriber_sees_latest_snapshot() {
        let publisher = ReportPublisher::new(report("2024-01-01"));
        let mut rx = publisher.subscribe();
        assert_eq!(rx.borrow().dia, "2024-01-01".parse::<NaiveDate>().unwrap());

        publisher.publish(report("2024-01-02"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().dia, "2024-01-02".parse::<NaiveDate>().unwrap());
    }

    #[tokio::test]
    async fn test_slow_subscriber_skips_intermediate_snapshots() {
        let publisher = ReportPublisher::new(report("2024-01-01"));
        let mut rx = publisher.subscribe();

        publisher.publish(report("2024-01-02"));
        publisher.publish(report("2024-01-03"));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().dia, "2024-01-03".parse::<NaiveDate>().unwrap());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let publisher = ReportPublisher::new(report("2024-01-01"));
        assert_eq!(publisher.subscriber_count(), 0);
        publisher.publish(report("2024-01-02"));
        assert_eq!(
            publisher.latest().dia,
            "2024-01-02".parse::<NaiveDate>().unwrap()
        );
    }
}
