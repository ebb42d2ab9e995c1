pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod publish;
pub mod report;

pub use config::Config;
pub use datasource::{HttpOrderStore, MockOrderStore, OrderStore, OrderStoreError};
pub use domain::{AdId, Decimal, NicheMap, Nicho, Order, Sku};
pub use engine::{Clock, LiveDailyTracker, ManualClock, OffsetClock};
pub use error::AppError;
pub use publish::{Refresher, ReportPublisher};
pub use report::{LiveDailyReport, PeriodReport, PushMessage, ReportComposer, ReportStatus};
