//! Pure computation engines: period aggregation, forecast, live tracking.

pub mod aggregate;
pub mod forecast;
pub mod live;

pub use aggregate::{aggregate, PeriodAggregate};
pub use forecast::forecast;
pub use live::{Clock, IngestOutcome, LiveDailyTracker, ManualClock, OffsetClock};
