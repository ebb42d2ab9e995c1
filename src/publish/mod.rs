//! Live snapshot publishing: watch-channel fan-out plus the periodic
//! refresh task that feeds it.

pub mod publisher;
pub mod refresher;

pub use publisher::ReportPublisher;
pub use refresher::Refresher;
