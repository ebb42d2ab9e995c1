//! Report contracts and composition.

pub mod composer;
pub mod shapes;

pub use composer::{ReportComposer, ReportError};
pub use shapes::{LiveDailyReport, PeriodReport, PushMessage, ReportStatus};
