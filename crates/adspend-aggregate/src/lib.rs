//! Read-side rollups over stored spend records.

pub mod stats;
pub mod summary;

pub use stats::{statistics, CampaignStatistics, Period};
pub use summary::{cost_trend, daily_summary, DailySummary, TrendPoint};
