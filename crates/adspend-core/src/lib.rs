pub mod capacity;
pub mod clock;
pub mod error;
pub mod event;
pub mod money;
pub mod ports;
pub mod timeline;
pub mod types;

pub use capacity::{CapacityCalculator, CapacityPool, DayBudget};
pub use error::ValueError;
pub use ports::{CostLedger, TimelineReader};
pub use timeline::BudgetTimeline;
pub use types::*;
