pub mod config;
pub mod ledger;
pub mod lock;
pub mod paths;
pub mod quota;
pub mod sqlite_store;

pub use config::SimConfig;
pub use ledger::{init_workspace, Ledger};
pub use lock::{CampaignLock, WorkspaceLock};
pub use paths::AdspendPaths;
pub use quota::{QuotaDecision, RunQuota};
pub use sqlite_store::SqliteStore;
