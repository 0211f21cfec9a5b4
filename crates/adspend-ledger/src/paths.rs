use adspend_core::CampaignId;
use std::path::{Path, PathBuf};

/// All well-known paths under `.adspend/`.
#[derive(Debug, Clone)]
pub struct AdspendPaths {
    pub root: PathBuf,
    pub adspend_dir: PathBuf,
    pub ledger_db: PathBuf,
    pub config_json: PathBuf,
    pub lock_file: PathBuf,
    pub locks_dir: PathBuf,
}

impl AdspendPaths {
    /// Derive all paths from a workspace root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let adspend_dir = root.join(".adspend");
        Self {
            ledger_db: adspend_dir.join("ledger.db"),
            config_json: adspend_dir.join("config.json"),
            lock_file: adspend_dir.join("LOCK"),
            locks_dir: adspend_dir.join("locks"),
            adspend_dir,
            root,
        }
    }

    /// Create all required directories. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        for dir in [&self.adspend_dir, &self.locks_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.adspend_dir.is_dir()
    }

    /// Lock file guarding generation runs for one campaign.
    pub fn campaign_lock(&self, campaign: CampaignId) -> PathBuf {
        self.locks_dir.join(format!("campaign-{campaign}.lock"))
    }

    /// Walk up from `start` looking for a directory containing `.adspend/`.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(".adspend").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}
