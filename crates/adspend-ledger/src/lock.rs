use crate::paths::AdspendPaths;
use adspend_core::CampaignId;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

fn try_lock(path: &Path, what: &str) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("cannot open lock file {}: {}", path.display(), e))?;

    file.try_lock_exclusive()
        .map_err(|_| anyhow::anyhow!("{what} is locked by another process ({})", path.display()))?;
    Ok(file)
}

/// Exclusive workspace lock backed by `.adspend/LOCK`.
/// Automatically released when dropped.
pub struct WorkspaceLock {
    _file: File,
}

impl WorkspaceLock {
    /// Try to acquire the workspace lock (non-blocking).
    pub fn acquire(paths: &AdspendPaths) -> anyhow::Result<Self> {
        let file = try_lock(&paths.lock_file, "workspace")?;
        Ok(Self { _file: file })
    }
}

/// One exclusive generation or clear run per campaign. Cumulative spend reads are
/// not isolated from concurrent writers, so overlapping runs would double-count.
pub struct CampaignLock {
    campaign: CampaignId,
    _file: File,
}

impl CampaignLock {
    pub fn acquire(paths: &AdspendPaths, campaign: CampaignId) -> anyhow::Result<Self> {
        let file = try_lock(&paths.campaign_lock(campaign), &format!("campaign {campaign}"))?;
        tracing::debug!(%campaign, "campaign lock acquired");
        Ok(Self {
            campaign,
            _file: file,
        })
    }

    pub fn campaign(&self) -> CampaignId {
        self.campaign
    }
}
