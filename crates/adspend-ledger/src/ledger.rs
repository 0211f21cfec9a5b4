use crate::config::SimConfig;
use crate::lock::WorkspaceLock;
use crate::paths::AdspendPaths;
use crate::sqlite_store::SqliteStore;
use std::path::Path;

/// An opened `.adspend/` workspace: its paths, store, and configuration.
pub struct Ledger {
    pub paths: AdspendPaths,
    pub store: SqliteStore,
}

impl Ledger {
    /// Open an existing workspace. Fails if `.adspend/` does not exist.
    pub fn open(root: impl Into<std::path::PathBuf>) -> anyhow::Result<Self> {
        let paths = AdspendPaths::discover(root);
        if !paths.is_initialized() {
            anyhow::bail!(
                "not an adspend workspace ({}/.adspend not found). Run `adspend init` first.",
                paths.root.display()
            );
        }
        let store = SqliteStore::open_or_create(&paths.ledger_db)?;
        Ok(Self { paths, store })
    }

    pub fn open_path(root: &Path) -> anyhow::Result<Self> {
        Self::open(root.to_path_buf())
    }

    pub fn config(&self) -> anyhow::Result<SimConfig> {
        SimConfig::load(&self.paths.config_json)
    }
}

/// Create the layout and database. Safe to run on an existing workspace.
pub fn init_workspace(paths: &AdspendPaths) -> anyhow::Result<()> {
    paths.ensure_layout()?;
    let _lock = WorkspaceLock::acquire(paths)?;
    let store = SqliteStore::open_or_create(&paths.ledger_db)?;
    tracing::info!(
        db = %paths.ledger_db.display(),
        schema = store.schema_version()?,
        "workspace initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    #[test]
    fn open_without_init_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Ledger::open(tmp.path()).err().unwrap();
        assert!(err.to_string().contains("adspend init"));
    }

    #[test]
    fn init_then_open() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AdspendPaths::discover(tmp.path());
        init_workspace(&paths).unwrap();
        assert!(paths.ledger_db.exists());

        let ledger = Ledger::open_path(tmp.path()).unwrap();
        ledger
            .store
            .create_campaign("c", dec!(10), datetime!(2025-01-01 0:00 UTC))
            .unwrap();
        assert_eq!(ledger.config().unwrap(), SimConfig::default());
    }

    #[test]
    fn init_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AdspendPaths::discover(tmp.path());
        init_workspace(&paths).unwrap();
        {
            let ledger = Ledger::open(tmp.path()).unwrap();
            ledger
                .store
                .create_campaign("keep", dec!(10), datetime!(2025-01-01 0:00 UTC))
                .unwrap();
        }
        init_workspace(&paths).unwrap();
        let ledger = Ledger::open(tmp.path()).unwrap();
        assert_eq!(ledger.store.list_campaigns().unwrap().len(), 1);
    }
}
