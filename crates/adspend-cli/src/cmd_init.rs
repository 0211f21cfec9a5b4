use adspend_ledger::{init_workspace, AdspendPaths};
use std::path::Path;

pub fn execute(repo_root: &Path) -> anyhow::Result<()> {
    let paths = AdspendPaths::discover(repo_root);

    if paths.is_initialized() {
        // Re-apply schema in case ledger.db is missing.
        init_workspace(&paths)?;
        println!("Already initialized at {}", paths.adspend_dir.display());
        return Ok(());
    }

    init_workspace(&paths)?;
    println!("Initialized .adspend/ at {}", paths.root.display());
    println!();
    println!("Next steps:");
    println!("  adspend campaign create --name \"My campaign\" --budget 100");
    println!("  adspend seed            # or load three demo campaigns");
    Ok(())
}
