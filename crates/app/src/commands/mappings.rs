use anyhow::Result;
use ledgersync_core::SourceAccountId;
use ledgersync_reconcile::MappingStore;
use ledgersync_storage::FileMappingStore;
use std::path::Path;

use crate::prompt::confirm;

pub fn cmd_mappings_list(config: &Path) -> Result<()> {
    let store = FileMappingStore::open(config)?;
    let entries = store.entries();
    if entries.is_empty() {
        println!("No saved mappings in {}", config.display());
        return Ok(());
    }

    println!("Mappings in {}:\n", config.display());
    println!("  {:<24} {:>10}", "SOURCE ACCOUNT", "LEDGER ID");
    for (source, account) in entries {
        println!("  {:<24} {:>10}", source.as_str(), account.0);
    }
    Ok(())
}

pub fn cmd_mappings_remove(config: &Path, source: &str) -> Result<()> {
    let mut store = FileMappingStore::open(config)?;
    let source = SourceAccountId::new(source.trim());
    if store.remove(&source)? {
        println!("✓ Forgot mapping for {source}");
    } else {
        println!("No mapping for {source}");
    }
    Ok(())
}

pub fn cmd_mappings_reset(config: &Path, yes: bool) -> Result<()> {
    let mut store = FileMappingStore::open(config)?;
    let count = store.entries().len();
    if count == 0 {
        println!("No saved mappings.");
        return Ok(());
    }
    if !yes && !confirm(&format!("Forget all {count} mappings?"))? {
        println!("Cancelled.");
        return Ok(());
    }
    let removed = store.reset()?;
    println!("✓ Forgot {removed} mappings");
    Ok(())
}
