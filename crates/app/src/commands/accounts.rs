use anyhow::{Context, Result};
use ledgersync_reconcile::LedgerClient;
use ledgersync_storage::Settings;
use std::path::Path;

use super::connect;
use crate::render;

pub async fn cmd_accounts(config: &Path, api_key: Option<&str>) -> Result<()> {
    let settings = Settings::load(config)?;
    let ledger = connect(&settings, api_key).await?;
    let accounts = ledger
        .list_accounts()
        .await
        .context("Failed to list ledger accounts")?;

    if accounts.is_empty() {
        println!("The ledger has no accounts.");
        return Ok(());
    }

    render::accounts(&accounts, &settings.mappings);
    Ok(())
}
