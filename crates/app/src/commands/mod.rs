//! CLI command implementations
//!
//! - `import` - parse a file, build and confirm the plan, submit, check balances
//! - `accounts` - list ledger accounts and which source accounts feed them
//! - `mappings` - inspect and edit saved account mappings

pub mod accounts;
pub mod import;
pub mod mappings;

pub use accounts::*;
pub use import::*;
pub use mappings::*;

use anyhow::{Context, Result};
use ledgersync_api::HttpLedger;
use ledgersync_storage::{default_config_path, Settings};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(default_config_path()?),
    }
}

/// Builds the HTTP client and checks the token against the ledger.
pub async fn connect(settings: &Settings, api_key: Option<&str>) -> Result<HttpLedger> {
    let token = api_key
        .filter(|k| !k.trim().is_empty())
        .context("No API key: pass --api-key or set LEDGERSYNC_API_KEY")?;
    let ledger = HttpLedger::new(
        &settings.api.base_url,
        token.trim(),
        Duration::from_secs(settings.api.timeout_secs),
    )?;
    let user = ledger
        .me()
        .await
        .with_context(|| format!("Could not connect to {}", ledger.base_url()))?;
    info!("Connected to {} as {user}", ledger.base_url());
    Ok(ledger)
}
