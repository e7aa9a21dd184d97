use ledgersync_core::{AccountId, SourceAccountId};
use ledgersync_reconcile::{MappingStore, StoreError};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{ConfigError, Settings};

/// Account mappings kept in the `[mappings]` table of `config.toml`.
///
/// Every change rewrites the whole file, so the other sections survive and
/// a crash mid-write leaves the previous file intact.
#[derive(Debug)]
pub struct FileMappingStore {
    path: PathBuf,
    settings: Settings,
}

impl FileMappingStore {
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            path: path.to_path_buf(),
            settings: Settings::load(path)?,
        })
    }

    /// Uses already-loaded settings; `path` is where changes are written.
    pub fn with_settings(path: &Path, settings: Settings) -> Self {
        Self {
            path: path.to_path_buf(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Forgets one mapping. Returns whether it existed.
    pub fn remove(&mut self, source: &SourceAccountId) -> Result<bool, ConfigError> {
        let Some(previous) = self.settings.mappings.remove(source.as_str()) else {
            return Ok(false);
        };
        if let Err(e) = self.settings.save(&self.path) {
            self.settings.mappings.insert(source.as_str().to_string(), previous);
            return Err(e);
        }
        info!("Removed mapping for source account {}", source.masked());
        Ok(true)
    }

    /// Forgets every mapping. Returns how many there were.
    pub fn reset(&mut self) -> Result<usize, ConfigError> {
        if self.settings.mappings.is_empty() {
            return Ok(0);
        }
        let previous = std::mem::take(&mut self.settings.mappings);
        if let Err(e) = self.settings.save(&self.path) {
            self.settings.mappings = previous;
            return Err(e);
        }
        info!("Removed {} mappings", previous.len());
        Ok(previous.len())
    }
}

impl MappingStore for FileMappingStore {
    fn get(&self, source: &SourceAccountId) -> Option<AccountId> {
        self.settings.mappings.get(source.as_str()).copied().map(AccountId)
    }

    fn put(&mut self, source: SourceAccountId, account: AccountId) -> Result<(), StoreError> {
        let previous = self.settings.mappings.insert(source.0.clone(), account.0);
        if let Err(e) = self.settings.save(&self.path) {
            match previous {
                Some(id) => self.settings.mappings.insert(source.0, id),
                None => self.settings.mappings.remove(&source.0),
            };
            return Err(StoreError(e.to_string()));
        }
        Ok(())
    }

    fn entries(&self) -> Vec<(SourceAccountId, AccountId)> {
        self.settings
            .mappings
            .iter()
            .map(|(source, id)| (SourceAccountId::new(source.as_str()), AccountId(*id)))
            .collect()
    }
}
