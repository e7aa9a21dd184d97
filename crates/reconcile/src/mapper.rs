use ledgersync_core::{AccountId, LedgerAccount, SourceAccountId};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, ReconcileError};
use crate::ledger::LedgerClient;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Persisted source -> destination account mappings.
pub trait MappingStore {
    fn get(&self, source: &SourceAccountId) -> Option<AccountId>;

    fn put(&mut self, source: SourceAccountId, account: AccountId) -> Result<(), StoreError>;

    fn entries(&self) -> Vec<(SourceAccountId, AccountId)>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryMappingStore {
    mappings: BTreeMap<SourceAccountId, AccountId>,
}

impl MemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &str, account: AccountId) -> Self {
        self.mappings.insert(SourceAccountId::from(source), account);
        self
    }
}

impl MappingStore for MemoryMappingStore {
    fn get(&self, source: &SourceAccountId) -> Option<AccountId> {
        self.mappings.get(source).copied()
    }

    fn put(&mut self, source: SourceAccountId, account: AccountId) -> Result<(), StoreError> {
        self.mappings.insert(source, account);
        Ok(())
    }

    fn entries(&self) -> Vec<(SourceAccountId, AccountId)> {
        self.mappings.iter().map(|(s, a)| (s.clone(), *a)).collect()
    }
}

/// Picks a destination for an unseen source account. `None` means no choice
/// was made.
pub trait AccountChooser {
    fn choose(&mut self, source: &SourceAccountId, candidates: &[LedgerAccount]) -> Option<AccountId>;
}

impl<F> AccountChooser for F
where
    F: FnMut(&SourceAccountId, &[LedgerAccount]) -> Option<AccountId>,
{
    fn choose(&mut self, source: &SourceAccountId, candidates: &[LedgerAccount]) -> Option<AccountId> {
        self(source, candidates)
    }
}

/// Chooser for headless runs: never picks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl AccountChooser for NonInteractive {
    fn choose(&mut self, _: &SourceAccountId, _: &[LedgerAccount]) -> Option<AccountId> {
        None
    }
}

/// Resolves source accounts to destination accounts. The only writer of the
/// mapping store.
pub struct AccountMapper<S, C> {
    store: S,
    chooser: C,
    accounts: Option<Vec<LedgerAccount>>,
}

impl<S: MappingStore, C: AccountChooser> AccountMapper<S, C> {
    pub fn new(store: S, chooser: C) -> Self {
        Self { store, chooser, accounts: None }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Persisted mapping only; never prompts.
    pub fn lookup(&self, source: &SourceAccountId) -> Option<AccountId> {
        self.store.get(source)
    }

    /// Ledger accounts fetched so far this run, if any.
    pub fn cached_accounts(&self) -> Option<&[LedgerAccount]> {
        self.accounts.as_deref()
    }

    /// Drops the cached account list; the next lookup refetches it.
    pub fn forget_accounts(&mut self) {
        self.accounts = None;
    }

    /// Ledger accounts, fetched once per mapper. Failures are returned as
    /// the ledger reported them.
    pub async fn accounts<L>(&mut self, ledger: &L) -> Result<&[LedgerAccount], LedgerError>
    where
        L: LedgerClient + ?Sized,
    {
        if self.accounts.is_none() {
            let accounts = ledger.list_accounts().await?;
            debug!("Fetched {} ledger accounts", accounts.len());
            self.accounts = Some(accounts);
        }
        Ok(self.accounts.as_deref().unwrap_or_default())
    }

    /// Destination accounts a source account can be mapped to.
    pub async fn candidates<L>(&mut self, ledger: &L) -> Result<&[LedgerAccount], ReconcileError>
    where
        L: LedgerClient + ?Sized,
    {
        self.accounts(ledger).await.map_err(|e| {
            if e.is_auth() {
                ReconcileError::RemoteAuthFailure(e)
            } else {
                ReconcileError::UnresolvedAccount {
                    source_account: SourceAccountId::new(""),
                    reason: format!("could not list ledger accounts: {e}"),
                }
            }
        })
    }

    pub async fn resolve<L>(
        &mut self,
        source: &SourceAccountId,
        ledger: &L,
    ) -> Result<AccountId, ReconcileError>
    where
        L: LedgerClient + ?Sized,
    {
        if let Some(account) = self.store.get(source) {
            debug!("Source account {} mapped to {account}", source.masked());
            return Ok(account);
        }

        let unresolved = |reason: String| ReconcileError::UnresolvedAccount {
            source_account: source.clone(),
            reason,
        };

        let candidates = match self.candidates(ledger).await {
            Ok(candidates) => candidates.to_vec(),
            Err(ReconcileError::UnresolvedAccount { reason, .. }) => return Err(unresolved(reason)),
            Err(e) => return Err(e),
        };
        if candidates.is_empty() {
            return Err(unresolved("the ledger has no accounts to map to".to_string()));
        }

        let chosen = self
            .chooser
            .choose(source, &candidates)
            .ok_or_else(|| unresolved("no mapping and no account chosen (non-interactive run)".to_string()))?;

        if !candidates.iter().any(|a| a.id == chosen) {
            return Err(unresolved(format!("chosen account {chosen} is not in the ledger")));
        }

        if let Some((other, _)) = self
            .store
            .entries()
            .into_iter()
            .find(|(other, account)| *account == chosen && other != source)
        {
            warn!(
                "Account {chosen} already receives source account {}; {} will share it",
                other.masked(),
                source.masked()
            );
        }

        self.store
            .put(source.clone(), chosen)
            .map_err(|e| ReconcileError::MappingStore {
                source_account: source.clone(),
                reason: e.to_string(),
            })?;
        info!("Mapped source account {} to ledger account {chosen}", source.masked());
        Ok(chosen)
    }
}
