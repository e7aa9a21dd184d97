use async_trait::async_trait;
use ledgersync_core::{AccountId, DateRange, LedgerAccount, Money, NormalizedTransaction, RemoteTransaction};

use crate::error::LedgerError;

/// Remote ledger as the reconciliation core sees it.
///
/// Every call may fail with [`LedgerError::Transient`] (the caller may retry)
/// or [`LedgerError::Unauthorized`] (the run is over). Nothing here retries.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<LedgerAccount>, LedgerError>;

    /// Transactions of `account` dated inside `window`, each carrying the
    /// external id it was created with, if any.
    async fn list_transactions(
        &self,
        account: AccountId,
        window: DateRange,
    ) -> Result<Vec<RemoteTransaction>, LedgerError>;

    /// Creates `batch` in `account`; returns how many the ledger accepted.
    async fn create_transactions(
        &self,
        account: AccountId,
        batch: &[NormalizedTransaction],
    ) -> Result<usize, LedgerError>;

    async fn get_balance(&self, account: AccountId) -> Result<Money, LedgerError>;

    async fn update_balance(&self, account: AccountId, balance: Money) -> Result<(), LedgerError>;
}
