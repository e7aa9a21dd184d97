use ledgersync_core::{AccountId, DateBounds, Money, NormalizedTransaction, SourceAccountId};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::report::RunReport;

/// Largest balance difference treated as rounding noise: half a cent.
pub fn balance_tolerance() -> Decimal {
    Decimal::new(5, 3)
}

/// Stated versus remote balance for one destination account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    pub account: AccountId,
    pub stated: Money,
    pub remote: Money,
}

impl BalanceSnapshot {
    pub fn new(account: AccountId, stated: Money, remote: Money) -> Self {
        Self { account, stated, remote }
    }

    /// How far the ledger is from the stated balance (`stated - remote`).
    pub fn drift(&self) -> Money {
        self.stated - self.remote
    }

    pub fn needs_correction(&self) -> bool {
        self.drift().abs().as_decimal() > balance_tolerance()
    }
}

/// Everything planned for one destination account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub account: AccountId,
    pub account_label: String,
    /// Source accounts feeding this destination, in file order.
    pub sources: Vec<SourceAccountId>,
    /// New transactions to create, in file order.
    pub transactions: Vec<NormalizedTransaction>,
    pub already_imported: usize,
    pub filtered_out: usize,
    /// Ending balance the file states, when exactly one source feeds this account.
    pub stated_balance: Option<Money>,
    /// Drift projected from the cached ledger balance plus the new transactions.
    pub balance_correction: Option<BalanceSnapshot>,
}

impl PlanEntry {
    pub fn total(&self) -> Money {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.balance_correction.is_none()
    }
}

/// The computed set of creations and balance corrections awaiting
/// confirmation. Committing submits exactly this, unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub entries: Vec<PlanEntry>,
    pub bounds: DateBounds,
    pub report: RunReport,
}

impl ReconciliationPlan {
    pub fn transaction_count(&self) -> usize {
        self.entries.iter().map(|e| e.transactions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, account: AccountId) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.account == account)
    }

    /// Destinations that have a stated balance to check after commit.
    pub fn stated_balances(&self) -> Vec<(AccountId, Money)> {
        self.entries
            .iter()
            .filter_map(|e| e.stated_balance.map(|b| (e.account, b)))
            .collect()
    }
}

/// Result of submitting one plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub account: AccountId,
    pub submitted: usize,
    pub created: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub outcomes: Vec<CommitOutcome>,
    pub report: RunReport,
}

impl CommitReport {
    pub fn created(&self) -> usize {
        self.outcomes.iter().map(|o| o.created).sum()
    }

    pub fn succeeded(&self, account: AccountId) -> bool {
        self.outcomes.iter().any(|o| o.account == account)
    }
}
