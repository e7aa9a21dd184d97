use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::{AccountId, SourceAccountId};
use super::money::Money;

/// One transaction record exactly as the file parser hands it over.
///
/// Date and amount stay textual: turning them into typed values is the
/// normalizer's job, which is where malformed records get rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub source_account: SourceAccountId,
    /// Source transaction type (`TRNTYPE` in OFX), upper-cased when present.
    pub kind: Option<String>,
    pub date: String,
    pub amount: String,
    pub name: Option<String>,
    pub memo: Option<String>,
    /// Source-provided unique reference (`FITID` in OFX).
    pub reference: Option<String>,
    pub check_number: Option<String>,
}

/// Ending balance a statement claims for one source account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatedBalance {
    pub source_account: SourceAccountId,
    pub amount: Money,
    pub as_of: Option<NaiveDate>,
}

/// Parser output: transactions in file order plus per-account stated balances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBatch {
    pub transactions: Vec<RawTransaction>,
    pub stated_balances: Vec<StatedBalance>,
    pub currency: Option<String>,
}

impl ParsedBatch {
    /// Every source account mentioned by the batch, in order of first appearance.
    /// Accounts that only carry a stated balance are included.
    pub fn source_accounts(&self) -> Vec<&SourceAccountId> {
        let mut seen: Vec<&SourceAccountId> = Vec::new();
        let ids = self
            .transactions
            .iter()
            .map(|t| &t.source_account)
            .chain(self.stated_balances.iter().map(|b| &b.source_account));
        for id in ids {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }

    /// The most recent balance stated for `source`: latest `as_of`, and the
    /// later statement in the file when dates tie or are missing.
    pub fn stated_balance(&self, source: &SourceAccountId) -> Option<&StatedBalance> {
        self.stated_balances
            .iter()
            .filter(|b| &b.source_account == source)
            .max_by_key(|b| b.as_of)
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.stated_balances.is_empty()
    }
}

/// Deterministic duplicate-detection fingerprint of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub String);

impl ExternalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExternalId {
    fn from(s: &str) -> Self {
        ExternalId(s.to_string())
    }
}

/// Canonical transaction ready to be created in the destination ledger.
/// Amounts follow the ledger convention: outflows negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub account: AccountId,
    pub source_account: SourceAccountId,
    pub date: NaiveDate,
    pub amount: Money,
    pub payee: String,
    pub notes: Option<String>,
    pub external_id: ExternalId,
}

/// Read-only projection of a transaction already present in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTransaction {
    pub id: i64,
    pub account: AccountId,
    pub date: NaiveDate,
    pub amount: Money,
    pub payee: String,
    pub external_id: Option<ExternalId>,
}
