use ledgersync_core::{AccountId, SourceAccountId};
use thiserror::Error;

/// Failure reported by a [`crate::LedgerClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Network trouble, timeouts and server-side errors; retryable by the caller.
    #[error("network error: {0}")]
    Transient(String),
    #[error("ledger rejected credentials: {0}")]
    Unauthorized(String),
    #[error("ledger rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected ledger response: {0}")]
    Decode(String),
}

impl LedgerError {
    pub fn is_auth(&self) -> bool {
        matches!(self, LedgerError::Unauthorized(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Transient(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("unparseable date '{0}'")]
    Date(String),
    #[error("unparseable amount '{0}'")]
    Amount(String),
}

/// How much of a run a failure takes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    /// One raw record is skipped.
    Record,
    /// Every record of one source account is skipped.
    SourceAccount,
    /// One destination account's plan entry, submission or balance step is lost.
    Destination,
    /// The whole run stops.
    Run,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Skipped record #{index} of account {source_account}: {reason}")]
    MalformedTransaction {
        source_account: SourceAccountId,
        index: usize,
        reason: MalformedReason,
    },
    #[error("No destination account for source account {source_account}: {reason}")]
    UnresolvedAccount {
        source_account: SourceAccountId,
        reason: String,
    },
    #[error("Could not save mapping for source account {source_account}: {reason}")]
    MappingStore {
        source_account: SourceAccountId,
        reason: String,
    },
    #[error("Could not read ledger state for account {account}: {source}")]
    RemoteFetchFailure {
        account: AccountId,
        source: LedgerError,
    },
    #[error("Ledger authorization failed: {0}")]
    RemoteAuthFailure(LedgerError),
    #[error("Submission to account {account} failed: {source}")]
    RemoteSubmitFailure {
        account: AccountId,
        source: LedgerError,
    },
    #[error("Ledger accepted only {created} of {submitted} transactions for account {account}")]
    PartialSubmit {
        account: AccountId,
        submitted: usize,
        created: usize,
    },
    #[error("Balance check skipped for account {account}: fed by several source accounts ({})", join_sources(.sources))]
    AmbiguousBalance {
        account: AccountId,
        sources: Vec<SourceAccountId>,
    },
}

fn join_sources(sources: &[SourceAccountId]) -> String {
    sources
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ReconcileError {
    pub fn scope(&self) -> Scope {
        match self {
            ReconcileError::MalformedTransaction { .. } => Scope::Record,
            ReconcileError::UnresolvedAccount { .. } | ReconcileError::MappingStore { .. } => {
                Scope::SourceAccount
            }
            ReconcileError::RemoteFetchFailure { .. }
            | ReconcileError::RemoteSubmitFailure { .. }
            | ReconcileError::PartialSubmit { .. }
            | ReconcileError::AmbiguousBalance { .. } => Scope::Destination,
            ReconcileError::RemoteAuthFailure(_) => Scope::Run,
        }
    }

    /// Classifies a ledger failure on a read, promoting auth failures to fatal.
    pub(crate) fn from_fetch(account: AccountId, err: LedgerError) -> Self {
        if err.is_auth() {
            ReconcileError::RemoteAuthFailure(err)
        } else {
            ReconcileError::RemoteFetchFailure { account, source: err }
        }
    }

    /// Classifies a ledger failure on a write, promoting auth failures to fatal.
    pub(crate) fn from_submit(account: AccountId, err: LedgerError) -> Self {
        if err.is_auth() {
            ReconcileError::RemoteAuthFailure(err)
        } else {
            ReconcileError::RemoteSubmitFailure { account, source: err }
        }
    }
}
