//! Reconciliation core: turns a parsed export into the minimal set of
//! ledger operations (transaction creations and balance corrections).
//!
//! Data flows parser -> [`normalize`] -> [`dedup`] -> [`filter`] ->
//! [`engine`] assembles a [`ReconciliationPlan`] -> commit -> [`balance`].

pub mod balance;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod mapper;
pub mod normalize;
pub mod plan;
pub mod report;

pub use balance::{apply_correction, reconcile_balances};
pub use dedup::{filter_new, RemoteIndex};
pub use engine::ReconciliationEngine;
pub use error::{LedgerError, MalformedReason, ReconcileError, Scope};
pub use filter::filter_by_date;
pub use ledger::LedgerClient;
pub use mapper::{
    AccountChooser, AccountMapper, MappingStore, MemoryMappingStore, NonInteractive, StoreError,
};
pub use normalize::{external_id, Flow, Normalizer};
pub use plan::{
    balance_tolerance, BalanceSnapshot, CommitOutcome, CommitReport, PlanEntry,
    ReconciliationPlan,
};
pub use report::RunReport;
