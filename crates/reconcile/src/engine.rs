use ledgersync_core::{
    AccountId, DateBounds, DateRange, LedgerAccount, NormalizedTransaction, ParsedBatch,
    SourceAccountId,
};
use tracing::{debug, info, warn};

use crate::balance;
use crate::dedup::RemoteIndex;
use crate::error::{LedgerError, ReconcileError, Scope};
use crate::filter::filter_by_date;
use crate::ledger::LedgerClient;
use crate::mapper::{AccountChooser, AccountMapper, MappingStore};
use crate::normalize::Normalizer;
use crate::plan::{BalanceSnapshot, CommitOutcome, CommitReport, PlanEntry, ReconciliationPlan};
use crate::report::RunReport;

/// Records headed for one destination account, gathered from one or more
/// source accounts.
struct DestinationGroup {
    account: AccountId,
    sources: Vec<SourceAccountId>,
    transactions: Vec<NormalizedTransaction>,
}

/// Builds a [`ReconciliationPlan`] from a parsed file and later submits it.
///
/// Destinations are processed one at a time. A failure is confined to the
/// group or destination it hit and lands in the plan's [`RunReport`]; only
/// an authorization failure aborts the call.
pub struct ReconciliationEngine<'a, L: ?Sized, S, C> {
    ledger: &'a L,
    mapper: AccountMapper<S, C>,
}

impl<'a, L, S, C> ReconciliationEngine<'a, L, S, C>
where
    L: LedgerClient + ?Sized,
    S: MappingStore,
    C: AccountChooser,
{
    pub fn new(ledger: &'a L, mapper: AccountMapper<S, C>) -> Self {
        Self { ledger, mapper }
    }

    pub fn mapper(&self) -> &AccountMapper<S, C> {
        &self.mapper
    }

    pub fn into_mapper(self) -> AccountMapper<S, C> {
        self.mapper
    }

    /// Computes what a commit would do. Reads the ledger and may persist new
    /// mappings, but never creates transactions or touches balances.
    pub async fn build_plan(
        &mut self,
        batch: &ParsedBatch,
        bounds: DateBounds,
    ) -> Result<ReconciliationPlan, ReconcileError> {
        let mut report = RunReport {
            records_seen: batch.transactions.len(),
            ..Default::default()
        };

        let groups = self.normalize_groups(batch, &mut report).await?;
        let (accounts, details_error) = self.account_details(!groups.is_empty()).await?;

        let mut entries = Vec::new();
        for group in groups {
            let label = accounts
                .iter()
                .find(|a| a.id == group.account)
                .map(LedgerAccount::label)
                .unwrap_or_else(|| format!("account {}", group.account));

            let window = DateRange::covering(group.transactions.iter().map(|t| t.date));
            let remote = match window {
                Some(window) => match self.ledger.list_transactions(group.account, window).await {
                    Ok(remote) => remote,
                    Err(e) => {
                        let err = ReconcileError::from_fetch(group.account, e);
                        if err.scope() == Scope::Run {
                            return Err(err);
                        }
                        report.push(err);
                        continue;
                    }
                },
                None => Vec::new(),
            };
            debug!("{label}: {} remote transactions in window", remote.len());

            let (fresh, already_imported) = RemoteIndex::from_remote(&remote).filter_new(group.transactions);
            let before_filter = fresh.len();
            let transactions = filter_by_date(fresh, bounds);
            let filtered_out = before_filter - transactions.len();
            report.already_imported += already_imported;
            report.outside_dates += filtered_out;

            let stated_balance = match group.sources.as_slice() {
                [only] => batch.stated_balance(only).map(|b| b.amount),
                sources => {
                    if sources.iter().any(|s| batch.stated_balance(s).is_some()) {
                        report.push(ReconcileError::AmbiguousBalance {
                            account: group.account,
                            sources: sources.to_vec(),
                        });
                    }
                    None
                }
            };

            // A stated balance that cannot be projected now is kept for the
            // post-commit check, which reads the balance itself.
            let mut check_after_commit = false;
            let current = accounts.iter().find(|a| a.id == group.account).map(|a| a.balance);
            let balance_correction = match (stated_balance, current) {
                (Some(stated), Some(current)) => {
                    let projected = transactions
                        .iter()
                        .try_fold(current, |total, t| total.checked_add(t.amount));
                    match projected {
                        Some(projected) => Some(BalanceSnapshot::new(group.account, stated, projected))
                            .filter(BalanceSnapshot::needs_correction),
                        None => {
                            warn!("{label}: projected balance out of range");
                            check_after_commit = true;
                            None
                        }
                    }
                }
                (Some(_), None) => {
                    if let Some(e) = &details_error {
                        report.push(ReconcileError::RemoteFetchFailure {
                            account: group.account,
                            source: e.clone(),
                        });
                    }
                    check_after_commit = true;
                    None
                }
                (None, _) => None,
            };

            info!(
                "{label}: {} new, {already_imported} already imported, {filtered_out} outside {bounds}",
                transactions.len()
            );

            let entry = PlanEntry {
                account: group.account,
                account_label: label,
                sources: group.sources,
                transactions,
                already_imported,
                filtered_out,
                stated_balance,
                balance_correction,
            };
            if !entry.is_empty() || check_after_commit {
                entries.push(entry);
            }
        }

        Ok(ReconciliationPlan { entries, bounds, report })
    }

    /// Resolves every source account and normalizes its records, then merges
    /// groups that share a destination. Unresolvable groups are dropped.
    async fn normalize_groups(
        &mut self,
        batch: &ParsedBatch,
        report: &mut RunReport,
    ) -> Result<Vec<DestinationGroup>, ReconcileError> {
        let mut groups: Vec<DestinationGroup> = Vec::new();

        for source in batch.source_accounts() {
            let account = match self.mapper.resolve(source, self.ledger).await {
                Ok(account) => account,
                Err(e) if e.scope() == Scope::Run => return Err(e),
                Err(e) => {
                    report.push(e);
                    continue;
                }
            };

            let mut normalizer = Normalizer::new();
            let mut normalized = Vec::new();
            for (index, raw) in batch
                .transactions
                .iter()
                .enumerate()
                .filter(|(_, t)| &t.source_account == source)
            {
                match normalizer.normalize(raw, account) {
                    Ok(tx) => normalized.push(tx),
                    Err(reason) => report.push(ReconcileError::MalformedTransaction {
                        source_account: source.clone(),
                        index,
                        reason,
                    }),
                }
            }

            match groups.iter_mut().find(|g| g.account == account) {
                Some(group) => {
                    warn!(
                        "Source accounts {} and {} both map to account {account}; merging",
                        group.sources.iter().map(SourceAccountId::masked).collect::<Vec<_>>().join(", "),
                        source.masked()
                    );
                    group.sources.push(source.clone());
                    group.transactions.extend(normalized);
                }
                None => groups.push(DestinationGroup {
                    account,
                    sources: vec![source.clone()],
                    transactions: normalized,
                }),
            }
        }

        Ok(groups)
    }

    /// Ledger accounts for labels and projected balances. Only a failed
    /// authorization is an error; any other failure leaves the details empty
    /// and is handed back so affected destinations can record it.
    async fn account_details(
        &mut self,
        needed: bool,
    ) -> Result<(Vec<LedgerAccount>, Option<LedgerError>), ReconcileError> {
        if !needed {
            return Ok((Vec::new(), None));
        }
        match self.mapper.accounts(self.ledger).await {
            Ok(accounts) => Ok((accounts.to_vec(), None)),
            Err(e) if e.is_auth() => Err(ReconcileError::RemoteAuthFailure(e)),
            Err(e) => {
                warn!("Could not list ledger accounts: {e}");
                Ok((Vec::new(), Some(e)))
            }
        }
    }

    /// Submits `plan` exactly as built, one destination at a time.
    ///
    /// A failed destination is recorded and the rest still go through;
    /// nothing already created is rolled back. Creations are never retried.
    pub async fn commit(&mut self, plan: &ReconciliationPlan) -> Result<CommitReport, ReconcileError> {
        let mut result = CommitReport::default();

        for entry in &plan.entries {
            if entry.transactions.is_empty() {
                result.outcomes.push(CommitOutcome {
                    account: entry.account,
                    submitted: 0,
                    created: 0,
                });
                continue;
            }

            match self.ledger.create_transactions(entry.account, &entry.transactions).await {
                Ok(created) => {
                    let submitted = entry.transactions.len();
                    info!("{}: created {created} of {submitted} transactions", entry.account_label);
                    if created < submitted {
                        warn!(
                            "{}: ledger accepted {created} of {submitted} transactions",
                            entry.account_label
                        );
                        result.report.push(ReconcileError::PartialSubmit {
                            account: entry.account,
                            submitted,
                            created,
                        });
                    }
                    result.outcomes.push(CommitOutcome {
                        account: entry.account,
                        submitted,
                        created,
                    });
                }
                Err(e) => {
                    let err = ReconcileError::from_submit(entry.account, e);
                    if err.scope() == Scope::Run {
                        return Err(err);
                    }
                    result.report.push(err);
                }
            }
        }

        // balances moved; account details cached while planning are stale
        self.mapper.forget_accounts();
        Ok(result)
    }

    /// Post-commit balance check for every destination that went through.
    /// Returns the corrections to offer; none are applied here.
    pub async fn reconcile_balances(
        &self,
        plan: &ReconciliationPlan,
        committed: &CommitReport,
    ) -> Result<(Vec<BalanceSnapshot>, RunReport), ReconcileError> {
        let stated: Vec<_> = plan
            .stated_balances()
            .into_iter()
            .filter(|(account, _)| committed.succeeded(*account))
            .collect();

        let mut report = RunReport::default();
        let corrections = balance::reconcile_balances(self.ledger, &stated, &mut report).await?;
        Ok((corrections, report))
    }

    pub async fn apply_correction(&self, snapshot: &BalanceSnapshot) -> Result<(), ReconcileError> {
        balance::apply_correction(self.ledger, snapshot).await
    }
}
