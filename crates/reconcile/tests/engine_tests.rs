use async_trait::async_trait;
use chrono::NaiveDate;
use ledgersync_core::{
    AccountId, DateBounds, DateRange, ExternalId, LedgerAccount, Money, NormalizedTransaction,
    ParsedBatch, RawTransaction, RemoteTransaction, SourceAccountId, StatedBalance,
};
use ledgersync_import::BalanceSource;
use ledgersync_reconcile::{
    AccountMapper, LedgerError, MappingStore, MemoryMappingStore, NonInteractive, ReconcileError,
    ReconciliationEngine, Scope,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// In-memory ledger: created transactions show up in later listings and
/// move the account balance.
#[derive(Default)]
struct FakeLedger {
    accounts: Mutex<Vec<LedgerAccount>>,
    transactions: Mutex<Vec<RemoteTransaction>>,
    failing_fetch: HashMap<AccountId, LedgerError>,
    failing_submit: HashMap<AccountId, LedgerError>,
    failing_accounts: Option<LedgerError>,
    /// Accounts where the ledger keeps only the first N rows of a batch.
    accepts_at_most: HashMap<AccountId, usize>,
    fetches: Mutex<Vec<AccountId>>,
}

impl FakeLedger {
    fn with_accounts(ids: &[i64]) -> Self {
        let ledger = FakeLedger::default();
        *ledger.accounts.lock().unwrap() = ids
            .iter()
            .map(|id| LedgerAccount::new(AccountId(*id), &format!("Checking {id}"), Money::zero()))
            .collect();
        ledger
    }

    fn set_balance(&self, account: AccountId, balance: Money) {
        for a in self.accounts.lock().unwrap().iter_mut() {
            if a.id == account {
                a.balance = balance;
            }
        }
    }

    fn stored(&self, account: AccountId) -> usize {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.account == account)
            .count()
    }
}

#[async_trait]
impl ledgersync_reconcile::LedgerClient for FakeLedger {
    async fn list_accounts(&self) -> Result<Vec<LedgerAccount>, LedgerError> {
        if let Some(e) = &self.failing_accounts {
            return Err(e.clone());
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn list_transactions(
        &self,
        account: AccountId,
        window: DateRange,
    ) -> Result<Vec<RemoteTransaction>, LedgerError> {
        self.fetches.lock().unwrap().push(account);
        if let Some(e) = self.failing_fetch.get(&account) {
            return Err(e.clone());
        }
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.account == account && window.contains(t.date))
            .cloned()
            .collect())
    }

    async fn create_transactions(
        &self,
        account: AccountId,
        batch: &[NormalizedTransaction],
    ) -> Result<usize, LedgerError> {
        if let Some(e) = self.failing_submit.get(&account) {
            return Err(e.clone());
        }
        let accepted = self.accepts_at_most.get(&account).copied().unwrap_or(batch.len());
        let batch = &batch[..accepted.min(batch.len())];
        let mut stored = self.transactions.lock().unwrap();
        let mut total = Money::zero();
        for tx in batch {
            let id = stored.len() as i64 + 1;
            stored.push(RemoteTransaction {
                id,
                account,
                date: tx.date,
                amount: tx.amount,
                payee: tx.payee.clone(),
                external_id: Some(tx.external_id.clone()),
            });
            total = total + tx.amount;
        }
        drop(stored);
        let current = self.get_balance_now(account);
        self.set_balance(account, current + total);
        Ok(batch.len())
    }

    async fn get_balance(&self, account: AccountId) -> Result<Money, LedgerError> {
        Ok(self.get_balance_now(account))
    }

    async fn update_balance(&self, account: AccountId, balance: Money) -> Result<(), LedgerError> {
        self.set_balance(account, balance);
        Ok(())
    }
}

impl FakeLedger {
    fn get_balance_now(&self, account: AccountId) -> Money {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == account)
            .map(|a| a.balance)
            .unwrap_or(Money::zero())
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn raw(source: &str, kind: &str, date: &str, amount: &str, name: &str, fit_id: Option<&str>) -> RawTransaction {
    RawTransaction {
        source_account: SourceAccountId::from(source),
        kind: Some(kind.to_string()),
        date: date.to_string(),
        amount: amount.to_string(),
        name: Some(name.to_string()),
        memo: None,
        reference: fit_id.map(str::to_string),
        check_number: None,
    }
}

fn batch(transactions: Vec<RawTransaction>) -> ParsedBatch {
    ParsedBatch {
        transactions,
        ..Default::default()
    }
}

fn stated(source: &str, cents: i64) -> StatedBalance {
    StatedBalance {
        source_account: SourceAccountId::from(source),
        amount: Money::from_cents(cents),
        as_of: None,
    }
}

fn mapped(pairs: &[(&str, i64)]) -> AccountMapper<MemoryMappingStore, NonInteractive> {
    let store = pairs
        .iter()
        .fold(MemoryMappingStore::new(), |s, (src, id)| s.with(src, AccountId(*id)));
    AccountMapper::new(store, NonInteractive)
}

fn ids(transactions: &[NormalizedTransaction]) -> HashSet<ExternalId> {
    transactions.iter().map(|t| t.external_id.clone()).collect()
}

#[tokio::test]
async fn second_run_after_commit_plans_nothing() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let file = batch(vec![
        raw("CHK", "DEBIT", "20240305", "-12.00", "CAFE", Some("F1")),
        raw("CHK", "CREDIT", "20240306", "800.00", "PAYROLL", Some("F2")),
        raw("CHK", "POS", "20240307", "-3.50", "BAKERY", None),
    ]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("CHK", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert_eq!(plan.transaction_count(), 3);
    let committed = engine.commit(&plan).await.unwrap();
    assert_eq!(committed.created(), 3);
    assert!(committed.report.is_clean());

    let again = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert_eq!(again.transaction_count(), 0);
    assert!(again.is_empty());
    assert_eq!(again.report.already_imported, 3);
    assert_eq!(ledger.stored(AccountId(10)), 3);
}

#[tokio::test]
async fn identical_records_survive_as_separate_entries() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let file = batch(vec![
        raw("CHK", "DEBIT", "20240301", "-2.75", "TRANSIT", None),
        raw("CHK", "DEBIT", "20240301", "-2.75", "TRANSIT", None),
        raw("CHK", "DEBIT", "20240301", "-2.75", "TRANSIT", None),
    ]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("CHK", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    let entry = plan.entry(AccountId(10)).unwrap();
    assert_eq!(entry.transactions.len(), 3);
    assert_eq!(ids(&entry.transactions).len(), 3);

    engine.commit(&plan).await.unwrap();
    let again = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert_eq!(again.transaction_count(), 0);
}

#[tokio::test]
async fn a_fourth_copy_in_a_later_file_is_new() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let three = vec![raw("CHK", "DEBIT", "20240301", "-2.75", "TRANSIT", None); 3];
    let mut four = three.clone();
    four.push(raw("CHK", "DEBIT", "20240301", "-2.75", "TRANSIT", None));
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("CHK", 10)]));

    let plan = engine.build_plan(&batch(three), DateBounds::unbounded()).await.unwrap();
    engine.commit(&plan).await.unwrap();

    let plan = engine.build_plan(&batch(four), DateBounds::unbounded()).await.unwrap();
    assert_eq!(plan.transaction_count(), 1);
}

#[tokio::test]
async fn debit_is_planned_as_outflow() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let file = batch(vec![raw("CHK", "DEBIT", "20240301", "42.50", "GROCER", Some("G1"))]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("CHK", 10)]));

    for _ in 0..2 {
        let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
        let tx = &plan.entry(AccountId(10)).unwrap().transactions[0];
        assert_eq!(tx.amount, Money::from_cents(-4250));
    }
}

#[tokio::test]
async fn date_bounds_are_inclusive() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let file = batch(vec![
        raw("CHK", "DEBIT", "20240309", "-1", "A", None),
        raw("CHK", "DEBIT", "20240310", "-1", "B", None),
        raw("CHK", "DEBIT", "20240320", "-1", "C", None),
        raw("CHK", "DEBIT", "20240321", "-1", "D", None),
    ]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("CHK", 10)]));

    let plan = engine
        .build_plan(&file, DateBounds::new(Some(day(10)), Some(day(20))))
        .await
        .unwrap();
    let entry = plan.entry(AccountId(10)).unwrap();
    let payees: Vec<_> = entry.transactions.iter().map(|t| t.payee.as_str()).collect();
    assert_eq!(payees, vec!["B", "C"]);
    assert_eq!(entry.filtered_out, 2);
    assert_eq!(plan.report.outside_dates, 2);
}

#[tokio::test]
async fn unmapped_group_aborts_alone() {
    let ledger = FakeLedger::with_accounts(&[10, 20]);
    let file = batch(vec![
        raw("CHK", "DEBIT", "20240301", "-5", "SHOP", Some("1")),
        raw("NEW", "DEBIT", "20240301", "-6", "SHOP", Some("2")),
        raw("CHK", "DEBIT", "20240302", "-7", "SHOP", Some("3")),
    ]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("CHK", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert_eq!(plan.entries.len(), 1);
    assert_eq!(plan.entry(AccountId(10)).unwrap().transactions.len(), 2);

    assert_eq!(plan.report.issues.len(), 1);
    assert!(matches!(
        &plan.report.issues[0],
        ReconcileError::UnresolvedAccount { source_account, .. } if source_account.as_str() == "NEW"
    ));
    assert!(engine.mapper().store().get(&SourceAccountId::from("NEW")).is_none());
}

#[tokio::test]
async fn interactive_choice_is_persisted_for_next_run() {
    let ledger = FakeLedger::with_accounts(&[10, 20]);
    let file = batch(vec![raw("NEW", "DEBIT", "20240301", "-6", "SHOP", Some("2"))]);
    let chooser = |_: &SourceAccountId, candidates: &[LedgerAccount]| {
        candidates.iter().find(|a| a.id == AccountId(20)).map(|a| a.id)
    };
    let mut engine = ReconciliationEngine::new(&ledger, AccountMapper::new(MemoryMappingStore::new(), chooser));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert_eq!(plan.entry(AccountId(20)).unwrap().account_label, "Checking 20");

    let store = engine.into_mapper().into_store();
    let mut next = ReconciliationEngine::new(&ledger, AccountMapper::new(store, NonInteractive));
    let plan = next.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert!(plan.report.is_clean());
    assert_eq!(plan.transaction_count(), 1);
}

#[tokio::test]
async fn malformed_records_are_skipped_and_reported() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let file = batch(vec![
        raw("CHK", "DEBIT", "not a date", "-5", "SHOP", None),
        raw("CHK", "DEBIT", "20240301", "five", "SHOP", None),
        raw("CHK", "DEBIT", "20240301", "-5", "SHOP", None),
    ]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("CHK", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert_eq!(plan.transaction_count(), 1);
    assert_eq!(plan.report.count(Scope::Record), 2);
    assert!(matches!(
        plan.report.issues[1],
        ReconcileError::MalformedTransaction { index: 1, .. }
    ));
}

#[tokio::test]
async fn fetch_failure_drops_only_that_destination() {
    let mut ledger = FakeLedger::with_accounts(&[10, 20]);
    ledger
        .failing_fetch
        .insert(AccountId(20), LedgerError::Transient("connection reset".into()));
    let file = batch(vec![
        raw("A", "DEBIT", "20240301", "-5", "SHOP", Some("1")),
        raw("B", "DEBIT", "20240301", "-6", "SHOP", Some("2")),
    ]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10), ("B", 20)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert!(plan.entry(AccountId(10)).is_some());
    assert!(plan.entry(AccountId(20)).is_none());
    assert!(matches!(
        plan.report.issues.as_slice(),
        [ReconcileError::RemoteFetchFailure { account: AccountId(20), .. }]
    ));
}

#[tokio::test]
async fn account_list_failure_is_recorded_and_balance_checked_after_commit() {
    let mut ledger = FakeLedger::with_accounts(&[10]);
    ledger.set_balance(AccountId(10), Money::from_cents(10_000));
    ledger.failing_accounts = Some(LedgerError::Transient("503".into()));
    let mut file = batch(vec![]);
    file.stated_balances = vec![stated("A", 5_000)];
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    let entry = plan.entry(AccountId(10)).unwrap();
    assert!(entry.transactions.is_empty());
    assert_eq!(entry.stated_balance, Some(Money::from_cents(5_000)));
    assert_eq!(entry.balance_correction, None);
    assert!(matches!(
        plan.report.issues.as_slice(),
        [ReconcileError::RemoteFetchFailure { account: AccountId(10), .. }]
    ));

    let committed = engine.commit(&plan).await.unwrap();
    let (corrections, report) = engine.reconcile_balances(&plan, &committed).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].stated, Money::from_cents(5_000));
    assert_eq!(corrections[0].remote, Money::from_cents(10_000));
}

#[tokio::test]
async fn unauthorized_account_list_aborts_the_run() {
    let mut ledger = FakeLedger::with_accounts(&[10]);
    ledger.failing_accounts = Some(LedgerError::Unauthorized("invalid token".into()));
    let file = batch(vec![raw("A", "DEBIT", "20240301", "-5", "SHOP", Some("1"))]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10)]));

    let err = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::RemoteAuthFailure(_)));
}

#[tokio::test]
async fn out_of_range_amounts_are_skipped_not_summed() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let huge = "79228162514264337593543950335";
    let mut file = batch(vec![
        raw("A", "CREDIT", "20240301", huge, "WINDFALL", Some("1")),
        raw("A", "CREDIT", "20240302", huge, "WINDFALL", Some("2")),
        raw("A", "DEBIT", "20240303", "-5", "SHOP", Some("3")),
    ]);
    file.stated_balances = vec![stated("A", 100)];
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert_eq!(plan.transaction_count(), 1);
    assert_eq!(plan.report.count(Scope::Record), 2);
    let entry = plan.entry(AccountId(10)).unwrap();
    assert_eq!(entry.total(), Money::from_cents(-500));
    assert_eq!(entry.balance_correction.map(|c| c.remote), Some(Money::from_cents(-500)));
}

#[tokio::test]
async fn partial_acceptance_is_reported_and_replanned() {
    let mut ledger = FakeLedger::with_accounts(&[10]);
    ledger.accepts_at_most.insert(AccountId(10), 1);
    let file = batch(vec![
        raw("CHK", "DEBIT", "20240301", "-2.75", "TRANSIT", None),
        raw("CHK", "DEBIT", "20240301", "-2.75", "TRANSIT", None),
        raw("CHK", "DEBIT", "20240301", "-2.75", "TRANSIT", None),
    ]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("CHK", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    let committed = engine.commit(&plan).await.unwrap();
    assert_eq!(committed.created(), 1);
    assert!(committed.succeeded(AccountId(10)));
    assert!(matches!(
        committed.report.issues.as_slice(),
        [ReconcileError::PartialSubmit { account: AccountId(10), submitted: 3, created: 1 }]
    ));

    let again = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert_eq!(again.transaction_count(), 2);
    assert_eq!(again.report.already_imported, 1);
}

#[tokio::test]
async fn unauthorized_fetch_aborts_the_run() {
    let mut ledger = FakeLedger::with_accounts(&[10, 20]);
    ledger
        .failing_fetch
        .insert(AccountId(10), LedgerError::Unauthorized("invalid token".into()));
    let file = batch(vec![
        raw("A", "DEBIT", "20240301", "-5", "SHOP", Some("1")),
        raw("B", "DEBIT", "20240301", "-6", "SHOP", Some("2")),
    ]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10), ("B", 20)]));

    let err = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap_err();
    assert_eq!(err.scope(), Scope::Run);
    assert_eq!(*ledger.fetches.lock().unwrap(), vec![AccountId(10)]);
}

#[tokio::test]
async fn each_destination_is_fetched_once() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let file = batch(vec![
        raw("A", "DEBIT", "20240301", "-5", "SHOP", Some("1")),
        raw("A", "DEBIT", "20240315", "-6", "SHOP", Some("2")),
    ]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10)]));
    engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert_eq!(*ledger.fetches.lock().unwrap(), vec![AccountId(10)]);
}

#[tokio::test]
async fn submit_failure_keeps_other_destinations() {
    let mut ledger = FakeLedger::with_accounts(&[10, 20]);
    ledger
        .failing_submit
        .insert(AccountId(10), LedgerError::Rejected { status: 400, message: "bad payee".into() });
    let mut file = batch(vec![
        raw("A", "DEBIT", "20240301", "-5", "SHOP", Some("1")),
        raw("B", "DEBIT", "20240301", "-6", "SHOP", Some("2")),
    ]);
    file.stated_balances = vec![stated("A", 100), stated("B", 100)];
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10), ("B", 20)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    let committed = engine.commit(&plan).await.unwrap();
    assert!(!committed.succeeded(AccountId(10)));
    assert!(committed.succeeded(AccountId(20)));
    assert_eq!(committed.report.count(Scope::Destination), 1);
    assert_eq!(ledger.stored(AccountId(20)), 1);

    let (corrections, _) = engine.reconcile_balances(&plan, &committed).await.unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].account, AccountId(20));
}

#[tokio::test]
async fn matching_balance_proposes_nothing() {
    let ledger = FakeLedger::with_accounts(&[10]);
    ledger.set_balance(AccountId(10), Money::from_cents(10_000));
    let mut file = batch(vec![raw("A", "DEBIT", "20240301", "-25.00", "SHOP", Some("1"))]);
    file.stated_balances = vec![stated("A", 7_500)];
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    let entry = plan.entry(AccountId(10)).unwrap();
    assert_eq!(entry.stated_balance, Some(Money::from_cents(7_500)));
    assert_eq!(entry.balance_correction, None);

    let committed = engine.commit(&plan).await.unwrap();
    let (corrections, report) = engine.reconcile_balances(&plan, &committed).await.unwrap();
    assert!(corrections.is_empty());
    assert!(report.is_clean());
}

#[tokio::test]
async fn drift_proposes_one_correction_to_the_stated_balance() {
    let ledger = FakeLedger::with_accounts(&[10]);
    ledger.set_balance(AccountId(10), Money::from_cents(10_000));
    let mut file = batch(vec![raw("A", "DEBIT", "20240301", "-25.00", "SHOP", Some("1"))]);
    file.stated_balances = vec![stated("A", 7_499)];
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    let projected = plan.entry(AccountId(10)).unwrap().balance_correction.unwrap();
    assert_eq!(projected.remote, Money::from_cents(7_500));

    let committed = engine.commit(&plan).await.unwrap();
    let (corrections, _) = engine.reconcile_balances(&plan, &committed).await.unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].stated, Money::from_cents(7_499));
    assert_eq!(ledger.get_balance_now(AccountId(10)), Money::from_cents(7_500));

    engine.apply_correction(&corrections[0]).await.unwrap();
    assert_eq!(ledger.get_balance_now(AccountId(10)), Money::from_cents(7_499));
    let (again, _) = engine.reconcile_balances(&plan, &committed).await.unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn drift_is_planned_even_when_everything_was_imported() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let mut file = batch(vec![raw("A", "DEBIT", "20240301", "-25.00", "SHOP", Some("1"))]);
    file.stated_balances = vec![stated("A", 1_000)];
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    engine.commit(&plan).await.unwrap();

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    let entry = plan.entry(AccountId(10)).unwrap();
    assert!(entry.transactions.is_empty());
    assert!(entry.balance_correction.is_some());
}

#[tokio::test]
async fn shared_destination_merges_and_skips_balance() {
    let ledger = FakeLedger::with_accounts(&[10]);
    let mut file = batch(vec![
        raw("A", "DEBIT", "20240301", "-5", "SHOP", Some("1")),
        raw("B", "DEBIT", "20240301", "-6", "SHOP", Some("1")),
    ]);
    file.stated_balances = vec![stated("A", 100)];
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("A", 10), ("B", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    let entry = plan.entry(AccountId(10)).unwrap();
    assert_eq!(entry.sources.len(), 2);
    assert_eq!(entry.transactions.len(), 2);
    assert_eq!(entry.stated_balance, None);
    assert!(matches!(
        plan.report.issues.as_slice(),
        [ReconcileError::AmbiguousBalance { account: AccountId(10), .. }]
    ));
}

#[tokio::test]
async fn parsed_ofx_file_end_to_end() {
    const STATEMENT: &str = "OFXHEADER:100\nDATA:OFXSGML\n\n<OFX><BANKMSGSRSV1><STMTTRNRS><STMTRS>\n\
        <CURDEF>USD<BANKACCTFROM><BANKID>1<ACCTID>000112345<ACCTTYPE>CHECKING</BANKACCTFROM>\n\
        <BANKTRANLIST><DTSTART>20240101<DTEND>20240131\n\
        <STMTTRN><TRNTYPE>DEBIT<DTPOSTED>20240115<TRNAMT>-49.99<FITID>TXN001<NAME>AMAZON</STMTTRN>\n\
        <STMTTRN><TRNTYPE>CREDIT<DTPOSTED>20240120<TRNAMT>1500.00<FITID>TXN002<NAME>PAYROLL</STMTTRN>\n\
        </BANKTRANLIST><LEDGERBAL><BALAMT>1450.01<DTASOF>20240131</LEDGERBAL>\n\
        <AVAILBAL><BALAMT>1450.01<DTASOF>20240131</AVAILBAL></STMTRS></STMTTRNRS></BANKMSGSRSV1></OFX>\n";

    let file = ledgersync_import::ofx::parse(STATEMENT.as_bytes())
        .unwrap()
        .into_batch(BalanceSource::Available);
    let ledger = FakeLedger::with_accounts(&[10]);
    let mut engine = ReconciliationEngine::new(&ledger, mapped(&[("000112345", 10)]));

    let plan = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    let entry = plan.entry(AccountId(10)).unwrap();
    assert_eq!(entry.total(), Money::from_cents(145_001));
    assert_eq!(entry.balance_correction, None);

    engine.commit(&plan).await.unwrap();
    let again = engine.build_plan(&file, DateBounds::unbounded()).await.unwrap();
    assert!(again.is_empty());
}
