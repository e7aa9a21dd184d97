use ledgersync_core::{AccountId, Money};
use tracing::{debug, info};

use crate::error::{ReconcileError, Scope};
use crate::ledger::LedgerClient;
use crate::plan::BalanceSnapshot;
use crate::report::RunReport;

/// Reads the current ledger balance of each account and returns the
/// snapshots whose drift exceeds the tolerance. Nothing is written.
///
/// A failed read skips that account and is recorded in `report`; an
/// authorization failure ends the run.
pub async fn reconcile_balances<L>(
    ledger: &L,
    stated: &[(AccountId, Money)],
    report: &mut RunReport,
) -> Result<Vec<BalanceSnapshot>, ReconcileError>
where
    L: LedgerClient + ?Sized,
{
    let mut corrections = Vec::new();
    for &(account, stated) in stated {
        let remote = match ledger.get_balance(account).await {
            Ok(balance) => balance,
            Err(e) => {
                let err = ReconcileError::from_fetch(account, e);
                if err.scope() == Scope::Run {
                    return Err(err);
                }
                report.push(err);
                continue;
            }
        };

        let snapshot = BalanceSnapshot::new(account, stated, remote);
        if snapshot.needs_correction() {
            info!(
                "Account {account}: file states {stated}, ledger has {remote} (drift {})",
                snapshot.drift()
            );
            corrections.push(snapshot);
        } else {
            debug!("Account {account}: balance {remote} matches");
        }
    }
    Ok(corrections)
}

/// Sets the ledger balance of `snapshot.account` to the stated balance.
/// Only call this after the user confirmed the correction.
pub async fn apply_correction<L>(ledger: &L, snapshot: &BalanceSnapshot) -> Result<(), ReconcileError>
where
    L: LedgerClient + ?Sized,
{
    ledger
        .update_balance(snapshot.account, snapshot.stated)
        .await
        .map_err(|e| ReconcileError::from_submit(snapshot.account, e))?;
    info!("Account {}: balance set to {}", snapshot.account, snapshot.stated);
    Ok(())
}
