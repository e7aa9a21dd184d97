use anyhow::{bail, Context, Result};
use ledgersync_core::DateBounds;
use ledgersync_reconcile::{AccountMapper, ReconciliationEngine, RunReport, Scope};
use ledgersync_storage::FileMappingStore;
use std::io::IsTerminal;
use std::path::Path;
use tracing::info;

use super::connect;
use crate::cli::ImportArgs;
use crate::prompt::{confirm, Chooser};
use crate::render;

pub async fn cmd_import(config: &Path, api_key: Option<&str>, args: &ImportArgs) -> Result<()> {
    let bounds = DateBounds::new(args.since, args.until);
    if bounds.is_inverted() {
        bail!("--since must not be after --until");
    }

    let store = FileMappingStore::open(config)?;
    let settings = store.settings().clone();

    let batch = ledgersync_import::load_batch(&args.file, settings.import.balance_source)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    info!(
        "Read {} transactions for {} accounts from {}",
        batch.transactions.len(),
        batch.source_accounts().len(),
        args.file.display()
    );

    let ledger = connect(&settings, api_key).await?;

    let interactive = !args.non_interactive && std::io::stdin().is_terminal();
    let chooser = if interactive { Chooser::Terminal } else { Chooser::Headless };
    let mut engine = ReconciliationEngine::new(&ledger, AccountMapper::new(store, chooser));

    let plan = engine.build_plan(&batch, bounds).await?;
    render::plan(&plan);
    render::issues(&plan.report);

    if args.dry_run {
        println!("\nDry run: nothing was submitted.");
        return Ok(());
    }

    let count = plan.transaction_count();
    if count > 0
        && !args.yes
        && (!interactive || !confirm(&format!("Create {count} transactions?"))?)
    {
        if !interactive {
            println!("\nNot submitting without --yes in a non-interactive run.");
        } else {
            println!("Cancelled.");
        }
        return Ok(());
    }

    let committed = engine.commit(&plan).await?;
    render::commit(&plan, &committed);
    render::issues(&committed.report);

    let (corrections, balance_report) = engine.reconcile_balances(&plan, &committed).await?;
    render::issues(&balance_report);

    let mut correction_report = RunReport::default();
    for snapshot in &corrections {
        let label = plan
            .entry(snapshot.account)
            .map(|e| e.account_label.as_str())
            .unwrap_or("account");
        render::correction(label, snapshot);

        let apply = if args.yes {
            true
        } else if interactive {
            confirm(&format!("Set the ledger balance of {label} to {}?", snapshot.stated))?
        } else {
            false
        };
        if !apply {
            println!("  Left unchanged.");
            continue;
        }

        match engine.apply_correction(snapshot).await {
            Ok(()) => println!("  ✓ Balance updated"),
            Err(e) if e.scope() == Scope::Run => return Err(e.into()),
            Err(e) => correction_report.push(e),
        }
    }

    let mut totals = plan.report.clone();
    totals.merge(committed.report.clone());
    totals.merge(balance_report);
    totals.merge(correction_report);
    render::summary(&totals, committed.created());
    Ok(())
}
