//! Human-readable output. Everything here goes to stdout; logs go to stderr.

use ledgersync_core::{LedgerAccount, SourceAccountId};
use ledgersync_reconcile::{BalanceSnapshot, CommitReport, ReconciliationPlan, RunReport, Scope};
use std::collections::BTreeMap;

const PAYEE_WIDTH: usize = 40;

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn sources(sources: &[SourceAccountId]) -> String {
    sources
        .iter()
        .map(SourceAccountId::masked)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn plan(plan: &ReconciliationPlan) {
    if plan.is_empty() {
        println!(
            "\nNothing to import ({}; {} already in the ledger).",
            plan.bounds, plan.report.already_imported
        );
        return;
    }

    for entry in &plan.entries {
        println!("\n{} [#{}] from {}", entry.account_label, entry.account, sources(&entry.sources));
        for tx in &entry.transactions {
            println!(
                "  {}  {:>12}  {}",
                tx.date,
                tx.amount.to_string(),
                truncate(&tx.payee, PAYEE_WIDTH)
            );
        }
        println!(
            "  {} new (net {}), {} already imported, {} outside {}",
            entry.transactions.len(),
            entry.total(),
            entry.already_imported,
            entry.filtered_out,
            plan.bounds
        );
        if let Some(c) = &entry.balance_correction {
            println!(
                "  ⚠️  file states balance {}, ledger would have {} (off by {})",
                c.stated,
                c.remote,
                c.drift()
            );
        }
    }
}

pub fn issues(report: &RunReport) {
    if report.is_clean() {
        return;
    }
    println!("\n⚠️  {} issue(s):", report.issues.len());
    for issue in &report.issues {
        println!("   - {issue}");
    }
}

pub fn commit(plan: &ReconciliationPlan, committed: &CommitReport) {
    for outcome in committed.outcomes.iter().filter(|o| o.submitted > 0) {
        let label = plan
            .entry(outcome.account)
            .map(|e| e.account_label.as_str())
            .unwrap_or("account");
        if outcome.created == outcome.submitted {
            println!("✓ {label}: created {}", outcome.created);
        } else {
            println!("⚠️  {label}: created {} of {}", outcome.created, outcome.submitted);
        }
    }
}

pub fn correction(label: &str, snapshot: &BalanceSnapshot) {
    println!(
        "\nBalance of {label}: ledger has {}, file states {} (off by {})",
        snapshot.remote,
        snapshot.stated,
        snapshot.drift()
    );
}

pub fn summary(report: &RunReport, created: usize) {
    println!(
        "\nDone: {created} created, {} already imported, {} outside the date range.",
        report.already_imported, report.outside_dates
    );
    let skipped_records = report.count(Scope::Record);
    let skipped_accounts = report.aborted_sources().len();
    let failed = report.count(Scope::Destination);
    if skipped_records + skipped_accounts + failed > 0 {
        println!(
            "   {skipped_records} records skipped, {skipped_accounts} source accounts skipped, {failed} account steps failed."
        );
    }
}

pub fn accounts(accounts: &[LedgerAccount], mappings: &BTreeMap<String, i64>) {
    println!("  {:>8}  {:<36} {:<20} {:>14}  SOURCES", "ID", "NAME", "TYPE", "BALANCE");
    for account in accounts {
        let fed_by: Vec<_> = mappings
            .iter()
            .filter(|(_, id)| **id == account.id.0)
            .map(|(source, _)| SourceAccountId::new(source.as_str()).masked())
            .collect();
        println!(
            "  {:>8}  {:<36} {:<20} {:>14}  {}",
            account.id.0,
            truncate(&account.label(), 36),
            account.kind().unwrap_or_default(),
            account.balance.to_string(),
            fed_by.join(", ")
        );
    }
}
