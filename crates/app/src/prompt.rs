use anyhow::Result;
use ledgersync_core::{AccountId, LedgerAccount, SourceAccountId};
use ledgersync_reconcile::AccountChooser;
use std::io::{self, BufRead, Write};

/// How unseen source accounts get a destination.
pub enum Chooser {
    /// Ask on the terminal.
    Terminal,
    /// Never choose; the account's transactions are skipped.
    Headless,
}

impl AccountChooser for Chooser {
    fn choose(&mut self, source: &SourceAccountId, candidates: &[LedgerAccount]) -> Option<AccountId> {
        match self {
            Chooser::Terminal => ask_account(source, candidates).unwrap_or_else(|e| {
                tracing::warn!("Could not read a choice: {e}");
                None
            }),
            Chooser::Headless => None,
        }
    }
}

fn ask_account(source: &SourceAccountId, candidates: &[LedgerAccount]) -> io::Result<Option<AccountId>> {
    println!("\nSource account {} has no ledger account yet.", source.masked());
    for (i, account) in candidates.iter().enumerate() {
        let kind = account.kind().map(|k| format!(" [{k}]")).unwrap_or_default();
        println!("  {:>2}) {}{kind}  {}", i + 1, account.label(), account.balance);
    }

    let stdin = io::stdin();
    loop {
        print!("Map to which account? [1-{}, Enter to skip] ", candidates.len());
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim();
        if input.is_empty() || input.eq_ignore_ascii_case("s") {
            return Ok(None);
        }
        match input.parse::<usize>() {
            Ok(n) if (1..=candidates.len()).contains(&n) => return Ok(Some(candidates[n - 1].id)),
            _ => println!("Enter a number from the list."),
        }
    }
}

/// `[y/N]` question on the terminal. Anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> Result<bool> {
    print!("\n{question} [y/N] ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let answer = input.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
