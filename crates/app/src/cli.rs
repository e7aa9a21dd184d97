//! CLI argument definitions using clap

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// ledgersync - import bank exports into a personal-finance ledger
#[derive(Parser)]
#[command(name = "ledgersync")]
#[command(about = "Import OFX/QFX bank exports into a Lunch Money-style ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: config.toml in the platform config directory)
    #[arg(long, global = true, env = "LEDGERSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ledger API access token
    #[arg(long, global = true, env = "LEDGERSYNC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import an OFX/QFX file
    Import(ImportArgs),

    /// List destination accounts in the ledger
    Accounts,

    /// Manage saved source -> destination account mappings
    Mappings {
        #[command(subcommand)]
        action: Option<MappingsAction>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// OFX or QFX export to import
    pub file: PathBuf,

    /// Only import transactions on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub since: Option<NaiveDate>,

    /// Only import transactions on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    pub until: Option<NaiveDate>,

    /// Show the plan without submitting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Submit without asking (balance corrections included)
    #[arg(short, long)]
    pub yes: bool,

    /// Never prompt; unmapped accounts are skipped
    #[arg(long)]
    pub non_interactive: bool,
}

#[derive(Subcommand)]
pub enum MappingsAction {
    /// Show saved mappings (default)
    List,

    /// Forget the mapping of one source account
    Remove {
        /// Source account id as it appears in the export file
        source: String,
    },

    /// Forget all mappings
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    ledgersync_core::parse_date(s).ok_or_else(|| format!("'{s}' is not a date (expected YYYY-MM-DD)"))
}
