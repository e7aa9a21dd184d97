//! ledgersync - reconcile bank exports with a personal-finance ledger
//!
//! Usage:
//!   ledgersync import statement.qfx      Import new transactions
//!   ledgersync import f.ofx --dry-run    Show what would be imported
//!   ledgersync accounts                  List ledger accounts
//!   ledgersync mappings [list|remove|reset]

mod cli;
mod commands;
mod prompt;
mod render;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    let config = commands::config_path(cli.config.as_deref())?;
    let api_key = cli.api_key.as_deref();

    match cli.command {
        Commands::Import(args) => commands::cmd_import(&config, api_key, &args).await,
        Commands::Accounts => commands::cmd_accounts(&config, api_key).await,
        Commands::Mappings { action } => match action {
            None | Some(MappingsAction::List) => commands::cmd_mappings_list(&config),
            Some(MappingsAction::Remove { source }) => commands::cmd_mappings_remove(&config, &source),
            Some(MappingsAction::Reset { yes }) => commands::cmd_mappings_reset(&config, yes),
        },
    }
}
