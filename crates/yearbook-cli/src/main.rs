//! # yearbook
//!
//! Command-line access to a Yearbook Memories store: account management,
//! moderation queues, statistics, report export, backups and search.
//!
//! Configuration comes from `YEARBOOK_*` environment variables (see
//! [`config::CliConfig`]); log verbosity from `RUST_LOG`.

mod commands;
mod config;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;
use crate::config::CliConfig;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output on stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,yearbook_store=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = CliConfig::from_env();
    debug!(?config, "loaded configuration");

    let db = config.open()?;
    if let Some(path) = db.path() {
        info!(path = %path.display(), "store ready");
    }

    commands::run(&db, cli)
}
