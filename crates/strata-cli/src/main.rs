//! Strata — command-line frontend for the dataset index.
//!
//! Loads the user configuration, sets up logging on stderr, and runs one
//! subcommand against the dataset enclosing the current directory.

mod cli;
mod commands;

use std::io;

use anyhow::Context;
use clap::Parser;
use strata_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    init_tracing(cli.verbose, &config.log.level);

    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    commands::execute(&cli.command, &config, &cwd, &mut out)
}

/// `RUST_LOG` wins; otherwise `-v` flags, then the configured level.
fn init_tracing(verbose: u8, configured: &str) {
    let fallback = match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
