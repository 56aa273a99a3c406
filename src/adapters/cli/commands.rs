//! CLI Command Definitions
//!
//! Argument parsing for the odos-swap binary. The handlers live in main.rs.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Odos Swap Bot - one-shot DCA swaps on Optimism
#[derive(Parser, Debug)]
#[command(
    name = "odos-swap",
    version = env!("CARGO_PKG_VERSION"),
    about = "One-shot DCA swap bot for Optimism via the Odos aggregator",
    long_about = "Swaps a fixed amount of an ERC-20 token into another via the Odos \
                  smart order router, with an optional larger Friday amount and an \
                  optional forward of the acquired tokens to a second address."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one swap run (quote, approve if needed, swap, forward)
    Run(RunCmd),

    /// Fetch and print a quote without sending anything
    Quote(QuoteCmd),

    /// Show wallet address and token balances
    Status(StatusCmd),
}

/// Execute one swap run
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/optimism.toml")]
    pub config: PathBuf,

    /// Quote and assemble only; send no transaction
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt (required for unattended runs)
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Path to the run lock file
    #[arg(long, value_name = "FILE", default_value = "odos-swap.lock")]
    pub lock_file: PathBuf,
}

/// Fetch a quote
#[derive(Parser, Debug)]
pub struct QuoteCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/optimism.toml")]
    pub config: PathBuf,

    /// Override the configured amount for this quote
    #[arg(long, value_name = "AMOUNT")]
    pub amount: Option<Decimal>,
}

/// Show status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/optimism.toml")]
    pub config: PathBuf,
}
