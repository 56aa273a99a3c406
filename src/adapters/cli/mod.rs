//! Command-line interface definitions.

pub mod commands;

pub use commands::{CliApp, Command, QuoteCmd, RunCmd, StatusCmd};
