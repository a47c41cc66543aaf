//! CLI Adapter
//!
//! Command-line interface for the momentum-gate buy core.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, EvaluateCmd, OutputFormat, PruneCmd, RegistryCmd, TakeProfitCmd};

use anyhow::Result;

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    commands::execute(app).await
}
