//! Momentum Gate - buy-signal decision core for a token-trading bot

use anyhow::Result;
use clap::Parser;

use momentum_gate::adapters::cli::{self, CliApp};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (JUPITER_API_KEY goes here, not in the config)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    cli::execute(app).await
}
