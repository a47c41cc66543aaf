//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the momentum-gate buy core.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::application::BuySignalPipeline;
use crate::config::{load_config, Config};
use crate::domain::{
    DelistedTokenRegistry, PriceMemoryStore, RawTokenSnapshot, TakeProfitCalculator, TokenSnapshot,
};

/// Momentum Gate - buy-signal decision core for a token-trading bot
#[derive(Parser, Debug)]
#[command(
    name = "momentum-gate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Buy-signal decision core for a token-trading bot",
    long_about = "Momentum Gate decides whether to buy a candidate token from a market-data \
                  snapshot: delisting checks, depth gates, price-memory momentum and a \
                  first-sighting fast path."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

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
    /// Evaluate buy signals for token snapshots
    Evaluate(EvaluateCmd),

    /// Drop expired price memory entries
    Prune(PruneCmd),

    /// Show the take-profit ratio for token snapshots
    TakeProfit(TakeProfitCmd),

    /// List the delisted token registry
    Registry(RegistryCmd),
}

/// Evaluate snapshots
#[derive(Parser, Debug)]
pub struct EvaluateCmd {
    /// JSON file holding one snapshot or an array of snapshots
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: PathBuf,
}

/// Prune price memory
#[derive(Parser, Debug)]
pub struct PruneCmd {
    /// Report what would be removed without rewriting the file
    #[arg(long)]
    pub dry_run: bool,
}

/// Take-profit for snapshots
#[derive(Parser, Debug)]
pub struct TakeProfitCmd {
    /// JSON file holding one snapshot or an array of snapshots
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Always use the sentiment/volume tiers, even with use_dynamic_tp off
    #[arg(long)]
    pub dynamic: bool,
}

/// Delisted registry listing
#[derive(Parser, Debug)]
pub struct RegistryCmd {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Registry output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = load_config(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;

    init_logging(app.verbose, app.debug, &config.logging.level)?;
    tracing::debug!("Config: {}", app.config.display());

    match app.command {
        Command::Evaluate(cmd) => evaluate_command(cmd, &config).await,
        Command::Prune(cmd) => prune_command(cmd, &config),
        Command::TakeProfit(cmd) => take_profit_command(cmd, &config),
        Command::Registry(cmd) => registry_command(cmd, &config),
    }
}

/// Initialize logging system
///
/// `RUST_LOG` wins, then `--debug`, then `--verbose`, then the config level.
fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Many(Vec<RawTokenSnapshot>),
    One(Box<RawTokenSnapshot>),
}

/// Read a snapshot file, keeping malformed entries as errors so each can be reported
fn read_snapshots(path: &Path, config: &Config) -> Result<Vec<Result<TokenSnapshot, String>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
    let parsed: SnapshotFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot file {}", path.display()))?;

    let raws = match parsed {
        SnapshotFile::Many(raws) => raws,
        SnapshotFile::One(raw) => vec![*raw],
    };

    Ok(raws
        .into_iter()
        .map(|raw| {
            let label = raw.symbol.clone().or_else(|| raw.address.clone()).unwrap_or_default();
            TokenSnapshot::try_from(config.apply_trust(raw)).map_err(|e| format!("{}: {}", label, e))
        })
        .collect())
}

/// Handle evaluate command
async fn evaluate_command(cmd: EvaluateCmd, config: &Config) -> Result<()> {
    let snapshots = read_snapshots(&cmd.snapshot, config)?;
    let mut pipeline = BuySignalPipeline::from_config(config, Utc::now().timestamp())
        .context("Failed to build buy pipeline")?;

    for snapshot in snapshots {
        let snapshot = match snapshot {
            Ok(s) => s,
            Err(e) => {
                println!("INVALID  {}", e);
                continue;
            }
        };

        let decision = pipeline.evaluate(&snapshot).await;
        match &decision.outcome {
            Ok(path) => println!(
                "BUY      {:<10} {}  tp={:.0}%  ({})",
                snapshot.symbol,
                snapshot.address(),
                pipeline.compute_take_profit(&snapshot) * 100.0,
                path
            ),
            Err(reason) => println!(
                "SKIP     {:<10} {}  ({})",
                snapshot.symbol,
                snapshot.address(),
                reason
            ),
        }
        for failure in &decision.failures {
            tracing::debug!(symbol = %snapshot.symbol, "{}", failure);
        }
    }

    Ok(())
}

/// Handle prune command
fn prune_command(cmd: PruneCmd, config: &Config) -> Result<()> {
    let now = Utc::now().timestamp();
    let mut memory = PriceMemoryStore::open(config.price_memory_path(), config.price_memory_prune_secs());
    let before = memory.len();

    if cmd.dry_run {
        let expired = memory.expired_count(now);
        println!("{} of {} entries would be removed", expired, before);
        return Ok(());
    }

    let removed = memory.prune(now);
    println!("Removed {} of {} entries ({})", removed, before, memory.path().display());
    Ok(())
}

/// Handle take-profit command
fn take_profit_command(cmd: TakeProfitCmd, config: &Config) -> Result<()> {
    let calculator = TakeProfitCalculator::new(config.into());
    let dynamic = cmd.dynamic || config.use_dynamic_tp;

    for snapshot in read_snapshots(&cmd.snapshot, config)? {
        match snapshot {
            Ok(s) => {
                let tp = if dynamic {
                    calculator.for_snapshot(&s)
                } else {
                    config.take_profit
                };
                println!("{:<10} {}  tp={:.0}%", s.symbol, s.address(), tp * 100.0);
            }
            Err(e) => println!("INVALID  {}", e),
        }
    }

    Ok(())
}

/// Handle registry command
fn registry_command(cmd: RegistryCmd, config: &Config) -> Result<()> {
    let registry = DelistedTokenRegistry::open(config.delisted_tokens_path());

    match cmd.format {
        OutputFormat::Json => {
            let entries: Vec<_> = registry
                .addresses()
                .map(|a| serde_json::json!({ "address": a, "failures": registry.failure_count(a) }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            println!("{} delisted tokens ({})", registry.len(), registry.path().display());
            for address in registry.addresses() {
                println!("  {}  failures={}", address, registry.failure_count(address));
            }
        }
    }

    Ok(())
}
