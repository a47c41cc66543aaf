//! Configuration Loader
//!
//! Loads and validates the buy-core configuration from a TOML file. Every
//! option has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::jupiter::JUPITER_QUOTE_API;
use crate::adapters::market_data::{DEXSCREENER_TOKENS_API, RAYDIUM_PRICE_API, UNISWAP_V3_SUBGRAPH};
use crate::domain::delisted_registry::DEFAULT_DELISTED_FILE;
use crate::domain::price_memory::DEFAULT_PRICE_MEMORY_FILE;
use crate::domain::{
    DepthThresholds, FastPathThresholds, RawTokenSnapshot, Sensitivity, TakeProfitBounds,
};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Momentum freshness window
    #[serde(default = "default_ttl_minutes")]
    pub price_memory_ttl_minutes: u64,
    /// Cache entry expiry for pruning
    #[serde(default = "default_prune_hours")]
    pub price_memory_prune_hours: u64,

    /// Base take profit (0.5 = +50%)
    #[serde(default = "default_take_profit")]
    pub take_profit: f64,
    #[serde(default = "default_tp_min")]
    pub tp_min: f64,
    #[serde(default = "default_tp_max")]
    pub tp_max: f64,
    /// Use the sentiment/volume-tiered take profit instead of the flat one
    #[serde(default)]
    pub use_dynamic_tp: bool,

    /// Base momentum threshold (0.003 = 0.3%)
    #[serde(default = "default_min_momentum_pct")]
    pub min_momentum_pct: f64,
    #[serde(default = "default_min_depth")]
    pub min_volume_24h_for_buy: f64,
    #[serde(default = "default_min_depth")]
    pub min_liquidity_usd_for_buy: f64,
    /// Absolute price floor
    #[serde(default = "default_min_price_usd")]
    pub min_price_usd: f64,

    #[serde(default = "default_fastpath_volume")]
    pub fastpath_min_volume_24h: f64,
    #[serde(default = "default_fastpath_liquidity")]
    pub fastpath_min_liquidity_usd: f64,
    #[serde(default = "default_fastpath_sentiment")]
    pub fastpath_min_sent_score: i64,

    #[serde(default = "default_true")]
    pub enable_pre_buy_delisting_check: bool,
    #[serde(default)]
    pub pre_buy_check_sensitivity: Sensitivity,
    /// Network timeout for verification calls (seconds)
    #[serde(default = "default_timeout_secs")]
    pub pre_buy_check_timeout: u64,

    /// Allow-listed addresses, normalised to lower case
    #[serde(default, deserialize_with = "one_or_many_lowercase")]
    pub trusted_tokens: BTreeSet<String>,

    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Persistent state locations
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_price_memory_file")]
    pub price_memory_file: String,
    #[serde(default = "default_delisted_file")]
    pub delisted_tokens_file: String,
}

/// External endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesSection {
    #[serde(default = "default_raydium_url")]
    pub raydium_price_url: String,
    #[serde(default = "default_uniswap_url")]
    pub uniswap_graph_url: String,
    #[serde(default = "default_dexscreener_url")]
    pub dexscreener_tokens_url: String,
    #[serde(default = "default_jupiter_url")]
    pub jupiter_quote_url: String,
    /// Optional API key for higher rate limits
    #[serde(default)]
    pub jupiter_api_key: Option<String>,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_ttl_minutes() -> u64 { 15 }
fn default_prune_hours() -> u64 { 24 }

/// `value * unit` seconds, if it fits an i64 timestamp delta
fn to_secs(value: u64, unit: u64) -> Option<i64> {
    value.checked_mul(unit).and_then(|secs| i64::try_from(secs).ok())
}
fn default_take_profit() -> f64 { 0.5 }
fn default_tp_min() -> f64 { 0.20 }
fn default_tp_max() -> f64 { 1.00 }
fn default_min_momentum_pct() -> f64 { 0.003 }
fn default_min_depth() -> f64 { 1_000.0 }
fn default_min_price_usd() -> f64 { 0.000_000_1 }
fn default_fastpath_volume() -> f64 { 10_000.0 }
fn default_fastpath_liquidity() -> f64 { 5_000.0 }
fn default_fastpath_sentiment() -> i64 { 30 }
fn default_true() -> bool { true }
fn default_timeout_secs() -> u64 { 10 }
fn default_price_memory_file() -> String { DEFAULT_PRICE_MEMORY_FILE.to_string() }
fn default_delisted_file() -> String { DEFAULT_DELISTED_FILE.to_string() }
fn default_raydium_url() -> String { RAYDIUM_PRICE_API.to_string() }
fn default_uniswap_url() -> String { UNISWAP_V3_SUBGRAPH.to_string() }
fn default_dexscreener_url() -> String { DEXSCREENER_TOKENS_API.to_string() }
fn default_jupiter_url() -> String { JUPITER_QUOTE_API.to_string() }
fn default_log_level() -> String { "info".to_string() }

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            price_memory_file: default_price_memory_file(),
            delisted_tokens_file: default_delisted_file(),
        }
    }
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            raydium_price_url: default_raydium_url(),
            uniswap_graph_url: default_uniswap_url(),
            dexscreener_tokens_url: default_dexscreener_url(),
            jupiter_quote_url: default_jupiter_url(),
            jupiter_api_key: None,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            price_memory_ttl_minutes: default_ttl_minutes(),
            price_memory_prune_hours: default_prune_hours(),
            take_profit: default_take_profit(),
            tp_min: default_tp_min(),
            tp_max: default_tp_max(),
            use_dynamic_tp: false,
            min_momentum_pct: default_min_momentum_pct(),
            min_volume_24h_for_buy: default_min_depth(),
            min_liquidity_usd_for_buy: default_min_depth(),
            min_price_usd: default_min_price_usd(),
            fastpath_min_volume_24h: default_fastpath_volume(),
            fastpath_min_liquidity_usd: default_fastpath_liquidity(),
            fastpath_min_sent_score: default_fastpath_sentiment(),
            enable_pre_buy_delisting_check: true,
            pre_buy_check_sensitivity: Sensitivity::default(),
            pre_buy_check_timeout: default_timeout_secs(),
            trusted_tokens: BTreeSet::new(),
            paths: PathsSection::default(),
            sources: SourcesSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

/// Accept `trusted_tokens = "0xabc"` as well as a list
fn one_or_many_lowercase<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let values = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    };

    Ok(values
        .into_iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "{} must be >= 0, got {}",
            name, value
        )));
    }
    Ok(())
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.price_memory_ttl_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "price_memory_ttl_minutes must be > 0".to_string(),
            ));
        }

        if self.price_memory_prune_hours == 0 {
            return Err(ConfigError::ValidationError(
                "price_memory_prune_hours must be > 0".to_string(),
            ));
        }

        for (name, value, unit) in [
            ("price_memory_ttl_minutes", self.price_memory_ttl_minutes, 60),
            ("price_memory_prune_hours", self.price_memory_prune_hours, 3600),
        ] {
            if to_secs(value, unit).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "{} is too large: {}",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("take_profit", self.take_profit),
            ("tp_min", self.tp_min),
            ("tp_max", self.tp_max),
            ("min_momentum_pct", self.min_momentum_pct),
            ("min_volume_24h_for_buy", self.min_volume_24h_for_buy),
            ("min_liquidity_usd_for_buy", self.min_liquidity_usd_for_buy),
            ("min_price_usd", self.min_price_usd),
            ("fastpath_min_volume_24h", self.fastpath_min_volume_24h),
            ("fastpath_min_liquidity_usd", self.fastpath_min_liquidity_usd),
        ] {
            non_negative(name, value)?;
        }

        if self.tp_min > self.tp_max {
            return Err(ConfigError::ValidationError(format!(
                "tp_min ({}) must be <= tp_max ({})",
                self.tp_min, self.tp_max
            )));
        }

        if self.take_profit < self.tp_min || self.take_profit > self.tp_max {
            return Err(ConfigError::ValidationError(format!(
                "take_profit must be within [{}, {}], got {}",
                self.tp_min, self.tp_max, self.take_profit
            )));
        }

        if self.fastpath_min_sent_score < 0 {
            return Err(ConfigError::ValidationError(format!(
                "fastpath_min_sent_score must be >= 0, got {}",
                self.fastpath_min_sent_score
            )));
        }

        if self.pre_buy_check_timeout == 0 {
            return Err(ConfigError::ValidationError(
                "pre_buy_check_timeout must be > 0".to_string(),
            ));
        }

        for (name, url) in [
            ("raydium_price_url", &self.sources.raydium_price_url),
            ("uniswap_graph_url", &self.sources.uniswap_graph_url),
            ("dexscreener_tokens_url", &self.sources.dexscreener_tokens_url),
            ("jupiter_quote_url", &self.sources.jupiter_quote_url),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{} cannot be empty", name)));
            }
        }

        if self.paths.price_memory_file.trim().is_empty() || self.paths.delisted_tokens_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "state file paths cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn price_memory_ttl_secs(&self) -> i64 {
        to_secs(self.price_memory_ttl_minutes, 60).unwrap_or(i64::MAX)
    }

    pub fn price_memory_prune_secs(&self) -> i64 {
        to_secs(self.price_memory_prune_hours, 3600).unwrap_or(i64::MAX)
    }

    pub fn pre_buy_timeout(&self) -> Duration {
        Duration::from_secs(self.pre_buy_check_timeout)
    }

    /// Price memory path with `~` expanded
    pub fn price_memory_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.paths.price_memory_file).to_string())
    }

    /// Delisted registry path with `~` expanded
    pub fn delisted_tokens_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.paths.delisted_tokens_file).to_string())
    }

    /// Jupiter API key with environment variable fallback
    pub fn jupiter_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.sources.jupiter_api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("JUPITER_API_KEY").ok()
    }

    pub fn is_trusted(&self, address: &str) -> bool {
        self.trusted_tokens.contains(&address.trim().to_lowercase())
    }

    /// Mark a raw snapshot as trusted when its address is allow-listed
    pub fn apply_trust(&self, mut raw: RawTokenSnapshot) -> RawTokenSnapshot {
        if let Some(ref address) = raw.address {
            if self.is_trusted(address) {
                raw.is_trusted = true;
            }
        }
        raw
    }
}

impl From<&Config> for DepthThresholds {
    fn from(config: &Config) -> Self {
        DepthThresholds {
            min_volume_24h: config.min_volume_24h_for_buy,
            min_liquidity_usd: config.min_liquidity_usd_for_buy,
        }
    }
}

impl From<&Config> for FastPathThresholds {
    fn from(config: &Config) -> Self {
        FastPathThresholds {
            min_volume_24h: config.fastpath_min_volume_24h,
            min_liquidity_usd: config.fastpath_min_liquidity_usd,
            min_sentiment_score: config.fastpath_min_sent_score,
        }
    }
}

impl From<&Config> for TakeProfitBounds {
    fn from(config: &Config) -> Self {
        TakeProfitBounds {
            base: config.take_profit,
            min: config.tp_min,
            max: config.tp_max,
        }
    }
}
