//! Chain Classes
//!
//! Every threshold in the buy pipeline is tiered by the chain a token lives on.
//! Rather than re-checking chain ids ad hoc, each snapshot resolves to one of
//! three classes and every gate reads its scaling from the class policy table.
//!
//! - `Primary`: the EVM chain (ethereum) - the strictest depth/momentum bars
//! - `SecondaryPrimary`: the native chain (solana) - looser bars, liquidity override
//! - `Other`: every other chain - loosest bars, no liveness verification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chain id of the primary (EVM) chain
pub const PRIMARY_CHAIN_ID: &str = "ethereum";

/// Chain id of the secondary-primary (native) chain
pub const SECONDARY_PRIMARY_CHAIN_ID: &str = "solana";

/// Chain class a snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainClass {
    /// EVM chain
    Primary,
    /// Native chain
    SecondaryPrimary,
    /// Any other chain reported by discovery
    Other,
}

impl ChainClass {
    /// Resolve a (case-insensitive) chain id to its class
    pub fn from_chain_id(chain_id: &str) -> Self {
        match chain_id.trim().to_ascii_lowercase().as_str() {
            PRIMARY_CHAIN_ID => ChainClass::Primary,
            SECONDARY_PRIMARY_CHAIN_ID => ChainClass::SecondaryPrimary,
            _ => ChainClass::Other,
        }
    }

    /// Static policy table for this class
    pub fn policy(self) -> &'static ChainPolicy {
        match self {
            ChainClass::Primary => &PRIMARY_POLICY,
            ChainClass::SecondaryPrimary => &SECONDARY_PRIMARY_POLICY,
            ChainClass::Other => &OTHER_POLICY,
        }
    }

    /// Whether this is the primary chain
    pub fn is_primary(self) -> bool {
        matches!(self, ChainClass::Primary)
    }
}

impl fmt::Display for ChainClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainClass::Primary => write!(f, "primary"),
            ChainClass::SecondaryPrimary => write!(f, "secondary-primary"),
            ChainClass::Other => write!(f, "other"),
        }
    }
}

/// Multiplicative scaling with a hard floor: `max(floor, value * factor)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlooredScale {
    pub factor: f64,
    pub floor: f64,
}

impl FlooredScale {
    pub const fn new(factor: f64, floor: f64) -> Self {
        Self { factor, floor }
    }

    /// Apply the scaling to a base threshold
    pub fn apply(&self, value: f64) -> f64 {
        (value * self.factor).max(self.floor)
    }
}

/// Which liveness verification strategy a chain class supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessStrategy {
    /// Native chain: trust feed price first, single price source
    Native,
    /// EVM chain: always verify against the price source chain
    Evm,
}

/// Threshold table for one chain class
#[derive(Debug, Clone, PartialEq)]
pub struct ChainPolicy {
    /// Depth scaling applied on top of the trusted-adjusted floors (`None` = unscaled)
    pub depth_volume: Option<FlooredScale>,
    pub depth_liquidity: Option<FlooredScale>,
    /// Momentum threshold scaling (`None` = unscaled)
    pub momentum: Option<FlooredScale>,
    /// Fast-path volume requirement as a fraction of the configured threshold
    pub fast_path_volume_factor: f64,
    /// Fast-path liquidity requirement as a fraction of the configured threshold
    pub fast_path_liquidity_factor: f64,
    /// Whether the fast path demands a sentiment signal from untrusted tokens
    pub fast_path_requires_sentiment: bool,
    /// Liveness strategy (`None` = the delisting detector skips this class)
    pub liveness: Option<LivenessStrategy>,
}

const PRIMARY_POLICY: ChainPolicy = ChainPolicy {
    depth_volume: None,
    depth_liquidity: None,
    momentum: None,
    fast_path_volume_factor: 1.0,
    fast_path_liquidity_factor: 1.0,
    fast_path_requires_sentiment: true,
    liveness: Some(LivenessStrategy::Evm),
};

const SECONDARY_PRIMARY_POLICY: ChainPolicy = ChainPolicy {
    depth_volume: Some(FlooredScale::new(0.2, 100.0)),
    depth_liquidity: Some(FlooredScale::new(0.3, 500.0)),
    momentum: Some(FlooredScale::new(0.05, 0.0001)),
    fast_path_volume_factor: 0.01,
    fast_path_liquidity_factor: 0.02,
    fast_path_requires_sentiment: false,
    liveness: Some(LivenessStrategy::Native),
};

const OTHER_POLICY: ChainPolicy = ChainPolicy {
    liveness: None,
    ..SECONDARY_PRIMARY_POLICY
};

/// Delisting check sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Lenient,
    #[default]
    Moderate,
    Strict,
}

impl FromStr for Sensitivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Sensitivity::Lenient),
            "moderate" => Ok(Sensitivity::Moderate),
            "strict" => Ok(Sensitivity::Strict),
            other => Err(format!("unknown sensitivity '{}'", other)),
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensitivity::Lenient => write!(f, "lenient"),
            Sensitivity::Moderate => write!(f, "moderate"),
            Sensitivity::Strict => write!(f, "strict"),
        }
    }
}

/// Volume/liquidity pairs used by the delisting detector
///
/// Above `good_*` the feed is trusted outright; below `poor_*` a zero price
/// from every source is enough to call the token delisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LivenessThresholds {
    pub good_volume: f64,
    pub good_liquidity: f64,
    pub poor_volume: f64,
    pub poor_liquidity: f64,
}

impl LivenessThresholds {
    const fn new(good_volume: f64, good_liquidity: f64, poor_volume: f64, poor_liquidity: f64) -> Self {
        Self {
            good_volume,
            good_liquidity,
            poor_volume,
            poor_liquidity,
        }
    }

    /// Threshold table for a strategy at a given sensitivity
    pub fn for_strategy(strategy: LivenessStrategy, sensitivity: Sensitivity) -> Self {
        match (strategy, sensitivity) {
            (LivenessStrategy::Native, Sensitivity::Lenient) => Self::new(25.0, 100.0, 5.0, 25.0),
            (LivenessStrategy::Native, Sensitivity::Moderate) => Self::new(500.0, 1_000.0, 10.0, 50.0),
            (LivenessStrategy::Native, Sensitivity::Strict) => Self::new(1_000.0, 5_000.0, 50.0, 200.0),
            (LivenessStrategy::Evm, Sensitivity::Lenient) => Self::new(100.0, 500.0, 10.0, 50.0),
            (LivenessStrategy::Evm, Sensitivity::Moderate) => Self::new(1_000.0, 5_000.0, 50.0, 200.0),
            (LivenessStrategy::Evm, Sensitivity::Strict) => Self::new(2_000.0, 10_000.0, 100.0, 500.0),
        }
    }

    /// Both metrics strictly above `good / divisor`
    pub fn exceeds_good(&self, volume: f64, liquidity: f64, divisor: f64) -> bool {
        volume > self.good_volume / divisor && liquidity > self.good_liquidity / divisor
    }

    /// Both metrics strictly below `poor * factor`
    pub fn below_poor(&self, volume: f64, liquidity: f64, factor: f64) -> bool {
        volume < self.poor_volume * factor && liquidity < self.poor_liquidity * factor
    }
}
