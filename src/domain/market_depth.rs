//! Market Depth Gate
//!
//! Rejects tokens whose 24h volume or pool liquidity is below a floor.
//! The floor is tiered: trusted tokens get half the base floor (never below
//! `TRUSTED_DEPTH_FLOOR`), and non-primary chains scale that further down via
//! their chain policy.

use super::chain::ChainClass;
use super::token::TokenSnapshot;

/// Minimum depth floor a trusted token can be relaxed to
pub const TRUSTED_DEPTH_FLOOR: f64 = 2_000.0;

const TRUSTED_DEPTH_FACTOR: f64 = 0.5;

/// Base depth floors from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthThresholds {
    pub min_volume_24h: f64,
    pub min_liquidity_usd: f64,
}

/// Why a snapshot failed the depth gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthShortfall {
    pub volume_24h: f64,
    pub liquidity: f64,
    pub required: DepthThresholds,
}

#[derive(Debug, Clone)]
pub struct MarketDepthGate {
    base: DepthThresholds,
}

impl MarketDepthGate {
    pub fn new(base: DepthThresholds) -> Self {
        Self { base }
    }

    /// Effective floors for a chain class and trust flag
    pub fn thresholds_for(&self, chain: ChainClass, trusted: bool) -> DepthThresholds {
        let (mut volume, mut liquidity) = (self.base.min_volume_24h, self.base.min_liquidity_usd);

        if trusted {
            volume = (volume * TRUSTED_DEPTH_FACTOR).max(TRUSTED_DEPTH_FLOOR);
            liquidity = (liquidity * TRUSTED_DEPTH_FACTOR).max(TRUSTED_DEPTH_FLOOR);
        }

        let policy = chain.policy();
        if let Some(scale) = policy.depth_volume {
            volume = scale.apply(volume);
        }
        if let Some(scale) = policy.depth_liquidity {
            liquidity = scale.apply(liquidity);
        }

        DepthThresholds {
            min_volume_24h: volume,
            min_liquidity_usd: liquidity,
        }
    }

    /// Pass when both volume and liquidity meet their floors
    pub fn check(&self, snapshot: &TokenSnapshot) -> Result<(), DepthShortfall> {
        let required = self.thresholds_for(snapshot.chain(), snapshot.is_trusted);
        if snapshot.volume_24h < required.min_volume_24h || snapshot.liquidity < required.min_liquidity_usd {
            return Err(DepthShortfall {
                volume_24h: snapshot.volume_24h,
                liquidity: snapshot.liquidity,
                required,
            });
        }
        Ok(())
    }
}
