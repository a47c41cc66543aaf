//! Liveness Classification
//!
//! Pure decision rules of the delisting detector. The network side (querying
//! price sources, writing the registry) lives in the application layer; this
//! module only decides what a set of observations means.
//!
//! Cheapest signal first:
//! 1. feed metrics above the good / ½ / ¼ tiers -> Active
//! 2. feed price above dust (native chain only) -> Active
//! 3. any price source reports a positive price -> Active
//! 4. every source answers zero -> Delisted if metrics are poor, else Inconclusive
//! 5. every source fails -> Delisted if metrics are below half of poor, else Inconclusive

use std::fmt;

use super::chain::{LivenessStrategy, LivenessThresholds, Sensitivity};
use super::token::TokenSnapshot;

/// Dust price floor (USD)
pub const DUST_PRICE_USD: f64 = 0.000_000_1;

/// Native chain addresses the detector knows how to verify
const NATIVE_ADDRESS_LENGTHS: [usize; 2] = [43, 44];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Active,
    Delisted,
    /// Not enough signal: do not buy, do not blacklist
    Inconclusive,
}

/// Which feed-metric tier vouched for the token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedTier {
    Good,
    Moderate,
    Acceptable,
}

impl FeedTier {
    fn divisor(self) -> f64 {
        match self {
            FeedTier::Good => 1.0,
            FeedTier::Moderate => 2.0,
            FeedTier::Acceptable => 4.0,
        }
    }
}

/// The observation that decided a verdict
#[derive(Debug, Clone, PartialEq)]
pub enum LivenessSignal {
    AlreadyDelisted,
    /// The detector has no strategy for this chain/address
    NotVerifiable,
    FeedMetrics(FeedTier),
    FeedPrice(f64),
    SourcePrice { source: &'static str, price: f64 },
    ZeroPrice,
    VerificationFailed,
}

impl fmt::Display for LivenessSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LivenessSignal::AlreadyDelisted => write!(f, "already in delisted registry"),
            LivenessSignal::NotVerifiable => write!(f, "no verification strategy"),
            LivenessSignal::FeedMetrics(tier) => write!(f, "{:?} feed metrics", tier),
            LivenessSignal::FeedPrice(p) => write!(f, "feed price ${}", p),
            LivenessSignal::SourcePrice { source, price } => write!(f, "{} price ${}", source, price),
            LivenessSignal::ZeroPrice => write!(f, "zero price from every source"),
            LivenessSignal::VerificationFailed => write!(f, "price verification failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LivenessVerdict {
    pub liveness: Liveness,
    pub signal: LivenessSignal,
}

impl LivenessVerdict {
    pub fn active(signal: LivenessSignal) -> Self {
        Self { liveness: Liveness::Active, signal }
    }

    pub fn delisted(signal: LivenessSignal) -> Self {
        Self { liveness: Liveness::Delisted, signal }
    }

    pub fn inconclusive(signal: LivenessSignal) -> Self {
        Self { liveness: Liveness::Inconclusive, signal }
    }

    pub fn is_active(&self) -> bool {
        self.liveness == Liveness::Active
    }
}

/// Aggregated answer of the price sources for one token
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// First source that reported a positive price
    Priced { source: &'static str, price: f64 },
    /// At least one source answered, none with a positive price
    AllZero,
    /// Every source failed (or none was available)
    AllFailed,
}

/// Whether a price reported by a source proves the token is alive
///
/// EVM sources report dust prices for dead pools, so anything below the dust
/// floor counts as zero there.
pub fn is_live_source_price(strategy: LivenessStrategy, price: f64) -> bool {
    match strategy {
        LivenessStrategy::Native => price > 0.0,
        LivenessStrategy::Evm => price >= DUST_PRICE_USD,
    }
}

/// Strategy to verify `snapshot` with, `None` when it cannot be verified
pub fn verification_strategy(snapshot: &TokenSnapshot) -> Option<LivenessStrategy> {
    let strategy = snapshot.chain().policy().liveness?;
    if strategy == LivenessStrategy::Native
        && !NATIVE_ADDRESS_LENGTHS.contains(&snapshot.address().len())
    {
        return None;
    }
    Some(strategy)
}

/// Decide from the snapshot's own feed data alone
pub fn assess_feed(
    snapshot: &TokenSnapshot,
    strategy: LivenessStrategy,
    sensitivity: Sensitivity,
) -> Option<LivenessSignal> {
    let thresholds = LivenessThresholds::for_strategy(strategy, sensitivity);
    let (volume, liquidity, price) = (snapshot.volume_24h, snapshot.liquidity, snapshot.price_usd);
    let has_price = price > 0.0;

    for tier in [FeedTier::Good, FeedTier::Moderate, FeedTier::Acceptable] {
        let price_ok = match (strategy, tier) {
            (LivenessStrategy::Native, FeedTier::Good) => true,
            _ => has_price,
        };
        if price_ok && thresholds.exceeds_good(volume, liquidity, tier.divisor()) {
            return Some(LivenessSignal::FeedMetrics(tier));
        }
    }

    if strategy == LivenessStrategy::Native && price > DUST_PRICE_USD {
        return Some(LivenessSignal::FeedPrice(price));
    }

    None
}

/// Decide once the price sources have been consulted
pub fn classify_sources(
    snapshot: &TokenSnapshot,
    strategy: LivenessStrategy,
    sensitivity: Sensitivity,
    outcome: SourceOutcome,
) -> LivenessVerdict {
    let thresholds = LivenessThresholds::for_strategy(strategy, sensitivity);
    let (volume, liquidity) = (snapshot.volume_24h, snapshot.liquidity);

    match outcome {
        SourceOutcome::Priced { source, price } => {
            LivenessVerdict::active(LivenessSignal::SourcePrice { source, price })
        }
        SourceOutcome::AllZero if thresholds.below_poor(volume, liquidity, 1.0) => {
            LivenessVerdict::delisted(LivenessSignal::ZeroPrice)
        }
        SourceOutcome::AllZero => LivenessVerdict::inconclusive(LivenessSignal::ZeroPrice),
        SourceOutcome::AllFailed if thresholds.below_poor(volume, liquidity, 0.5) => {
            LivenessVerdict::delisted(LivenessSignal::VerificationFailed)
        }
        SourceOutcome::AllFailed => LivenessVerdict::inconclusive(LivenessSignal::VerificationFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOL_ADDR: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn sol(price: f64, volume: f64, liquidity: f64) -> TokenSnapshot {
        TokenSnapshot::new(SOL_ADDR, "solana", "BONK", price, volume, liquidity).unwrap()
    }

    fn eth(price: f64, volume: f64, liquidity: f64) -> TokenSnapshot {
        TokenSnapshot::new("0xabc", "ethereum", "ABC", price, volume, liquidity).unwrap()
    }

    #[test]
    fn test_verification_strategy() {
        assert_eq!(verification_strategy(&eth(1.0, 0.0, 0.0)), Some(LivenessStrategy::Evm));
        assert_eq!(verification_strategy(&sol(1.0, 0.0, 0.0)), Some(LivenessStrategy::Native));

        let short = TokenSnapshot::new("So1", "solana", "S", 1.0, 0.0, 0.0).unwrap();
        assert_eq!(verification_strategy(&short), None);

        let other = TokenSnapshot::new("0xabc", "arbitrum", "A", 1.0, 0.0, 0.0).unwrap();
        assert_eq!(verification_strategy(&other), None);
    }

    #[test]
    fn test_native_good_tier_ignores_price() {
        // moderate native: good 500/1000
        let snap = sol(0.0, 600.0, 1_500.0);
        assert_eq!(
            assess_feed(&snap, LivenessStrategy::Native, Sensitivity::Moderate),
            Some(LivenessSignal::FeedMetrics(FeedTier::Good))
        );
    }

    #[test]
    fn test_evm_good_tier_needs_price() {
        // moderate evm: good 1000/5000; without price no tier applies
        let snap = eth(0.0, 2_000.0, 6_000.0);
        assert_eq!(assess_feed(&snap, LivenessStrategy::Evm, Sensitivity::Moderate), None);

        let snap = eth(0.01, 2_000.0, 6_000.0);
        assert_eq!(
            assess_feed(&snap, LivenessStrategy::Evm, Sensitivity::Moderate),
            Some(LivenessSignal::FeedMetrics(FeedTier::Good))
        );
    }

    #[test]
    fn test_relaxed_tiers() {
        let snap = eth(0.01, 600.0, 3_000.0);
        assert_eq!(
            assess_feed(&snap, LivenessStrategy::Evm, Sensitivity::Moderate),
            Some(LivenessSignal::FeedMetrics(FeedTier::Moderate))
        );
        let snap = eth(0.01, 300.0, 1_300.0);
        assert_eq!(
            assess_feed(&snap, LivenessStrategy::Evm, Sensitivity::Moderate),
            Some(LivenessSignal::FeedMetrics(FeedTier::Acceptable))
        );
        // exactly at the quarter threshold is not "above"
        let snap = eth(0.01, 250.0, 1_250.0);
        assert_eq!(assess_feed(&snap, LivenessStrategy::Evm, Sensitivity::Moderate), None);
    }

    #[test]
    fn test_native_feed_price_fallback() {
        let snap = sol(0.000_01, 1.0, 1.0);
        assert_eq!(
            assess_feed(&snap, LivenessStrategy::Native, Sensitivity::Moderate),
            Some(LivenessSignal::FeedPrice(0.000_01))
        );
        let dust = sol(0.000_000_05, 1.0, 1.0);
        assert_eq!(assess_feed(&dust, LivenessStrategy::Native, Sensitivity::Moderate), None);
        // EVM never trusts the bare feed price
        let snap = eth(0.5, 1.0, 1.0);
        assert_eq!(assess_feed(&snap, LivenessStrategy::Evm, Sensitivity::Moderate), None);
    }

    #[test]
    fn test_source_price_dust() {
        assert!(is_live_source_price(LivenessStrategy::Native, 0.000_000_01));
        assert!(!is_live_source_price(LivenessStrategy::Evm, 0.000_000_01));
        assert!(is_live_source_price(LivenessStrategy::Evm, 0.000_001));
        assert!(!is_live_source_price(LivenessStrategy::Native, 0.0));
    }

    #[test]
    fn test_sources_priced() {
        let verdict = classify_sources(
            &eth(0.0, 0.0, 0.0),
            LivenessStrategy::Evm,
            Sensitivity::Moderate,
            SourceOutcome::Priced { source: "uniswap", price: 0.3 },
        );
        assert!(verdict.is_active());
    }

    #[test]
    fn test_zero_price_poor_metrics_is_delisted() {
        // moderate evm poor: 50/200
        let verdict = classify_sources(
            &eth(0.0, 49.0, 199.0),
            LivenessStrategy::Evm,
            Sensitivity::Moderate,
            SourceOutcome::AllZero,
        );
        assert_eq!(verdict.liveness, Liveness::Delisted);
    }

    #[test]
    fn test_zero_price_decent_metrics_is_inconclusive() {
        let verdict = classify_sources(
            &eth(0.0, 49.0, 200.0),
            LivenessStrategy::Evm,
            Sensitivity::Moderate,
            SourceOutcome::AllZero,
        );
        assert_eq!(verdict.liveness, Liveness::Inconclusive);
        assert_eq!(verdict.signal, LivenessSignal::ZeroPrice);
    }

    #[test]
    fn test_failed_verification_uses_half_poor() {
        // half of 50/200 = 25/100
        let below = classify_sources(
            &eth(0.0, 24.0, 99.0),
            LivenessStrategy::Evm,
            Sensitivity::Moderate,
            SourceOutcome::AllFailed,
        );
        assert_eq!(below.liveness, Liveness::Delisted);

        let poor_but_not_half = classify_sources(
            &eth(0.0, 40.0, 150.0),
            LivenessStrategy::Evm,
            Sensitivity::Moderate,
            SourceOutcome::AllFailed,
        );
        assert_eq!(poor_but_not_half.liveness, Liveness::Inconclusive);
    }
}
