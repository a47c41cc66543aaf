//! Momentum Evaluator
//!
//! Compares the current price against the last cached observation for the
//! same address. Two named exceptions sit next to the threshold check:
//! the primary chain's wrapped native asset always passes, and deep native
//! chain pools may pass on flat momentum.

use super::chain::ChainClass;
use super::price_memory::PriceMemoryEntry;
use super::token::TokenSnapshot;

/// Wrapped native asset of the primary chain (WETH), lower-cased
pub const WRAPPED_NATIVE_ADDRESS: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

/// Minimum momentum threshold a trusted token can be relaxed to
pub const TRUSTED_MOMENTUM_FLOOR: f64 = 0.003;

const TRUSTED_MOMENTUM_FACTOR: f64 = 0.5;

/// Deep-liquidity override for the native chain
pub const NATIVE_OVERRIDE_MIN_VOLUME: f64 = 10_000.0;
pub const NATIVE_OVERRIDE_MIN_LIQUIDITY: f64 = 50_000.0;

/// Fractional change from `previous` to `current`; 0 when `previous <= 0`
pub fn pct_change(current: f64, previous: f64) -> f64 {
    if previous <= 0.0 {
        return 0.0;
    }
    (current - previous) / previous
}

/// Whether `address` is the primary chain's wrapped native asset
pub fn is_wrapped_native(address: &str) -> bool {
    address.eq_ignore_ascii_case(WRAPPED_NATIVE_ADDRESS)
}

/// Outcome of a momentum check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MomentumVerdict {
    /// Change met the threshold
    Sufficient { change: f64, required: f64 },
    /// Change fell short but the native-chain depth override applied
    DepthOverride { change: f64, required: f64 },
    /// Change fell short
    Insufficient { change: f64, required: f64 },
}

impl MomentumVerdict {
    pub fn passed(&self) -> bool {
        !matches!(self, MomentumVerdict::Insufficient { .. })
    }
}

#[derive(Debug, Clone)]
pub struct MomentumEvaluator {
    base_threshold: f64,
}

impl MomentumEvaluator {
    pub fn new(min_momentum_pct: f64) -> Self {
        Self {
            base_threshold: min_momentum_pct,
        }
    }

    /// Required fractional change for a chain class and trust flag
    pub fn threshold_for(&self, chain: ChainClass, trusted: bool) -> f64 {
        let mut required = self.base_threshold;
        if trusted {
            required = (required * TRUSTED_MOMENTUM_FACTOR).max(TRUSTED_MOMENTUM_FLOOR);
        }
        match chain.policy().momentum {
            Some(scale) => scale.apply(required),
            None => required,
        }
    }

    /// Evaluate `snapshot` against a fresh cached `previous` entry
    pub fn evaluate(&self, snapshot: &TokenSnapshot, previous: &PriceMemoryEntry) -> MomentumVerdict {
        let change = pct_change(snapshot.price_usd, previous.price);
        let required = self.threshold_for(snapshot.chain(), snapshot.is_trusted);

        if change >= required {
            return MomentumVerdict::Sufficient { change, required };
        }

        if snapshot.chain() == ChainClass::SecondaryPrimary
            && snapshot.volume_24h >= NATIVE_OVERRIDE_MIN_VOLUME
            && snapshot.liquidity >= NATIVE_OVERRIDE_MIN_LIQUIDITY
        {
            return MomentumVerdict::DepthOverride { change, required };
        }

        MomentumVerdict::Insufficient { change, required }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn entry(price: f64) -> PriceMemoryEntry {
        PriceMemoryEntry { price, observed_at: 0 }
    }

    #[test]
    fn test_pct_change() {
        assert_relative_eq!(pct_change(1.1, 1.0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(pct_change(0.9, 1.0), -0.1, epsilon = 1e-12);
        assert_eq!(pct_change(5.0, 0.0), 0.0);
        assert_eq!(pct_change(5.0, -1.0), 0.0);
    }

    #[test]
    fn test_thresholds() {
        let eval = MomentumEvaluator::new(0.01);
        assert_relative_eq!(eval.threshold_for(ChainClass::Primary, false), 0.01, epsilon = 1e-12);
        assert_relative_eq!(eval.threshold_for(ChainClass::Primary, true), 0.005, epsilon = 1e-12);
        // 0.01 * 0.05 = 0.0005
        assert_relative_eq!(eval.threshold_for(ChainClass::Other, false), 0.0005, epsilon = 1e-12);
        // trusted floor 0.003 first, then 5%
        let low = MomentumEvaluator::new(0.003);
        assert_relative_eq!(low.threshold_for(ChainClass::Primary, true), 0.003, epsilon = 1e-12);
        assert_relative_eq!(low.threshold_for(ChainClass::SecondaryPrimary, true), 0.00015, epsilon = 1e-12);
        // native floor
        let tiny = MomentumEvaluator::new(0.0001);
        assert_relative_eq!(tiny.threshold_for(ChainClass::SecondaryPrimary, false), 0.0001, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_on_primary() {
        let eval = MomentumEvaluator::new(0.003);
        let snap = TokenSnapshot::new("0xabc", "ethereum", "A", 1.002, 20_000.0, 10_000.0).unwrap();
        let verdict = eval.evaluate(&snap, &entry(1.0));
        assert!(matches!(verdict, MomentumVerdict::Insufficient { .. }));
        assert!(!verdict.passed());
    }

    #[test]
    fn test_sufficient() {
        let eval = MomentumEvaluator::new(0.003);
        let snap = TokenSnapshot::new("0xabc", "ethereum", "A", 1.01, 20_000.0, 10_000.0).unwrap();
        assert!(matches!(eval.evaluate(&snap, &entry(1.0)), MomentumVerdict::Sufficient { .. }));
    }

    #[test]
    fn test_native_depth_override() {
        let eval = MomentumEvaluator::new(0.003);
        let deep = TokenSnapshot::new("So1", "solana", "A", 0.9, 10_000.0, 50_000.0).unwrap();
        assert!(matches!(eval.evaluate(&deep, &entry(1.0)), MomentumVerdict::DepthOverride { .. }));

        let shallow = TokenSnapshot::new("So1", "solana", "A", 0.9, 10_000.0, 49_999.0).unwrap();
        assert!(!eval.evaluate(&shallow, &entry(1.0)).passed());

        // Override is native-chain only
        let other = TokenSnapshot::new("0x1", "base", "A", 0.9, 1e6, 1e6).unwrap();
        assert!(!eval.evaluate(&other, &entry(1.0)).passed());
    }

    #[test]
    fn test_zero_previous_price_is_zero_momentum() {
        let eval = MomentumEvaluator::new(0.003);
        let snap = TokenSnapshot::new("0xabc", "ethereum", "A", 2.0, 20_000.0, 10_000.0).unwrap();
        match eval.evaluate(&snap, &entry(0.0)) {
            MomentumVerdict::Insufficient { change, .. } => assert_eq!(change, 0.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wrapped_native() {
        assert!(is_wrapped_native("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"));
        assert!(!is_wrapped_native("0xabc"));
    }
}
