//! Take Profit Calculator
//!
//! Bounded take-profit ratio from sentiment and volume tiers. Pure, no I/O.

use super::token::TokenSnapshot;

pub const SENTIMENT_BONUS: f64 = 0.15;
pub const SENTIMENT_PENALTY: f64 = 0.10;
pub const VOLUME_BONUS: f64 = 0.10;
pub const VOLUME_PENALTY: f64 = 0.10;

const HOT_SENTIMENT_SCORE: i64 = 75;
const HOT_MENTIONS: i64 = 10;
const COLD_SENTIMENT_SCORE: i64 = 50;
const COLD_MENTIONS: i64 = 3;
const HIGH_VOLUME: f64 = 200_000.0;
const LOW_VOLUME: f64 = 20_000.0;

/// Base ratio and clamp bounds (0.5 = +50%)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TakeProfitBounds {
    pub base: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone)]
pub struct TakeProfitCalculator {
    bounds: TakeProfitBounds,
}

impl TakeProfitCalculator {
    pub fn new(bounds: TakeProfitBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> TakeProfitBounds {
        self.bounds
    }

    /// Take-profit ratio for raw sentiment/volume figures, clamped to `[min, max]`
    pub fn calculate(&self, sentiment_score: i64, mentions: i64, volume_24h: f64) -> f64 {
        let mut tp = self.bounds.base;

        if sentiment_score >= HOT_SENTIMENT_SCORE || mentions >= HOT_MENTIONS {
            tp += SENTIMENT_BONUS;
        } else if sentiment_score <= COLD_SENTIMENT_SCORE && mentions < COLD_MENTIONS {
            tp -= SENTIMENT_PENALTY;
        }

        if volume_24h >= HIGH_VOLUME {
            tp += VOLUME_BONUS;
        } else if volume_24h < LOW_VOLUME {
            tp -= VOLUME_PENALTY;
        }

        tp.max(self.bounds.min).min(self.bounds.max)
    }

    pub fn for_snapshot(&self, snapshot: &TokenSnapshot) -> f64 {
        self.calculate(
            snapshot.sentiment_score,
            snapshot.sentiment_mentions,
            snapshot.volume_24h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn calc() -> TakeProfitCalculator {
        TakeProfitCalculator::new(TakeProfitBounds {
            base: 0.5,
            min: 0.2,
            max: 1.0,
        })
    }

    #[test]
    fn test_neutral_mid_volume() {
        // score 60 is between the tiers, volume between the tiers
        assert_relative_eq!(calc().calculate(60, 0, 50_000.0), 0.5);
    }

    #[test]
    fn test_hot_and_deep() {
        assert_relative_eq!(calc().calculate(80, 0, 250_000.0), 0.75, epsilon = 1e-12);
        assert_relative_eq!(calc().calculate(0, 10, 250_000.0), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_cold_and_thin() {
        assert_relative_eq!(calc().calculate(50, 2, 19_999.0), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_cold_score_with_mentions_is_neutral() {
        assert_relative_eq!(calc().calculate(10, 3, 50_000.0), 0.5);
    }

    #[test]
    fn test_clamped() {
        let tight = TakeProfitCalculator::new(TakeProfitBounds {
            base: 0.9,
            min: 0.2,
            max: 1.0,
        });
        assert_relative_eq!(tight.calculate(99, 50, 1e9), 1.0);

        let floor = TakeProfitCalculator::new(TakeProfitBounds {
            base: 0.25,
            min: 0.2,
            max: 1.0,
        });
        assert_relative_eq!(floor.calculate(0, 0, 0.0), 0.2);
    }

    #[test]
    fn test_always_within_bounds() {
        let c = calc();
        for score in [-10, 0, 50, 51, 74, 75, 100] {
            for mentions in [0, 2, 3, 9, 10, 100] {
                for volume in [0.0, 19_999.0, 20_000.0, 199_999.0, 200_000.0, 1e12] {
                    let tp = c.calculate(score, mentions, volume);
                    assert!((0.2..=1.0).contains(&tp), "tp {} out of bounds", tp);
                }
            }
        }
    }
}
