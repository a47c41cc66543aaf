//! Fast-Path Evaluator
//!
//! First-sighting heuristic used when no fresh cached price exists: accept on
//! absolute depth plus (for untrusted primary-chain tokens) a sentiment signal.
//! Depth must be strictly positive whatever the configured thresholds are.

use super::token::TokenSnapshot;

/// Mention count that substitutes for a sentiment score
pub const FAST_PATH_MIN_MENTIONS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastPathThresholds {
    pub min_volume_24h: f64,
    pub min_liquidity_usd: f64,
    pub min_sentiment_score: i64,
}

/// Which fast-path requirement failed first
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FastPathMiss {
    Volume { have: f64, need: f64 },
    Liquidity { have: f64, need: f64 },
    Sentiment { score: i64, mentions: i64, need: i64 },
}

#[derive(Debug, Clone)]
pub struct FastPathEvaluator {
    thresholds: FastPathThresholds,
}

impl FastPathEvaluator {
    pub fn new(thresholds: FastPathThresholds) -> Self {
        Self { thresholds }
    }

    /// Evaluate a first-seen snapshot
    pub fn evaluate(&self, snapshot: &TokenSnapshot) -> Result<(), FastPathMiss> {
        let policy = snapshot.chain().policy();
        let need_volume = self.thresholds.min_volume_24h * policy.fast_path_volume_factor;
        let need_liquidity = self.thresholds.min_liquidity_usd * policy.fast_path_liquidity_factor;

        if snapshot.volume_24h <= 0.0 || snapshot.volume_24h < need_volume {
            return Err(FastPathMiss::Volume {
                have: snapshot.volume_24h,
                need: need_volume,
            });
        }
        if snapshot.liquidity <= 0.0 || snapshot.liquidity < need_liquidity {
            return Err(FastPathMiss::Liquidity {
                have: snapshot.liquidity,
                need: need_liquidity,
            });
        }

        if policy.fast_path_requires_sentiment && !snapshot.is_trusted {
            let need = self.thresholds.min_sentiment_score;
            if snapshot.sentiment_score < need && snapshot.sentiment_mentions < FAST_PATH_MIN_MENTIONS {
                return Err(FastPathMiss::Sentiment {
                    score: snapshot.sentiment_score,
                    mentions: snapshot.sentiment_mentions,
                    need,
                });
            }
        }

        Ok(())
    }
}
