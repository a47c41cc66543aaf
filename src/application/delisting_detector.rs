//! Delisting Detector
//!
//! Runs the liveness protocol for one snapshot: registry lookup, feed metrics,
//! then escalation to the price sources. A `Delisted` verdict is written into
//! the registry once the verifier agrees (or cannot be reached).

use std::time::Duration;

use crate::domain::liveness::{self, is_live_source_price};
use crate::domain::{
    DecisionFailure, DelistedTokenRegistry, Liveness, LivenessSignal, LivenessStrategy,
    LivenessVerdict, Sensitivity, SourceOutcome, TokenSnapshot,
};
use crate::ports::{DelistingVerifier, PriceSource, PriceSourceError};

/// Verdict plus the non-fatal failures met on the way
#[derive(Debug, Clone, PartialEq)]
pub struct LivenessReport {
    pub verdict: LivenessVerdict,
    pub failures: Vec<DecisionFailure>,
}

impl LivenessReport {
    fn new(verdict: LivenessVerdict) -> Self {
        Self {
            verdict,
            failures: Vec::new(),
        }
    }
}

pub struct DelistingDetector {
    sensitivity: Sensitivity,
    timeout: Duration,
    registry: DelistedTokenRegistry,
    sources: Vec<Box<dyn PriceSource>>,
    verifier: Box<dyn DelistingVerifier>,
}

impl DelistingDetector {
    /// `sources` are consulted in the given order, filtered by chain support
    pub fn new(
        sensitivity: Sensitivity,
        timeout: Duration,
        registry: DelistedTokenRegistry,
        sources: Vec<Box<dyn PriceSource>>,
        verifier: Box<dyn DelistingVerifier>,
    ) -> Self {
        Self {
            sensitivity,
            timeout,
            registry,
            sources,
            verifier,
        }
    }

    pub fn registry(&self) -> &DelistedTokenRegistry {
        &self.registry
    }

    /// Registry lookup only, no network
    pub fn is_registered(&self, address: &str) -> bool {
        self.registry.contains(address)
    }

    /// Classify `snapshot`, persisting a `Delisted` verdict
    pub async fn check(&mut self, snapshot: &TokenSnapshot) -> LivenessReport {
        if self.registry.contains(snapshot.key()) {
            tracing::info!(symbol = %snapshot.symbol, "Pre-buy check: already in delisted registry");
            return LivenessReport::new(LivenessVerdict::delisted(LivenessSignal::AlreadyDelisted));
        }

        let Some(strategy) = liveness::verification_strategy(snapshot) else {
            tracing::debug!(
                symbol = %snapshot.symbol,
                chain = snapshot.chain_id(),
                "Pre-buy check skipped: no verification strategy"
            );
            return LivenessReport::new(LivenessVerdict::active(LivenessSignal::NotVerifiable));
        };

        if let Some(signal) = liveness::assess_feed(snapshot, strategy, self.sensitivity) {
            tracing::debug!(symbol = %snapshot.symbol, "Pre-buy check: trusting feed ({})", signal);
            return LivenessReport::new(LivenessVerdict::active(signal));
        }

        let mut failures = Vec::new();
        let outcome = self.query_sources(snapshot, strategy, &mut failures).await;
        let verdict = liveness::classify_sources(snapshot, strategy, self.sensitivity, outcome);

        match verdict.liveness {
            Liveness::Active => {
                tracing::info!(symbol = %snapshot.symbol, "Pre-buy check passed: {}", verdict.signal);
            }
            Liveness::Inconclusive => {
                tracing::warn!(
                    symbol = %snapshot.symbol,
                    volume = snapshot.volume_24h,
                    liquidity = snapshot.liquidity,
                    "Pre-buy check inconclusive ({}), skipping without blacklisting",
                    verdict.signal
                );
                failures.push(DecisionFailure::Ambiguous(verdict.signal.to_string()));
            }
            Liveness::Delisted => {
                tracing::warn!(
                    symbol = %snapshot.symbol,
                    volume = snapshot.volume_24h,
                    liquidity = snapshot.liquidity,
                    "Pre-buy check: token looks delisted ({})",
                    verdict.signal
                );
                self.record_delisted(snapshot, &mut failures).await;
            }
        }

        LivenessReport { verdict, failures }
    }

    async fn query_sources(
        &self,
        snapshot: &TokenSnapshot,
        strategy: LivenessStrategy,
        failures: &mut Vec<DecisionFailure>,
    ) -> SourceOutcome {
        let mut answered = false;

        for source in self.sources.iter().filter(|s| s.supports(snapshot.chain())) {
            match tokio::time::timeout(self.timeout, source.price_usd(snapshot.address())).await {
                Ok(Ok(price)) if is_live_source_price(strategy, price) => {
                    return SourceOutcome::Priced {
                        source: source.name(),
                        price,
                    };
                }
                Ok(Ok(price)) => {
                    tracing::debug!(source = source.name(), price, "No usable price");
                    answered = true;
                }
                Ok(Err(e)) => {
                    tracing::warn!(source = source.name(), "Price lookup failed: {}", e);
                    failures.push(DecisionFailure::Network(format!("{}: {}", source.name(), e)));
                }
                Err(_) => {
                    let e = PriceSourceError::Timeout(self.timeout);
                    tracing::warn!(source = source.name(), "Price lookup failed: {}", e);
                    failures.push(DecisionFailure::Network(format!("{}: {}", source.name(), e)));
                }
            }
        }

        if answered {
            SourceOutcome::AllZero
        } else {
            SourceOutcome::AllFailed
        }
    }

    async fn record_delisted(&mut self, snapshot: &TokenSnapshot, failures: &mut Vec<DecisionFailure>) {
        let confirmed = tokio::time::timeout(
            self.timeout,
            self.verifier.confirm_delisted(snapshot.address(), &snapshot.symbol),
        )
        .await;

        match confirmed {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                tracing::info!(symbol = %snapshot.symbol, "Verifier vetoed delisting, not persisted");
                return;
            }
            Ok(Err(e)) => {
                tracing::warn!("Delisting verifier failed, recording directly: {}", e);
                failures.push(DecisionFailure::Network(e.to_string()));
            }
            Err(_) => {
                tracing::warn!("Delisting verifier timed out, recording directly");
                failures.push(DecisionFailure::Network(format!(
                    "verifier timed out after {:?}",
                    self.timeout
                )));
            }
        }

        match self.registry.insert(snapshot.key()) {
            Ok(_) => tracing::info!(symbol = %snapshot.symbol, address = snapshot.key(), "Added to delisted registry"),
            Err(e) => {
                tracing::warn!("Failed to persist delisting: {}", e);
                failures.push(DecisionFailure::Storage(e));
            }
        }
    }
}
