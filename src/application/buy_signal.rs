//! Buy Signal Pipeline
//!
//! Ordered gates, each short-circuiting to "no buy":
//!
//! 1. price above the absolute floor
//! 2. delisted registry (no network)
//! 3. tradeability pre-check (native chain, untrusted only)
//! 4. delisting detector
//! 5. market depth
//! 6. price memory lookup and write (always runs once depth passes)
//! 7. momentum against a fresh entry, else the fast path
//!
//! The wrapped native asset short-circuits to "buy" right after step 1.

use chrono::Utc;
use std::fmt;
use thiserror::Error;

use super::delisting_detector::DelistingDetector;
use crate::adapters::jupiter::{JupiterConfig, JupiterTradeability};
use crate::adapters::market_data::{
    DexScreenerClient, DexScreenerLivenessVerifier, DexScreenerPriceSource, RaydiumPriceSource,
    UniswapGraphPriceSource,
};
use crate::config::Config;
use crate::domain::{
    is_wrapped_native, ChainClass, DecisionFailure, DelistedTokenRegistry, DepthShortfall,
    FastPathEvaluator, FastPathMiss, Liveness, LivenessSignal, MarketDepthGate, MomentumEvaluator,
    MomentumVerdict, PriceMemoryStore, TakeProfitCalculator, TokenSnapshot,
};
use crate::ports::{PriceSource, PriceSourceError, TradeabilityCheck, TradeabilityError};

/// Errors building the default collaborators
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Price source setup failed: {0}")]
    PriceSource(#[from] PriceSourceError),

    #[error("Tradeability venue setup failed: {0}")]
    Tradeability(#[from] TradeabilityError),
}

/// Why a snapshot was accepted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcceptPath {
    WrappedNative,
    Momentum(MomentumVerdict),
    FastPath,
}

/// First gate that said no
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    PriceBelowFloor { price: f64, floor: f64 },
    NotTradeable,
    Delisted(LivenessSignal),
    Inconclusive(LivenessSignal),
    InsufficientDepth(DepthShortfall),
    InsufficientMomentum(MomentumVerdict),
    FastPath(FastPathMiss),
}

fn change_and_required(verdict: &MomentumVerdict) -> (f64, f64) {
    match *verdict {
        MomentumVerdict::Sufficient { change, required }
        | MomentumVerdict::DepthOverride { change, required }
        | MomentumVerdict::Insufficient { change, required } => (change * 100.0, required * 100.0),
    }
}

impl fmt::Display for AcceptPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptPath::WrappedNative => write!(f, "wrapped native asset"),
            AcceptPath::Momentum(verdict @ MomentumVerdict::DepthOverride { .. }) => {
                let (change, _) = change_and_required(verdict);
                write!(f, "deep-liquidity override ({:+.2}%)", change)
            }
            AcceptPath::Momentum(verdict) => {
                let (change, required) = change_and_required(verdict);
                write!(f, "momentum {:+.2}% >= {:.2}%", change, required)
            }
            AcceptPath::FastPath => write!(f, "fast path"),
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::PriceBelowFloor { price, floor } => {
                write!(f, "price {} not above floor {}", price, floor)
            }
            RejectReason::NotTradeable => write!(f, "not tradeable"),
            RejectReason::Delisted(signal) => write!(f, "delisted ({})", signal),
            RejectReason::Inconclusive(signal) => write!(f, "liveness inconclusive ({})", signal),
            RejectReason::InsufficientDepth(s) => write!(
                f,
                "depth vol ${:.0}/liq ${:.0} below ${:.0}/${:.0}",
                s.volume_24h, s.liquidity, s.required.min_volume_24h, s.required.min_liquidity_usd
            ),
            RejectReason::InsufficientMomentum(verdict) => {
                let (change, required) = change_and_required(verdict);
                write!(f, "momentum {:+.2}% < {:.2}%", change, required)
            }
            RejectReason::FastPath(FastPathMiss::Volume { have, need }) => {
                write!(f, "fast path volume ${:.0} < ${:.0}", have, need)
            }
            RejectReason::FastPath(FastPathMiss::Liquidity { have, need }) => {
                write!(f, "fast path liquidity ${:.0} < ${:.0}", have, need)
            }
            RejectReason::FastPath(FastPathMiss::Sentiment { score, mentions, need }) => write!(
                f,
                "fast path sentiment {} < {} with {} mentions",
                score, need, mentions
            ),
        }
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct BuyDecision {
    pub outcome: Result<AcceptPath, RejectReason>,
    /// Non-fatal failures met along the way
    pub failures: Vec<DecisionFailure>,
}

impl BuyDecision {
    pub fn buy(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct BuySignalPipeline {
    min_price_usd: f64,
    ttl_secs: i64,
    use_dynamic_tp: bool,
    depth_gate: MarketDepthGate,
    momentum: MomentumEvaluator,
    fast_path: FastPathEvaluator,
    take_profit: TakeProfitCalculator,
    memory: PriceMemoryStore,
    /// `None` when the pre-buy delisting check is disabled
    detector: Option<DelistingDetector>,
    tradeability: Box<dyn TradeabilityCheck>,
}

impl BuySignalPipeline {
    /// Assemble from explicit collaborators
    pub fn new(
        config: &Config,
        memory: PriceMemoryStore,
        detector: Option<DelistingDetector>,
        tradeability: Box<dyn TradeabilityCheck>,
    ) -> Self {
        Self {
            min_price_usd: config.min_price_usd,
            ttl_secs: config.price_memory_ttl_secs(),
            use_dynamic_tp: config.use_dynamic_tp,
            depth_gate: MarketDepthGate::new(config.into()),
            momentum: MomentumEvaluator::new(config.min_momentum_pct),
            fast_path: FastPathEvaluator::new(config.into()),
            take_profit: TakeProfitCalculator::new(config.into()),
            memory,
            detector,
            tradeability,
        }
    }

    /// Assemble with the HTTP collaborators named in `config`
    ///
    /// Opens (and prunes) the price memory at `now`.
    pub fn from_config(config: &Config, now: i64) -> Result<Self, PipelineError> {
        let timeout = config.pre_buy_timeout();
        let memory = PriceMemoryStore::open_pruned(
            config.price_memory_path(),
            config.price_memory_prune_secs(),
            now,
        );

        let detector = if config.enable_pre_buy_delisting_check {
            let dexscreener = DexScreenerClient::new(&config.sources.dexscreener_tokens_url, timeout)?;
            let sources: Vec<Box<dyn PriceSource>> = vec![
                Box::new(RaydiumPriceSource::new(&config.sources.raydium_price_url, timeout)?),
                Box::new(UniswapGraphPriceSource::new(&config.sources.uniswap_graph_url, timeout)?),
                Box::new(DexScreenerPriceSource::new(dexscreener.clone())),
            ];
            Some(DelistingDetector::new(
                config.pre_buy_check_sensitivity,
                timeout,
                DelistedTokenRegistry::open(config.delisted_tokens_path()),
                sources,
                Box::new(DexScreenerLivenessVerifier::new(dexscreener)),
            ))
        } else {
            None
        };

        let tradeability = JupiterTradeability::with_config(JupiterConfig {
            quote_url: config.sources.jupiter_quote_url.clone(),
            api_key: config.jupiter_api_key(),
            timeout,
        })?;

        Ok(Self::new(config, memory, detector, Box::new(tradeability)))
    }

    pub fn memory(&self) -> &PriceMemoryStore {
        &self.memory
    }

    pub fn detector(&self) -> Option<&DelistingDetector> {
        self.detector.as_ref()
    }

    /// Boolean buy signal at the current wall clock
    pub async fn evaluate_buy_signal(&mut self, snapshot: &TokenSnapshot) -> bool {
        self.evaluate(snapshot).await.buy()
    }

    pub async fn evaluate_buy_signal_at(&mut self, snapshot: &TokenSnapshot, now: i64) -> bool {
        self.evaluate_at(snapshot, now).await.buy()
    }

    pub async fn evaluate(&mut self, snapshot: &TokenSnapshot) -> BuyDecision {
        self.evaluate_at(snapshot, Utc::now().timestamp()).await
    }

    /// Run every gate for `snapshot` with `now` as the epoch-seconds clock
    pub async fn evaluate_at(&mut self, snapshot: &TokenSnapshot, now: i64) -> BuyDecision {
        let mut failures = Vec::new();
        let outcome = self.run_gates(snapshot, now, &mut failures).await;

        match &outcome {
            Ok(path) => tracing::info!(
                symbol = %snapshot.symbol,
                address = snapshot.address(),
                "BUY signal: {}",
                path
            ),
            Err(reason) => tracing::info!(
                symbol = %snapshot.symbol,
                address = snapshot.address(),
                "Skip: {}",
                reason
            ),
        }

        BuyDecision { outcome, failures }
    }

    async fn run_gates(
        &mut self,
        snapshot: &TokenSnapshot,
        now: i64,
        failures: &mut Vec<DecisionFailure>,
    ) -> Result<AcceptPath, RejectReason> {
        if snapshot.price_usd <= self.min_price_usd {
            return Err(RejectReason::PriceBelowFloor {
                price: snapshot.price_usd,
                floor: self.min_price_usd,
            });
        }

        if snapshot.chain() == ChainClass::Primary && is_wrapped_native(snapshot.key()) {
            self.remember(snapshot, now, failures);
            return Ok(AcceptPath::WrappedNative);
        }

        if let Some(detector) = &self.detector {
            if detector.is_registered(snapshot.key()) {
                return Err(RejectReason::Delisted(LivenessSignal::AlreadyDelisted));
            }
        }

        if snapshot.chain() == ChainClass::SecondaryPrimary && !snapshot.is_trusted {
            match self.tradeability.is_tradeable(snapshot.address(), snapshot.chain()).await {
                Ok(true) => {}
                Ok(false) => return Err(RejectReason::NotTradeable),
                Err(e) => {
                    tracing::warn!(symbol = %snapshot.symbol, "Tradeability pre-check failed, allowing: {}", e);
                    failures.push(DecisionFailure::Network(e.to_string()));
                }
            }
        }

        if let Some(detector) = self.detector.as_mut() {
            let report = detector.check(snapshot).await;
            failures.extend(report.failures);
            match report.verdict.liveness {
                Liveness::Active => {}
                Liveness::Delisted => return Err(RejectReason::Delisted(report.verdict.signal)),
                Liveness::Inconclusive => return Err(RejectReason::Inconclusive(report.verdict.signal)),
            }
        }

        self.depth_gate
            .check(snapshot)
            .map_err(RejectReason::InsufficientDepth)?;

        let previous = self.memory.get(snapshot.key());
        self.remember(snapshot, now, failures);

        match previous.filter(|entry| entry.is_fresh(now, self.ttl_secs)) {
            Some(entry) => {
                let verdict = self.momentum.evaluate(snapshot, &entry);
                tracing::debug!(
                    symbol = %snapshot.symbol,
                    previous = entry.price,
                    current = snapshot.price_usd,
                    age_secs = entry.age_seconds(now),
                    "Momentum check: {:?}",
                    verdict
                );
                if verdict.passed() {
                    Ok(AcceptPath::Momentum(verdict))
                } else {
                    Err(RejectReason::InsufficientMomentum(verdict))
                }
            }
            None => {
                self.fast_path.evaluate(snapshot).map_err(RejectReason::FastPath)?;
                Ok(AcceptPath::FastPath)
            }
        }
    }

    /// Record the current price; a failed write never aborts the evaluation
    fn remember(&mut self, snapshot: &TokenSnapshot, now: i64, failures: &mut Vec<DecisionFailure>) {
        if let Err(e) = self.memory.put(snapshot.key(), snapshot.price_usd, now) {
            tracing::warn!(symbol = %snapshot.symbol, "Failed to persist price memory: {}", e);
            failures.push(DecisionFailure::Storage(e));
        }
    }

    /// Take-profit ratio for a bought token
    ///
    /// Flat `take_profit` unless dynamic take profit is enabled.
    pub fn compute_take_profit(&self, snapshot: &TokenSnapshot) -> f64 {
        if self.use_dynamic_tp {
            self.take_profit.for_snapshot(snapshot)
        } else {
            self.take_profit.bounds().base
        }
    }

    /// Drop expired price memory entries, returning how many were removed
    pub fn prune_cache(&mut self, now: i64) -> usize {
        self.memory.prune(now)
    }
}
