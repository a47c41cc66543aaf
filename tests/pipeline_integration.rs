//! Buy Pipeline Integration Tests
//!
//! Drive the full gate pipeline against on-disk stores and recording fakes:
//! 1. First sighting -> fast path, re-sighting -> momentum
//! 2. Delisting detection, registry persistence and verifier veto
//! 3. Wrapped native asset bypass
//! 4. Price memory persistence and pruning across restarts
//!
//! All tests are deterministic (no real network calls).

use std::path::Path;
use std::time::Duration;

use momentum_gate::application::{AcceptPath, BuySignalPipeline, DelistingDetector, RejectReason};
use momentum_gate::config::Config;
use momentum_gate::domain::{
    ChainClass, DecisionFailure, DelistedTokenRegistry, LivenessSignal, PriceMemoryStore,
    Sensitivity, TokenSnapshot, WRAPPED_NATIVE_ADDRESS,
};
use momentum_gate::ports::mocks::{FakePriceSource, FakeTradeability, FakeVerifier};
use momentum_gate::ports::PriceSource;
use tempfile::tempdir;

const NOW: i64 = 1_700_000_000;

// ============================================================================
// Test Fixtures
// ============================================================================

struct Harness {
    graph: FakePriceSource,
    dexscreener: FakePriceSource,
    venue: FakeTradeability,
    verifier: FakeVerifier,
}

impl Harness {
    fn new(verifier: FakeVerifier) -> Self {
        Self {
            graph: FakePriceSource::new("uniswap-graph", ChainClass::Primary),
            dexscreener: FakePriceSource::new("dexscreener", ChainClass::Primary),
            venue: FakeTradeability::new(),
            verifier,
        }
    }

    fn pipeline(&self, config: &Config, dir: &Path) -> BuySignalPipeline {
        let memory = PriceMemoryStore::open_pruned(
            dir.join("price_memory.json"),
            config.price_memory_prune_secs(),
            NOW,
        );
        let sources: Vec<Box<dyn PriceSource>> =
            vec![Box::new(self.graph.clone()), Box::new(self.dexscreener.clone())];
        let detector = DelistingDetector::new(
            Sensitivity::Moderate,
            Duration::from_millis(100),
            DelistedTokenRegistry::open(dir.join("delisted_tokens.json")),
            sources,
            Box::new(self.verifier.clone()),
        );
        BuySignalPipeline::new(config, memory, Some(detector), Box::new(self.venue.clone()))
    }

    fn source_calls(&self) -> usize {
        self.graph.get_calls().len() + self.dexscreener.get_calls().len()
    }
}

/// The canonical first-sighting token: healthy feed, sentiment above the floor
fn create_abc(price: f64) -> TokenSnapshot {
    TokenSnapshot::new("0xabc", "ethereum", "ABC", price, 20_000.0, 10_000.0)
        .unwrap()
        .with_sentiment(40, 0)
}

/// EVM token whose feed shows almost no trading
fn create_dead_token() -> TokenSnapshot {
    TokenSnapshot::new("0xDeAd00", "ethereum", "DEAD", 0.001, 10.0, 20.0).unwrap()
}

// ============================================================================
// Fast path and momentum
// ============================================================================

#[tokio::test]
async fn test_first_sighting_then_flat_momentum() {
    let dir = tempdir().unwrap();
    let harness = Harness::new(FakeVerifier::confirming());
    let mut pipeline = harness.pipeline(&Config::default(), dir.path());

    assert!(pipeline.evaluate_buy_signal_at(&create_abc(1.00), NOW).await);

    // 0.2% in five minutes against a 0.3% threshold
    let decision = pipeline.evaluate_at(&create_abc(1.002), NOW + 5 * 60).await;
    assert!(!decision.buy());
    assert!(matches!(decision.outcome, Err(RejectReason::InsufficientMomentum(_))));

    // Healthy feed metrics: the detector never escalated to a price source
    assert_eq!(harness.source_calls(), 0);
}

#[tokio::test]
async fn test_zero_depth_never_buys_on_first_sighting() {
    let dir = tempdir().unwrap();
    let harness = Harness::new(FakeVerifier::confirming());
    let mut config = Config::default();
    config.min_volume_24h_for_buy = 0.0;
    config.min_liquidity_usd_for_buy = 0.0;
    config.fastpath_min_volume_24h = 0.0;
    config.fastpath_min_liquidity_usd = 0.0;
    let mut pipeline = BuySignalPipeline::new(
        &config,
        PriceMemoryStore::open(dir.path().join("pm.json"), 3600),
        None,
        Box::new(harness.venue.clone()),
    );

    let empty = TokenSnapshot::new("0xempty", "ethereum", "EMPTY", 1.0, 0.0, 0.0)
        .unwrap()
        .with_sentiment(99, 50);
    assert!(!pipeline.evaluate_buy_signal_at(&empty, NOW).await);
}

#[tokio::test]
async fn test_momentum_survives_restart() {
    let dir = tempdir().unwrap();
    let harness = Harness::new(FakeVerifier::confirming());
    let config = Config::default();

    {
        let mut pipeline = harness.pipeline(&config, dir.path());
        assert!(pipeline.evaluate_buy_signal_at(&create_abc(1.00), NOW).await);
    }

    let mut pipeline = harness.pipeline(&config, dir.path());
    let decision = pipeline.evaluate_at(&create_abc(1.05), NOW + 120).await;
    assert!(matches!(decision.outcome, Ok(AcceptPath::Momentum(_))));
}

#[tokio::test]
async fn test_corrupt_price_memory_is_empty_store() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("price_memory.json"), "{ not json").unwrap();
    let harness = Harness::new(FakeVerifier::confirming());
    let mut pipeline = harness.pipeline(&Config::default(), dir.path());

    let decision = pipeline.evaluate_at(&create_abc(1.00), NOW).await;
    assert_eq!(decision.outcome, Ok(AcceptPath::FastPath));
}

#[tokio::test]
async fn test_out_of_range_timestamp_is_dropped_on_restart() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("price_memory.json"),
        r#"{"0xabc": {"price": 1.0, "ts": -9223372036854775808}}"#,
    )
    .unwrap();
    let harness = Harness::new(FakeVerifier::confirming());
    let mut pipeline = harness.pipeline(&Config::default(), dir.path());

    let decision = pipeline.evaluate_at(&create_abc(1.00), NOW).await;
    assert_eq!(decision.outcome, Ok(AcceptPath::FastPath));
    assert_eq!(pipeline.prune_cache(NOW), 0);
}

#[tokio::test]
async fn test_unwritable_stores_do_not_block_decisions() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let harness = Harness::new(FakeVerifier::confirming());
    let mut pipeline = harness.pipeline(&Config::default(), &blocker);

    let decision = pipeline.evaluate_at(&create_abc(1.00), NOW).await;
    assert_eq!(decision.outcome, Ok(AcceptPath::FastPath));
    assert!(decision.failures.iter().any(|f| matches!(f, DecisionFailure::Storage(_))));

    let decision = pipeline.evaluate_at(&create_dead_token(), NOW).await;
    assert_eq!(decision.outcome, Err(RejectReason::Delisted(LivenessSignal::ZeroPrice)));
    assert!(decision.failures.iter().any(|f| matches!(f, DecisionFailure::Storage(_))));
}

// ============================================================================
// Delisting
// ============================================================================

#[tokio::test]
async fn test_dead_token_is_registered_and_short_circuits() {
    let dir = tempdir().unwrap();
    let harness = Harness::new(FakeVerifier::confirming());
    let mut pipeline = harness.pipeline(&Config::default(), dir.path());

    let decision = pipeline.evaluate_at(&create_dead_token(), NOW).await;
    assert_eq!(decision.outcome, Err(RejectReason::Delisted(LivenessSignal::ZeroPrice)));
    assert_eq!(harness.source_calls(), 2);
    assert_eq!(harness.verifier.get_calls().len(), 1);

    let registry = DelistedTokenRegistry::open(dir.path().join("delisted_tokens.json"));
    assert!(registry.contains("0xdead00"));

    // Second sighting: registry hit, no network at all
    let decision = pipeline.evaluate_at(&create_dead_token(), NOW + 60).await;
    assert_eq!(
        decision.outcome,
        Err(RejectReason::Delisted(LivenessSignal::AlreadyDelisted))
    );
    assert_eq!(harness.source_calls(), 2);
    assert_eq!(harness.verifier.get_calls().len(), 1);
    assert!(harness.venue.get_calls().is_empty());
}

#[tokio::test]
async fn test_verifier_veto_keeps_token_out_of_registry() {
    let dir = tempdir().unwrap();
    let harness = Harness::new(FakeVerifier::vetoing());
    let mut pipeline = harness.pipeline(&Config::default(), dir.path());

    assert!(!pipeline.evaluate_buy_signal_at(&create_dead_token(), NOW).await);
    let registry = DelistedTokenRegistry::open(dir.path().join("delisted_tokens.json"));
    assert!(registry.is_empty());

    // Not registered, so the next sighting escalates again
    assert!(!pipeline.evaluate_buy_signal_at(&create_dead_token(), NOW + 60).await);
    assert_eq!(harness.source_calls(), 4);
}

#[tokio::test]
async fn test_live_fallback_price_keeps_token_active() {
    let dir = tempdir().unwrap();
    let mut harness = Harness::new(FakeVerifier::confirming());
    harness.dexscreener = harness.dexscreener.clone().with_price("0xDeAd00", 0.001);
    let mut pipeline = harness.pipeline(&Config::default(), dir.path());

    // Active, but far below the depth floor
    let decision = pipeline.evaluate_at(&create_dead_token(), NOW).await;
    assert!(matches!(decision.outcome, Err(RejectReason::InsufficientDepth(_))));
    assert!(harness.verifier.get_calls().is_empty());
}

#[tokio::test]
async fn test_hung_sources_are_network_failures() {
    let dir = tempdir().unwrap();
    let mut harness = Harness::new(FakeVerifier::confirming());
    harness.graph = harness.graph.clone().with_delay(Duration::from_secs(5));
    harness.dexscreener = harness.dexscreener.clone().with_delay(Duration::from_secs(5));
    let mut pipeline = harness.pipeline(&Config::default(), dir.path());

    let decision = pipeline.evaluate_at(&create_dead_token(), NOW).await;
    assert_eq!(
        decision.outcome,
        Err(RejectReason::Delisted(LivenessSignal::VerificationFailed))
    );
    let network = decision
        .failures
        .iter()
        .filter(|f| matches!(f, DecisionFailure::Network(_)))
        .count();
    assert_eq!(network, 2);
}

#[tokio::test]
async fn test_disabled_detector_skips_registry() {
    let dir = tempdir().unwrap();
    let mut registry = DelistedTokenRegistry::open(dir.path().join("delisted_tokens.json"));
    registry.insert("0xabc").unwrap();

    let config = Config {
        enable_pre_buy_delisting_check: false,
        ..Config::default()
    };
    let mut pipeline = BuySignalPipeline::new(
        &config,
        PriceMemoryStore::open(dir.path().join("pm.json"), 3600),
        None,
        Box::new(FakeTradeability::new()),
    );
    assert!(pipeline.evaluate_buy_signal_at(&create_abc(1.00), NOW).await);
}

// ============================================================================
// Wrapped native asset
// ============================================================================

#[tokio::test]
async fn test_wrapped_native_bypasses_every_gate() {
    let dir = tempdir().unwrap();
    let harness = Harness::new(FakeVerifier::confirming());
    let mut pipeline = harness.pipeline(&Config::default(), dir.path());

    let weth = TokenSnapshot::new(WRAPPED_NATIVE_ADDRESS, "ethereum", "WETH", 3_100.0, 0.0, 0.0).unwrap();
    assert!(pipeline.evaluate_buy_signal_at(&weth, NOW).await);

    // Falling price inside the window still buys
    let mut cheaper = weth.clone();
    cheaper.price_usd = 3_000.0;
    assert!(pipeline.evaluate_buy_signal_at(&cheaper, NOW + 60).await);
    assert_eq!(harness.source_calls(), 0);
}

// ============================================================================
// Pruning
// ============================================================================

#[tokio::test]
async fn test_prune_is_idempotent() {
    let dir = tempdir().unwrap();
    let harness = Harness::new(FakeVerifier::confirming());
    let mut pipeline = harness.pipeline(&Config::default(), dir.path());

    assert!(pipeline.evaluate_buy_signal_at(&create_abc(1.00), NOW).await);
    let other = TokenSnapshot::new("0xdef", "ethereum", "DEF", 2.0, 20_000.0, 10_000.0)
        .unwrap()
        .with_sentiment(40, 0);
    assert!(pipeline.evaluate_buy_signal_at(&other, NOW + 12 * 3600).await);

    let later = NOW + 25 * 3600;
    assert_eq!(pipeline.prune_cache(later), 1);
    assert_eq!(pipeline.prune_cache(later), 0);
    assert!(pipeline.memory().get("0xabc").is_none());
    assert!(pipeline.memory().get("0xdef").is_some());

    let reopened = PriceMemoryStore::open(dir.path().join("price_memory.json"), 24 * 3600);
    assert_eq!(reopened.len(), 1);
}
