//! Recording fakes for the ports
//!
//! Each fake records every call and answers from a canned table. Clones share
//! their call log, so a test can hand one clone to the pipeline and inspect
//! the other afterwards.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::delisting_verifier::{DelistingVerifier, VerifierError};
use super::price_source::{PriceSource, PriceSourceError};
use super::tradeability::{TradeabilityCheck, TradeabilityError};
use crate::domain::ChainClass;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fake price source answering per address, with a fallback answer
#[derive(Debug, Clone)]
pub struct FakePriceSource {
    name: &'static str,
    chains: Vec<ChainClass>,
    responses: Arc<Mutex<HashMap<String, Result<f64, PriceSourceError>>>>,
    fallback: Result<f64, PriceSourceError>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakePriceSource {
    /// A source for `chain` that answers `0.0` for unknown addresses
    pub fn new(name: &'static str, chain: ChainClass) -> Self {
        Self {
            name,
            chains: vec![chain],
            responses: Arc::default(),
            fallback: Ok(0.0),
            delay: None,
            calls: Arc::default(),
        }
    }

    pub fn with_price(self, address: &str, price: f64) -> Self {
        lock(&self.responses).insert(address.to_lowercase(), Ok(price));
        self
    }

    pub fn with_error(self, address: &str, error: PriceSourceError) -> Self {
        lock(&self.responses).insert(address.to_lowercase(), Err(error));
        self
    }

    /// Answer for addresses without a canned response
    pub fn with_fallback(mut self, answer: Result<f64, PriceSourceError>) -> Self {
        self.fallback = answer;
        self
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl PriceSource for FakePriceSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, chain: ChainClass) -> bool {
        self.chains.contains(&chain)
    }

    async fn price_usd(&self, address: &str) -> Result<f64, PriceSourceError> {
        lock(&self.calls).push(address.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.responses)
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Fake tradeability venue, tradeable unless told otherwise
#[derive(Debug, Clone, Default)]
pub struct FakeTradeability {
    responses: Arc<Mutex<HashMap<String, Result<bool, TradeabilityError>>>>,
    calls: Arc<Mutex<Vec<(String, ChainClass)>>>,
}

impl FakeTradeability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, address: &str, answer: Result<bool, TradeabilityError>) -> Self {
        lock(&self.responses).insert(address.to_lowercase(), answer);
        self
    }

    pub fn get_calls(&self) -> Vec<(String, ChainClass)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl TradeabilityCheck for FakeTradeability {
    async fn is_tradeable(&self, address: &str, chain: ChainClass) -> Result<bool, TradeabilityError> {
        lock(&self.calls).push((address.to_string(), chain));
        lock(&self.responses)
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or(Ok(true))
    }
}

/// Fake registry verifier giving the same answer for every address
#[derive(Debug, Clone)]
pub struct FakeVerifier {
    answer: Result<bool, VerifierError>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeVerifier {
    /// Confirms every addition
    pub fn confirming() -> Self {
        Self::answering(Ok(true))
    }

    /// Vetoes every addition
    pub fn vetoing() -> Self {
        Self::answering(Ok(false))
    }

    pub fn answering(answer: Result<bool, VerifierError>) -> Self {
        Self {
            answer,
            calls: Arc::default(),
        }
    }

    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl DelistingVerifier for FakeVerifier {
    async fn confirm_delisted(&self, address: &str, _symbol: &str) -> Result<bool, VerifierError> {
        lock(&self.calls).push(address.to_string());
        self.answer.clone()
    }
}
