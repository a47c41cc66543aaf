//! DexScreener token pairs API
//!
//! One client, two roles: a fallback EVM price source and the liveness
//! verifier consulted before a token is written into the delisted registry.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{check_status, http_client, request_error};
use crate::domain::ChainClass;
use crate::ports::{DelistingVerifier, PriceSource, PriceSourceError, VerifierError};

pub const DEXSCREENER_TOKENS_API: &str = "https://api.dexscreener.com/latest/dex/tokens";

/// Quote symbols whose pairs give the most direct USD price
const STABLE_QUOTES: [&str; 2] = ["USDC", "USDT"];

/// A pair counts as live above both of these
const ACTIVE_PAIR_MIN_VOLUME: f64 = 100.0;
const ACTIVE_PAIR_MIN_LIQUIDITY: f64 = 500.0;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DexScreenerResponse {
    #[serde(default)]
    pub pairs: Option<Vec<TokenPair>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub quote_token: Option<QuoteToken>,
    #[serde(default)]
    pub volume: Option<PairVolume>,
    #[serde(default)]
    pub liquidity: Option<PairLiquidity>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuoteToken {
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PairVolume {
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PairLiquidity {
    #[serde(default)]
    pub usd: Option<f64>,
}

impl TokenPair {
    fn price(&self) -> f64 {
        self.price_usd
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    fn is_stable_quoted(&self) -> bool {
        self.quote_token
            .as_ref()
            .and_then(|q| q.symbol.as_deref())
            .map(|s| STABLE_QUOTES.contains(&s.to_ascii_uppercase().as_str()))
            .unwrap_or(false)
    }

    fn volume_24h(&self) -> f64 {
        self.volume.as_ref().and_then(|v| v.h24).unwrap_or(0.0)
    }

    fn liquidity_usd(&self) -> f64 {
        self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0)
    }

    fn is_active(&self) -> bool {
        self.volume_24h() > ACTIVE_PAIR_MIN_VOLUME && self.liquidity_usd() > ACTIVE_PAIR_MIN_LIQUIDITY
    }
}

impl DexScreenerResponse {
    fn pairs(&self) -> &[TokenPair] {
        self.pairs.as_deref().unwrap_or(&[])
    }

    /// First stable-quoted pair with a price, else any pair with a price, else 0
    pub fn best_price(&self) -> f64 {
        let pairs = self.pairs();
        pairs
            .iter()
            .filter(|p| p.is_stable_quoted())
            .map(TokenPair::price)
            .find(|p| *p > 0.0)
            .or_else(|| pairs.iter().map(TokenPair::price).find(|p| *p > 0.0))
            .unwrap_or(0.0)
    }

    /// Whether any pair still shows real trading
    pub fn has_active_pair(&self) -> bool {
        self.pairs().iter().any(TokenPair::is_active)
    }
}

#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    http: Client,
    api_url: String,
    timeout: Duration,
}

impl DexScreenerClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, PriceSourceError> {
        Ok(Self {
            http: http_client(timeout)?,
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// All pairs DexScreener knows for `address`
    pub async fn token_pairs(&self, address: &str) -> Result<DexScreenerResponse, PriceSourceError> {
        let url = format!("{}/{}", self.api_url, address);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;
        check_status(&response)?;
        Ok(response.json().await?)
    }
}

/// Fallback EVM price source
#[derive(Debug, Clone)]
pub struct DexScreenerPriceSource {
    client: DexScreenerClient,
}

impl DexScreenerPriceSource {
    pub fn new(client: DexScreenerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceSource for DexScreenerPriceSource {
    fn name(&self) -> &'static str {
        "dexscreener"
    }

    fn supports(&self, chain: ChainClass) -> bool {
        chain == ChainClass::Primary
    }

    async fn price_usd(&self, address: &str) -> Result<f64, PriceSourceError> {
        Ok(self.client.token_pairs(address).await?.best_price())
    }
}

/// Confirms a delisting unless DexScreener still lists an active pair
#[derive(Debug, Clone)]
pub struct DexScreenerLivenessVerifier {
    client: DexScreenerClient,
}

impl DexScreenerLivenessVerifier {
    pub fn new(client: DexScreenerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DelistingVerifier for DexScreenerLivenessVerifier {
    async fn confirm_delisted(&self, address: &str, symbol: &str) -> Result<bool, VerifierError> {
        let response = self
            .client
            .token_pairs(address)
            .await
            .map_err(|e| VerifierError::RequestFailed(e.to_string()))?;

        if response.has_active_pair() {
            tracing::info!(symbol, "DexScreener still shows an active pair");
            return Ok(false);
        }
        Ok(true)
    }
}
