//! Jupiter tradeability pre-check
//!
//! Asks Jupiter for a tiny USDC -> token quote. A token Jupiter cannot route
//! is reported as not tradeable; anything Jupiter does not answer clearly
//! (other 400s, 5xx, transport failures) is left for the caller to pass.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::domain::ChainClass;
use crate::ports::{TradeabilityCheck, TradeabilityError};

pub const JUPITER_QUOTE_API: &str = "https://quote-api.jup.ag/v6/quote";

/// USDC mint, the input side of the probe quote
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// 1 USDC in base units
const PROBE_AMOUNT: u64 = 1_000_000;
const PROBE_SLIPPAGE_BPS: u16 = 100;

/// Jupiter client configuration
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Full URL of the quote endpoint
    pub quote_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            quote_url: JUPITER_QUOTE_API.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JupiterTradeability {
    config: JupiterConfig,
    http: Client,
}

/// Base58 string decoding to a 32-byte public key
pub fn is_valid_mint(address: &str) -> bool {
    bs58::decode(address)
        .into_vec()
        .map(|bytes| bytes.len() == 32)
        .unwrap_or(false)
}

/// Interpret a 200 quote body: any route means tradeable
fn quote_has_route(body: &Value) -> bool {
    let non_empty = |key: &str| match body.get(key) {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    };
    non_empty("data") || non_empty("routePlan")
}

/// Interpret a 400 body: only an explicit "not tradable" is a rejection
fn rejects_as_untradeable(body: &str) -> bool {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_lowercase))
        .unwrap_or_default();
    message.contains("not tradable") || message.contains("not tradeable")
}

impl JupiterTradeability {
    pub fn new() -> Result<Self, TradeabilityError> {
        Self::with_config(JupiterConfig::default())
    }

    pub fn with_config(config: JupiterConfig) -> Result<Self, TradeabilityError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TradeabilityError::RequestFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl TradeabilityCheck for JupiterTradeability {
    async fn is_tradeable(&self, address: &str, chain: ChainClass) -> Result<bool, TradeabilityError> {
        if chain != ChainClass::SecondaryPrimary {
            return Err(TradeabilityError::UnsupportedChain(chain.to_string()));
        }

        if !is_valid_mint(address) {
            tracing::info!(address, "Jupiter pre-check: not a valid mint address");
            return Ok(false);
        }

        let mut req = self.http.get(&self.config.quote_url).query(&[
            ("inputMint", USDC_MINT.to_string()),
            ("outputMint", address.to_string()),
            ("amount", PROBE_AMOUNT.to_string()),
            ("slippageBps", PROBE_SLIPPAGE_BPS.to_string()),
            ("onlyDirectRoutes", "false".to_string()),
        ]);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| TradeabilityError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| TradeabilityError::RequestFailed(format!("unreadable quote: {}", e)))?;
                Ok(quote_has_route(&body))
            }
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                if rejects_as_untradeable(&body) {
                    tracing::info!(address, "Jupiter pre-check: not tradeable");
                    return Ok(false);
                }
                tracing::debug!(address, "Jupiter pre-check: ambiguous 400, allowing");
                Ok(true)
            }
            status => Err(TradeabilityError::RequestFailed(format!("status {}", status))),
        }
    }
}
