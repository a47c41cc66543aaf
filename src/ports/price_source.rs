//! Price Source Port
//!
//! Independent USD price lookups used to verify whether a token still trades.
//! A source either answers (`Ok`, possibly `0.0` when it knows no price for the
//! token) or fails; the delisting detector treats those two cases differently.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::ChainClass;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriceSourceError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected status: {0}")]
    StatusError(u16),

    #[error("Malformed response: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for PriceSourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            PriceSourceError::ParseError(e.to_string())
        } else {
            PriceSourceError::HttpError(e.to_string())
        }
    }
}

/// USD price lookup by token address
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Whether this source can price tokens of `chain`
    fn supports(&self, chain: ChainClass) -> bool;

    /// Current USD price; `Ok(0.0)` means the source has no price for the token
    async fn price_usd(&self, address: &str) -> Result<f64, PriceSourceError>;
}
