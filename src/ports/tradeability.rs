//! Tradeability Port
//!
//! Pre-trade check against the execution venue: can this token be routed at all?

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ChainClass;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeabilityError {
    #[error("Venue request failed: {0}")]
    RequestFailed(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeabilityCheck: Send + Sync {
    /// `Ok(false)` only when the venue positively reports the token as not tradeable
    async fn is_tradeable(&self, address: &str, chain: ChainClass) -> Result<bool, TradeabilityError>;
}
