//! Market Data Adapters
//!
//! Price sources consulted by the delisting detector, plus the DexScreener
//! liveness verifier guarding registry writes:
//! - `RaydiumPriceSource`: native chain prices
//! - `UniswapGraphPriceSource`: EVM prices from the Uniswap v3 subgraph
//! - `DexScreenerPriceSource`: EVM fallback, prefers stablecoin-quoted pairs
//! - `DexScreenerLivenessVerifier`: vetoes delisting of tokens with live pairs

mod dexscreener;
mod raydium;
mod uniswap_graph;

pub use dexscreener::{
    DexScreenerClient, DexScreenerLivenessVerifier, DexScreenerPriceSource, DexScreenerResponse,
    TokenPair, DEXSCREENER_TOKENS_API,
};
pub use raydium::{RaydiumPriceSource, RAYDIUM_PRICE_API};
pub use uniswap_graph::{UniswapGraphPriceSource, UNISWAP_V3_SUBGRAPH};

use reqwest::Client;
use std::time::Duration;

use crate::ports::PriceSourceError;

/// Shared HTTP client construction for every market data adapter
pub(crate) fn http_client(timeout: Duration) -> Result<Client, PriceSourceError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("momentum-gate/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PriceSourceError::HttpError(format!("Failed to create HTTP client: {}", e)))
}

/// Transport error, keeping the configured deadline when the request timed out
pub(crate) fn request_error(e: reqwest::Error, timeout: Duration) -> PriceSourceError {
    if e.is_timeout() {
        PriceSourceError::Timeout(timeout)
    } else {
        e.into()
    }
}

/// Reject non-success statuses before touching the body
pub(crate) fn check_status(response: &reqwest::Response) -> Result<(), PriceSourceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(PriceSourceError::StatusError(status.as_u16()));
    }
    Ok(())
}
