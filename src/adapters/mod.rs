//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Jupiter: tradeability pre-check against the native-chain aggregator
//! - Market Data: price sources and the DexScreener liveness verifier
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod jupiter;
pub mod market_data;

pub use cli::CliApp;
pub use jupiter::JupiterTradeability;
pub use market_data::{
    DexScreenerClient, DexScreenerLivenessVerifier, DexScreenerPriceSource, RaydiumPriceSource,
    UniswapGraphPriceSource,
};
