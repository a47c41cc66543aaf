//! Jupiter Adapter
//!
//! Implementation of the TradeabilityCheck port against the Jupiter DEX
//! aggregator quote API.

mod tradeability;

pub use tradeability::{is_valid_mint, JupiterConfig, JupiterTradeability, JUPITER_QUOTE_API, USDC_MINT};
