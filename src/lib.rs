//! Momentum Gate - buy-signal decision core for a token-trading bot
//!
//! Given a market-data snapshot of a candidate token, decides whether to buy
//! and which take-profit target to use.
//!
//! # Modules
//!
//! - `domain`: Snapshots, persistent stores and the pure buy gates
//! - `ports`: Trait abstractions (PriceSource, TradeabilityCheck, DelistingVerifier)
//! - `adapters`: External implementations (Raydium, Uniswap subgraph, DexScreener, Jupiter, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Delisting detector and the buy pipeline

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{BuyDecision, BuySignalPipeline};
pub use config::{load_config, Config};
pub use domain::TokenSnapshot;
