//! Ports Layer - Trait definitions for external collaborators
//!
//! The decision core never talks to the network directly. These traits
//! abstract:
//! - USD price lookups used for liveness verification
//! - The execution venue's tradeability pre-check
//! - The second-opinion verifier guarding delisted-registry writes

pub mod delisting_verifier;
pub mod mocks;
pub mod price_source;
pub mod tradeability;

pub use delisting_verifier::{DelistingVerifier, VerifierError};
pub use price_source::{PriceSource, PriceSourceError};
pub use tradeability::{TradeabilityCheck, TradeabilityError};
