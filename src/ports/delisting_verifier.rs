//! Delisting Verifier Port
//!
//! Second opinion consulted before an address is written into the delisted
//! registry. The verifier has the final say and may veto the addition.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifierError {
    #[error("Verification request failed: {0}")]
    RequestFailed(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DelistingVerifier: Send + Sync {
    /// `Ok(true)` confirms the token is dead, `Ok(false)` vetoes the addition
    async fn confirm_delisted(&self, address: &str, symbol: &str) -> Result<bool, VerifierError>;
}
