//! Failure taxonomy for the buy decision
//!
//! Nothing here is ever surfaced to the caller as fatal. Each failure is
//! classified, logged and folded into a `false` decision (or a skipped write).

use thiserror::Error;

use super::price_memory::StorageError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecisionFailure {
    /// Persisted state could not be read or written
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    /// A collaborator timed out, errored or answered garbage
    #[error("Network failure: {0}")]
    Network(String),

    /// Not enough signal to classify the token either way
    #[error("Ambiguous signal: {0}")]
    Ambiguous(String),
}
