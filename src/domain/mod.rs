//! Domain Layer - Buy decision rules
//!
//! Pure types and rules with no network access. Collaborators (price sources,
//! the tradeability venue, the registry verifier) are reached through `ports`.
//!
//! - `token`: validated market-data snapshot
//! - `chain`: chain classes and their threshold tables
//! - `price_memory`: persistent last-price cache
//! - `delisted_registry`: persistent set of dead tokens
//! - `liveness`: delisting classification rules
//! - `market_depth`, `momentum`, `fast_path`: buy gates
//! - `take_profit`: dynamic take-profit ratio

pub mod chain;
pub mod delisted_registry;
pub mod error;
pub mod fast_path;
pub mod liveness;
pub mod market_depth;
pub mod momentum;
pub mod price_memory;
pub mod take_profit;
pub mod token;

pub use chain::{ChainClass, ChainPolicy, FlooredScale, LivenessStrategy, LivenessThresholds, Sensitivity};
pub use delisted_registry::DelistedTokenRegistry;
pub use error::DecisionFailure;
pub use fast_path::{FastPathEvaluator, FastPathMiss, FastPathThresholds};
pub use liveness::{Liveness, LivenessSignal, LivenessVerdict, SourceOutcome};
pub use market_depth::{DepthShortfall, DepthThresholds, MarketDepthGate};
pub use momentum::{is_wrapped_native, pct_change, MomentumEvaluator, MomentumVerdict, WRAPPED_NATIVE_ADDRESS};
pub use price_memory::{PriceMemoryEntry, PriceMemoryStore, StorageError};
pub use take_profit::{TakeProfitBounds, TakeProfitCalculator};
pub use token::{RawTokenSnapshot, SnapshotError, TokenSnapshot};
