//! Application Layer
//!
//! - `delisting_detector`: liveness protocol over the registry and price sources
//! - `buy_signal`: the ordered gate pipeline behind every buy decision

pub mod buy_signal;
pub mod delisting_detector;

pub use buy_signal::{AcceptPath, BuyDecision, BuySignalPipeline, PipelineError, RejectReason};
pub use delisting_detector::{DelistingDetector, LivenessReport};
