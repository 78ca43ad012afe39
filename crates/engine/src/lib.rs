//! The execution engine (spec §4.6): the long-running tick loop that turns
//! pending intents sitting in the liquidity cache into signed, submitted
//! settlement transactions — routing, composing, and submitting each one
//! while staying within the concurrency and error-propagation model laid
//! out in spec §5 and §7.

mod config;
mod engine;
mod metrics;

pub use config::{EngineConfig, Network};
pub use engine::Engine;
pub use metrics::{serve, AlwaysAlive, Liveness, Metrics};
