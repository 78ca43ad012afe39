//! The event-driven liquidity cache (spec §4.3): authoritative in-process
//! state for offers and intents, populated exclusively by chain event
//! ingestion and queried by the router.

mod ingestion;
mod store;

pub use ingestion::IngestionWorker;
pub use store::LiquidityCache;
