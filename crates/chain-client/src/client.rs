use async_trait::async_trait;
use router_types::{ChainEvent, EventCursor, ObjectId, RouterError};

use crate::tx::{ObjectRef, TxBuilder};

/// A page of events returned by a poll, and the cursor to resume from.
#[derive(Debug, Clone)]
pub struct EventBatch {
    pub events: Vec<ChainEvent>,
    pub cursor: EventCursor,
}

/// A live push subscription to protocol events. `None` from
/// [`ChainClient::subscribe_events`] means the transport doesn't support
/// push delivery right now; the ingestion worker falls back to polling
/// (spec §4.3).
#[async_trait]
pub trait EventStream: Send {
    /// Waits for the next event, or `None` if the subscription dropped
    /// (triggering fallback to polling with backoff, spec §4.3, §7
    /// `EventIngestionTransient`).
    async fn next(&mut self) -> Option<ChainEvent>;
}

/// The result of submitting a signed transaction (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub digest: String,
    pub success: bool,
    pub gas_used: u64,
    pub created_object_ids: Vec<ObjectId>,
}

/// The executor's signing identity. Treated as a long-lived singleton,
/// never mutated after engine start (spec §5).
#[derive(Debug, Clone)]
pub struct ExecutorKey {
    pub capability_id: ObjectId,
}

/// The chain-client boundary the engine consumes (spec §6): event
/// subscription/polling, object lookups, a transaction-builder factory, and
/// signed submission. Everything here may suspend (spec §5); the router,
/// cache queries, and transaction composition never call it directly.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Attempt to open a push subscription. Returns `None` if unsupported;
    /// callers should fall back to [`Self::poll_events`].
    fn subscribe_events(&self) -> Option<Box<dyn EventStream>>;

    /// Paged, ordered event query, resuming from `cursor`, bounded to
    /// `max_batch` events.
    async fn poll_events(
        &self,
        cursor: EventCursor,
        max_batch: usize,
    ) -> Result<EventBatch, RouterError>;

    /// Fetch an object reference (for dynamic field lookups, spec §6).
    async fn object_ref(&self, id: ObjectId) -> Result<ObjectRef, RouterError>;

    /// The well-known clock object passed to every time-sensitive call
    /// (spec §6).
    fn clock_object(&self) -> ObjectRef;

    /// A fresh transaction builder for composing one settlement.
    fn new_tx_builder(&self) -> Box<dyn TxBuilder>;

    /// Sign and submit a built transaction, returning the on-chain outcome.
    async fn submit(
        &self,
        builder: Box<dyn TxBuilder>,
        signer: &ExecutorKey,
    ) -> Result<SubmissionOutcome, RouterError>;
}
