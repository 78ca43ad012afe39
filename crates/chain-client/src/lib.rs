//! The chain-client boundary the engine consumes (spec §6): event
//! subscription/polling, object lookups, transaction-builder primitives,
//! and signed submission. This crate only defines the contract and (behind
//! `test-util`) deterministic fakes for it — the concrete node integration
//! is an external collaborator, out of scope (spec §1).

mod client;
mod tx;

#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{ChainClient, EventBatch, EventStream, ExecutorKey, SubmissionOutcome};
pub use tx::{CoinHandle, MoveCallTarget, ObjectRef, TxArg, TxBuilder};
