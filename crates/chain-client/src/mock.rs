//! Deterministic fakes for the chain-client boundary, used by this crate's
//! own tests and by downstream crates (`tx-composer`, `engine`) under the
//! `test-util` feature — the same shape as `ethrpc`'s `test-util` feature
//! in the teacher workspace.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use router_types::{Address, ChainEvent, EventCursor, ObjectId, RouterError};

use crate::{
    client::{ChainClient, EventBatch, EventStream, ExecutorKey, SubmissionOutcome},
    tx::{CoinHandle, MoveCallTarget, ObjectRef, TxArg, TxBuilder},
};

/// One operation recorded by [`RecordingTxBuilder`], in emission order, for
/// assertions in composer tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOp {
    MoveCall {
        target: MoveCallTarget,
        args: Vec<TxArg>,
        outputs: Vec<CoinHandle>,
    },
    SplitCoin {
        coin: CoinHandle,
        amount: u64,
        output: CoinHandle,
    },
    MergeCoins {
        into: CoinHandle,
        others: Vec<CoinHandle>,
    },
    Transfer {
        object: CoinHandle,
        recipient: Address,
    },
}

/// A `TxBuilder` that records every call instead of talking to a node.
#[derive(Debug, Default)]
pub struct RecordingTxBuilder {
    pub ops: Vec<TxOp>,
    pub gas_budget: Option<u64>,
    next_handle: usize,
}

impl RecordingTxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_handle(&mut self) -> CoinHandle {
        let handle = CoinHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// How many move calls were emitted naming this function.
    pub fn move_call_count(&self, function: &str) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, TxOp::MoveCall { target, .. } if target.function == function))
            .count()
    }
}

impl TxBuilder for RecordingTxBuilder {
    fn object_ref(&mut self, object: ObjectRef) -> TxArg {
        TxArg::Object(object)
    }

    fn pure_u64(&mut self, value: u64) -> TxArg {
        TxArg::PureU64(value)
    }

    fn pure_address(&mut self, address: Address) -> TxArg {
        TxArg::PureAddress(address)
    }

    fn pure_bytes(&mut self, bytes: Vec<u8>) -> TxArg {
        TxArg::PureBytes(bytes)
    }

    fn move_call(&mut self, target: MoveCallTarget, args: Vec<TxArg>) -> Vec<CoinHandle> {
        let output = self.fresh_handle();
        self.ops.push(TxOp::MoveCall {
            target,
            args,
            outputs: vec![output],
        });
        vec![output]
    }

    fn split_coin(&mut self, coin: CoinHandle, amount: u64) -> CoinHandle {
        let output = self.fresh_handle();
        self.ops.push(TxOp::SplitCoin {
            coin,
            amount,
            output,
        });
        output
    }

    fn merge_coins(&mut self, into: CoinHandle, others: Vec<CoinHandle>) {
        self.ops.push(TxOp::MergeCoins { into, others });
    }

    fn transfer(&mut self, object: CoinHandle, recipient: Address) {
        self.ops.push(TxOp::Transfer { object, recipient });
    }

    fn set_gas_budget(&mut self, budget: u64) {
        self.gas_budget = Some(budget);
    }
}

/// An in-memory `ChainClient` that serves a queued sequence of event
/// batches and always returns a configurable, canned submission outcome.
/// No push subscription: [`ChainClient::subscribe_events`] always returns
/// `None`, exercising the polling fallback path.
pub struct InMemoryChainClient {
    batches: Mutex<VecDeque<EventBatch>>,
    submit_result: SubmitResult,
    clock: ObjectRef,
    submitted: AtomicUsize,
}

enum SubmitResult {
    Success,
    Failure(String),
}

impl InMemoryChainClient {
    pub fn new(batches: Vec<EventBatch>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            submit_result: SubmitResult::Success,
            clock: ObjectRef {
                id: ObjectId::from_u64(0x0c10c4),
                version: 1,
                digest: "clock".into(),
            },
            submitted: AtomicUsize::new(0),
        }
    }

    pub fn always_fail_submission(mut self, reason: impl Into<String>) -> Self {
        self.submit_result = SubmitResult::Failure(reason.into());
        self
    }

    pub fn submissions(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for InMemoryChainClient {
    fn subscribe_events(&self) -> Option<Box<dyn EventStream>> {
        None
    }

    async fn poll_events(
        &self,
        _cursor: EventCursor,
        max_batch: usize,
    ) -> Result<EventBatch, RouterError> {
        let mut batches = self.batches.lock().unwrap();
        match batches.pop_front() {
            Some(mut batch) => {
                if batch.events.len() > max_batch {
                    let rest = batch.events.split_off(max_batch);
                    let cursor = batch.cursor;
                    batches.push_front(EventBatch {
                        events: rest,
                        cursor,
                    });
                }
                Ok(batch)
            }
            None => Ok(EventBatch {
                events: Vec::new(),
                cursor: EventCursor::default(),
            }),
        }
    }

    async fn object_ref(&self, id: ObjectId) -> Result<ObjectRef, RouterError> {
        Ok(ObjectRef {
            id,
            version: 1,
            digest: "mock".into(),
        })
    }

    fn clock_object(&self) -> ObjectRef {
        self.clock.clone()
    }

    fn new_tx_builder(&self) -> Box<dyn TxBuilder> {
        Box::new(RecordingTxBuilder::new())
    }

    async fn submit(
        &self,
        _builder: Box<dyn TxBuilder>,
        _signer: &ExecutorKey,
    ) -> Result<SubmissionOutcome, RouterError> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        match &self.submit_result {
            SubmitResult::Success => Ok(SubmissionOutcome {
                digest: format!("digest-{}", self.submitted.load(Ordering::SeqCst)),
                success: true,
                gas_used: 1_000_000,
                created_object_ids: Vec::new(),
            }),
            SubmitResult::Failure(reason) => Err(RouterError::SubmissionFailed(reason.clone())),
        }
    }
}
