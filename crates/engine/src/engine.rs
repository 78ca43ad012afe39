use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chain_client::{ChainClient, CoinHandle, ExecutorKey};
use confidentiality::{ConfidentialityCollaborator, ConfidentialityShim};
use dashmap::{DashMap, DashSet};
use futures::stream::{self, StreamExt};
use liquidity_cache::{IngestionWorker, LiquidityCache};
use router::{Router, RouterConfig};
use router_types::{
    AssetPair, Intent, IntentId, OfferId, QuoteMetadata, RouterError, RouterResult, TimestampMs,
};
use tx_composer::{Composer, GasBudgets, ProtocolTargets};
use venue_adapter::{NativeVenueAdapter, VenueAdapter};

use crate::config::EngineConfig;
use crate::metrics::{Liveness, Metrics};

/// The gas/payment coin every composed transaction starts from, addressed
/// by the same convention `tx-composer`'s own tests use: the primary
/// funding coin is always the transaction's coin zero.
const FUNDING_COIN: CoinHandle = CoinHandle(0);

/// How long the confidentiality shim's session credential is cached before
/// a fresh one is requested (spec §4.7 leaves refresh cadence to the
/// engine).
const CONFIDENTIALITY_SESSION_TTL: Duration = Duration::from_secs(300);

/// Events drained from the chain client per poll, bounding worst-case
/// per-tick ingestion latency.
const EVENT_POLL_BATCH: usize = 500;

/// The long-running execution loop (spec §4.6): ticks on a timer, reads
/// pending intents from the cache, routes, composes, signs, and submits —
/// absorbing every non-fatal failure into metrics rather than aborting.
pub struct Engine {
    config: EngineConfig,
    cache: Arc<LiquidityCache>,
    ingestion: IngestionWorker,
    router: Router,
    composer: Composer,
    confidentiality: ConfidentialityShim,
    chain_client: Arc<dyn ChainClient>,
    executor_key: ExecutorKey,
    metrics: Arc<Metrics>,
    in_flight: DashSet<IntentId>,
    recently_executed: DashMap<IntentId, Instant>,
    shutdown: AtomicBool,
    started_at: OnceLock<Instant>,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        chain_client: Arc<dyn ChainClient>,
        external_adapters: Vec<Arc<dyn VenueAdapter>>,
        confidentiality_collaborator: Arc<dyn ConfidentialityCollaborator>,
        targets: ProtocolTargets,
        router_config: RouterConfig,
    ) -> Arc<Self> {
        let cache = Arc::new(LiquidityCache::new());
        let ingestion = IngestionWorker::new(
            cache.clone(),
            chain_client.clone(),
            config.poll_interval,
            EVENT_POLL_BATCH,
        );
        let router = Router::new(cache.clone(), external_adapters.clone(), router_config);
        let native_adapter = Arc::new(NativeVenueAdapter::new(
            targets.fill_full.clone(),
            targets.fill_partial.clone(),
        ));
        let gas = GasBudgets {
            direct: config.max_gas_direct,
            composite: config.max_gas_composite,
        };
        let composer = Composer::new(
            native_adapter,
            external_adapters,
            targets,
            gas,
            config.slippage_bps,
        );
        let confidentiality =
            ConfidentialityShim::new(confidentiality_collaborator, CONFIDENTIALITY_SESSION_TTL);
        let executor_key = ExecutorKey {
            capability_id: config.executor_capability_id,
        };
        Arc::new(Self {
            config,
            cache,
            ingestion,
            router,
            composer,
            confidentiality,
            chain_client,
            executor_key,
            metrics: Arc::new(Metrics::new()),
            in_flight: DashSet::new(),
            recently_executed: DashMap::new(),
            shutdown: AtomicBool::new(false),
            started_at: OnceLock::new(),
        })
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub fn cache(&self) -> &Arc<LiquidityCache> {
        &self.cache
    }

    /// Establishes event ingestion, then ticks until stopped (spec §4.6,
    /// §5). The engine is meant to be the sole owner of its tick loop;
    /// callers hold `Arc<Engine>` references rather than re-instantiating
    /// (spec §9, "Replacing shared mutable singletons"). A fatal
    /// configuration error (spec §7, "Propagation policy") still halts the
    /// process immediately; a `stop()` call instead lets the in-flight tick
    /// finish and returns (spec §5, "in-flight processors are allowed to
    /// complete their current intent, then exit").
    pub async fn run_forever(self: Arc<Self>) {
        self.started_at.set(Instant::now()).ok();
        self.ingestion.start().await;
        while !self.shutdown.load(Ordering::Relaxed) {
            if self.tick().await {
                tracing::error!("halting: fatal configuration error during tick");
                std::process::exit(1);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Cancels the tick loop and the ingestion worker (spec §5). The current
    /// tick, if any, is allowed to finish before `run_forever` returns.
    pub async fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.ingestion.stop().await;
    }

    /// Quoting mode (spec §4.6): runs only the router step, with no
    /// execution, for a UI collaborator to display prices.
    pub async fn quote(&self, pair: &AssetPair, receive_amount: u64) -> Option<router_types::RoutingDecision> {
        self.router.search(pair, receive_amount, now_ms()).await
    }

    /// One pass over every currently pending intent, dispatched with
    /// bounded concurrency — one processor per available core, matching
    /// the "typically one per available core" sizing in spec §5. Returns
    /// `true` if any intent this tick hit a fatal configuration error.
    async fn tick(self: &Arc<Self>) -> bool {
        self.metrics.tick();
        let now = now_ms();
        let pending = self.cache.pending_intents(now);
        let concurrency = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        let outcomes = stream::iter(pending.into_iter().map(|intent| {
            let engine = Arc::clone(self);
            async move { engine.process_one(intent, now).await }
        }))
        .buffer_unordered(concurrency)
        .collect::<Vec<bool>>()
        .await;
        outcomes.into_iter().any(|fatal| fatal)
    }

    /// Dedup, in-flight locking, and outcome recording for a single intent
    /// (spec §4.6 step 2-3, §8 "Dedup"). `self.in_flight.insert` is the
    /// atomic contains-and-insert the dedup property requires: a `false`
    /// return means another processor already holds this id. Returns
    /// whether this intent hit a fatal configuration error.
    async fn process_one(self: Arc<Self>, intent: Intent, now_ms: TimestampMs) -> bool {
        let id = intent.intent_id;
        if let Some(executed_at) = self.recently_executed.get(&id) {
            if executed_at.elapsed() < self.config.recently_executed_ttl {
                self.metrics.intents_skipped.inc();
                return false;
            }
        }
        if !self.in_flight.insert(id) {
            return false;
        }
        self.metrics.intents_processed.inc();
        let until_expiry = Duration::from_millis(intent.expiry_ms.saturating_sub(now_ms));
        let deadline = self.config.tick_deadline.min(until_expiry);
        let fatal = match tokio::time::timeout(deadline, self.execute_intent(&intent, now_ms)).await {
            Err(_elapsed) => {
                tracing::info!(intent_id = %id, deadline_ms = deadline.as_millis(), "intent skipped: processing deadline exceeded");
                self.metrics.intents_skipped.inc();
                false
            }
            Ok(Ok(gas_used)) => {
                self.metrics.intents_executed.inc();
                self.metrics.total_gas_used.inc_by(gas_used);
                self.recently_executed.insert(id, Instant::now());
                false
            }
            Ok(Err(RouterError::FatalConfig(reason))) => {
                tracing::error!(intent_id = %id, %reason, "fatal configuration error");
                self.metrics.intents_failed.inc();
                true
            }
            Ok(Err(RouterError::SubmissionFailed(reason))) => {
                tracing::warn!(intent_id = %id, %reason, "submission rejected on-chain");
                self.metrics.intents_failed.inc();
                false
            }
            Ok(Err(other)) => {
                tracing::info!(intent_id = %id, error = %other, "intent skipped this tick");
                self.metrics.intents_skipped.inc();
                false
            }
        };
        self.in_flight.remove(&id);
        fatal
    }

    /// Routes, composes, signs, and submits a single intent end to end
    /// (spec §4.6 step 3). Returns the gas used on success.
    async fn execute_intent(&self, intent: &Intent, now_ms: TimestampMs) -> RouterResult<u64> {
        let (receive_amount, min_price, max_price, decrypted) = if self.confidentiality.is_opaque(intent) {
            let params = self.confidentiality.decrypt(intent.intent_id).await.ok_or_else(|| {
                RouterError::ConfidentialityMiss(format!(
                    "no decrypted parameters for intent {}",
                    intent.intent_id
                ))
            })?;
            (params.receive_amount, params.min_price, params.max_price, Some(params))
        } else {
            (intent.receive_amount, intent.min_price, intent.max_price, None)
        };

        // Opaque intents carry no on-chain `max_pay_amount` (the cache zeroes
        // that field along with the other sentinel amounts, since
        // `EncryptedIntentSubmitted` never reveals it) — the taker's budget
        // is instead whatever `max_price` implies at the decrypted
        // `receive_amount`.
        let max_pay_amount = match &decrypted {
            Some(params) => pricing_kernel::payment(params.receive_amount, params.max_price)?,
            None => intent.max_pay_amount,
        };

        let pair = AssetPair::new(intent.receive_asset.clone(), intent.pay_asset.clone());
        let decision = self
            .router
            .search(&pair, receive_amount, now_ms)
            .await
            .ok_or(RouterError::NoRoute)?;
        self.router
            .validate_against_intent(&decision, min_price, max_price, max_pay_amount)?;

        let clock = self.chain_client.clock_object();
        let mut builder = self.chain_client.new_tx_builder();
        let recipient = intent.creator;

        if decision.legs.len() == 1 && decision.legs[0].is_native() {
            let QuoteMetadata::Native { offer_id, .. } = &decision.legs[0].metadata else {
                unreachable!("checked is_native above")
            };
            let offer_ref = self.chain_client.object_ref(*offer_id).await?;
            let intent_ref = self.chain_client.object_ref(intent.intent_id).await?;
            let executor_cap_ref = self.chain_client.object_ref(self.executor_key.capability_id).await?;
            self.composer.compose_intent_bound_fill(
                &decision,
                intent_ref,
                offer_ref,
                executor_cap_ref,
                clock,
                FUNDING_COIN,
                recipient,
                decrypted,
                builder.as_mut(),
            )?;
        } else {
            let offer_refs = self.resolve_native_offer_refs(&decision.legs).await?;
            self.composer.compose_composite(
                &decision,
                &offer_refs,
                clock,
                FUNDING_COIN,
                recipient,
                builder.as_mut(),
            )?;
        }

        let outcome = self.chain_client.submit(builder, &self.executor_key).await?;
        if !outcome.success {
            return Err(RouterError::SubmissionFailed(format!(
                "transaction {} rejected on-chain",
                outcome.digest
            )));
        }
        Ok(outcome.gas_used)
    }

    async fn resolve_native_offer_refs(
        &self,
        legs: &[router_types::RoutingLeg],
    ) -> RouterResult<HashMap<OfferId, chain_client::ObjectRef>> {
        let mut refs = HashMap::new();
        for leg in legs {
            if let QuoteMetadata::Native { offer_id, .. } = &leg.metadata {
                if !refs.contains_key(offer_id) {
                    let object_ref = self.chain_client.object_ref(*offer_id).await?;
                    refs.insert(*offer_id, object_ref);
                }
            }
        }
        Ok(refs)
    }
}

/// Alive once the tick loop has started and ingestion is keeping up (spec
/// §4.6): `startedAt` set, and a last-applied-event timestamp within
/// `liveness_staleness` of now. Before the first event lands (or before
/// `run_forever` has started), the engine reports not-alive rather than
/// trusting an absent signal.
#[async_trait]
impl Liveness for Engine {
    async fn is_alive(&self) -> bool {
        if self.started_at.get().is_none() {
            return false;
        }
        match self.ingestion.last_applied_event_ms() {
            Some(last_applied) => now_ms().saturating_sub(last_applied) <= self.config.liveness_staleness.as_millis() as u64,
            None => false,
        }
    }
}

fn now_ms() -> TimestampMs {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chain_client::mock::InMemoryChainClient;
    use chain_client::{EventBatch, MoveCallTarget};
    use confidentiality::mock::MockCollaborator;
    use router_types::{
        Address, AssetType, ChainEvent, DecryptedIntentParams, EncryptedIntentSubmitted, EventCursor,
        FillPolicy, IntentId, IntentSubmitted, OfferCreated, OfferId, SCALE,
    };

    use super::*;

    fn targets() -> ProtocolTargets {
        ProtocolTargets {
            fill_full: MoveCallTarget::new("0xproto", "offer", "fill_full"),
            fill_partial: MoveCallTarget::new("0xproto", "offer", "fill_partial"),
            execute_against_offer: MoveCallTarget::new("0xproto", "intent", "execute_against_offer"),
            execute_against_offer_encrypted: MoveCallTarget::new(
                "0xproto",
                "intent",
                "execute_against_offer_encrypted",
            ),
        }
    }

    // clap::Parser requires argv-shaped input even in tests; a tiny helper
    // keeps every test from repeating the same flag list.
    fn config() -> EngineConfig {
        use clap::Parser;
        EngineConfig::parse_from([
            "engine",
            "--rpc-endpoint",
            "https://fullnode.testnet.example/",
            "--protocol-package-id",
            &router_types::ObjectId::from_u64(1).to_string(),
            "--executor-capability-id",
            &router_types::ObjectId::from_u64(2).to_string(),
            "--poll-interval",
            "10ms",
            "--recently-executed-ttl",
            "50ms",
        ])
    }

    fn offer_created_event(id: u64) -> ChainEvent {
        ChainEvent::OfferCreated(OfferCreated {
            offer_id: OfferId::from_u64(id),
            maker: Address::from_u64(1),
            offer_asset: AssetType::new("SUI"),
            want_asset: AssetType::new("USDC"),
            initial_amount: 100,
            min_price: SCALE + SCALE / 2, // 1.5 * SCALE
            max_price: SCALE + SCALE / 2,
            fill_policy: FillPolicy::Partial,
            min_fill_amount: 1,
            expiry_ms: u64::MAX,
        })
    }

    fn intent_submitted_event(id: u64) -> ChainEvent {
        ChainEvent::IntentSubmitted(IntentSubmitted {
            intent_id: IntentId::from_u64(id),
            creator: Address::from_u64(42),
            receive_asset: AssetType::new("SUI"),
            pay_asset: AssetType::new("USDC"),
            receive_amount: 10,
            max_pay_amount: 20,
            min_price: SCALE,
            max_price: 2 * SCALE,
            expiry_ms: u64::MAX,
        })
    }

    #[tokio::test]
    async fn single_native_full_fill_is_executed_and_recorded() {
        let client: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new(vec![EventBatch {
            events: vec![offer_created_event(1), intent_submitted_event(1)],
            cursor: EventCursor(2),
        }]));
        let engine = Engine::new(
            config(),
            client.clone(),
            Vec::new(),
            Arc::new(MockCollaborator::new()),
            targets(),
            RouterConfig::default(),
        );
        engine.ingestion.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.tick().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        engine.stop().await;

        assert_eq!(engine.metrics.intents_executed.get(), 1);
        assert_eq!(engine.metrics.intents_failed.get(), 0);
        assert!(engine.recently_executed.contains_key(&IntentId::from_u64(1)));
    }

    #[tokio::test]
    async fn opaque_intent_uses_decrypted_params_and_encrypted_target() {
        let intent_id = IntentId::from_u64(7);
        let client: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new(vec![EventBatch {
            events: vec![
                offer_created_event(1),
                ChainEvent::EncryptedIntentSubmitted(EncryptedIntentSubmitted {
                    intent_id,
                    creator: Address::from_u64(42),
                    receive_asset: AssetType::new("SUI"),
                    pay_asset: AssetType::new("USDC"),
                    expiry_ms: u64::MAX,
                }),
            ],
            cursor: EventCursor(2),
        }]));
        let collaborator = MockCollaborator::new().with_params(
            intent_id,
            DecryptedIntentParams {
                receive_amount: 5,
                min_price: SCALE + SCALE / 5,       // 1.2 * SCALE
                max_price: SCALE + (4 * SCALE) / 5, // 1.8 * SCALE
            },
        );
        let engine = Engine::new(
            config(),
            client,
            Vec::new(),
            Arc::new(collaborator),
            targets(),
            RouterConfig::default(),
        );
        engine.ingestion.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.tick().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        engine.stop().await;

        assert_eq!(engine.metrics.intents_executed.get(), 1);
        assert!(engine.recently_executed.contains_key(&intent_id));
    }

    #[tokio::test]
    async fn recently_executed_intent_is_skipped_within_ttl() {
        let client: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new(Vec::new()));
        let engine = Engine::new(
            config(),
            client,
            Vec::new(),
            Arc::new(MockCollaborator::new()),
            targets(),
            RouterConfig::default(),
        );
        let id = IntentId::from_u64(1);
        engine.recently_executed.insert(id, Instant::now());
        let intent = Intent {
            intent_id: id,
            creator: Address::from_u64(1),
            receive_asset: AssetType::new("SUI"),
            pay_asset: AssetType::new("USDC"),
            receive_amount: 10,
            max_pay_amount: 20,
            min_price: SCALE,
            max_price: 2 * SCALE,
            expiry_ms: u64::MAX,
            status: router_types::IntentStatus::Pending,
        };
        engine.clone().process_one(intent, 0).await;
        assert_eq!(engine.metrics.intents_skipped.get(), 1);
        assert_eq!(engine.metrics.intents_processed.get(), 0);
    }

    #[tokio::test]
    async fn an_in_flight_intent_is_not_processed_twice_concurrently() {
        let client: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new(Vec::new()));
        let engine = Engine::new(
            config(),
            client,
            Vec::new(),
            Arc::new(MockCollaborator::new()),
            targets(),
            RouterConfig::default(),
        );
        let id = IntentId::from_u64(9);
        assert!(engine.in_flight.insert(id));
        // A second insert attempt while the first is still held must fail,
        // which is exactly the signal `process_one` uses to skip.
        assert!(!engine.in_flight.insert(id));
    }

    #[tokio::test]
    async fn quote_mode_runs_the_router_without_touching_execution_state() {
        let client: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new(vec![EventBatch {
            events: vec![offer_created_event(1)],
            cursor: EventCursor(1),
        }]));
        let engine = Engine::new(
            config(),
            client,
            Vec::new(),
            Arc::new(MockCollaborator::new()),
            targets(),
            RouterConfig::default(),
        );
        engine.ingestion.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let pair = AssetPair::new(AssetType::new("SUI"), AssetType::new("USDC"));
        let decision = engine.quote(&pair, 10).await;
        engine.stop().await;
        assert!(decision.is_some());
        assert_eq!(engine.metrics.intents_processed.get(), 0);
    }

    fn config_with_tick_deadline(ms: u64) -> EngineConfig {
        use clap::Parser;
        EngineConfig::parse_from([
            "engine",
            "--rpc-endpoint",
            "https://fullnode.testnet.example/",
            "--protocol-package-id",
            &router_types::ObjectId::from_u64(1).to_string(),
            "--executor-capability-id",
            &router_types::ObjectId::from_u64(2).to_string(),
            "--poll-interval",
            "10ms",
            "--recently-executed-ttl",
            "50ms",
            "--tick-deadline",
            &format!("{ms}ms"),
        ])
    }

    #[tokio::test]
    async fn an_intent_past_its_tick_deadline_is_skipped_not_executed() {
        let client: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new(vec![EventBatch {
            events: vec![offer_created_event(1), intent_submitted_event(1)],
            cursor: EventCursor(2),
        }]));
        let engine = Engine::new(
            config_with_tick_deadline(0),
            client,
            Vec::new(),
            Arc::new(MockCollaborator::new()),
            targets(),
            RouterConfig::default(),
        );
        engine.ingestion.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.tick().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        engine.stop().await;

        assert_eq!(engine.metrics.intents_executed.get(), 0);
        assert_eq!(engine.metrics.intents_skipped.get(), 1);
    }

    #[tokio::test]
    async fn is_alive_is_false_before_run_forever_starts() {
        let client: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new(Vec::new()));
        let engine = Engine::new(
            config(),
            client,
            Vec::new(),
            Arc::new(MockCollaborator::new()),
            targets(),
            RouterConfig::default(),
        );
        assert!(!engine.is_alive().await);
    }

    #[tokio::test]
    async fn is_alive_is_true_once_started_with_fresh_ingestion() {
        let client: Arc<dyn ChainClient> = Arc::new(InMemoryChainClient::new(vec![EventBatch {
            events: vec![offer_created_event(1)],
            cursor: EventCursor(1),
        }]));
        let engine = Engine::new(
            config(),
            client,
            Vec::new(),
            Arc::new(MockCollaborator::new()),
            targets(),
            RouterConfig::default(),
        );
        let handle = tokio::spawn(engine.clone().run_forever());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(engine.is_alive().await);
        engine.stop().await;
        handle.await.unwrap();
    }
}
