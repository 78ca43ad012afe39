use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chain_client::ChainClient;
use router_types::TimestampMs;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::store::LiquidityCache;

/// Backoff schedule for transient polling/subscription failures (spec §4.3,
/// §7 `EventIngestionTransient`).
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Sentinel for "no event has ever been applied", distinct from any real
/// timestamp (spec §6 uses 0 as an epoch start, never a valid wall-clock
/// reading for a live deployment).
const NEVER_APPLIED: u64 = 0;

/// Owns the subscription-or-poll loop that is the cache's sole writer
/// (spec §4.3, §5). `start`/`stop` form the cache's lifecycle; restart
/// repopulates purely from chain history (spec §6, "no persistent state").
pub struct IngestionWorker {
    cache: Arc<LiquidityCache>,
    client: Arc<dyn ChainClient>,
    poll_interval: Duration,
    max_batch: usize,
    task: Mutex<Option<JoinHandle<()>>>,
    last_applied_ms: Arc<AtomicU64>,
}

impl IngestionWorker {
    pub fn new(
        cache: Arc<LiquidityCache>,
        client: Arc<dyn ChainClient>,
        poll_interval: Duration,
        max_batch: usize,
    ) -> Self {
        Self {
            cache,
            client,
            poll_interval,
            max_batch,
            task: Mutex::new(None),
            last_applied_ms: Arc::new(AtomicU64::new(NEVER_APPLIED)),
        }
    }

    /// When the most recent event was applied to the cache, or `None` if
    /// ingestion hasn't applied one yet (spec §4.6, liveness). Read by the
    /// engine's liveness check to decide whether ingestion is keeping up.
    pub fn last_applied_event_ms(&self) -> Option<TimestampMs> {
        match self.last_applied_ms.load(Ordering::Relaxed) {
            NEVER_APPLIED => None,
            ms => Some(ms),
        }
    }

    /// Establishes the subscription or polling loop. A push subscription is
    /// preferred; if unavailable (or it drops), ingestion falls back to
    /// polling with exponential backoff (spec §4.3).
    pub async fn start(&self) {
        let mut task_guard = self.task.lock().await;
        if task_guard.is_some() {
            return; // already running
        }
        let cache = self.cache.clone();
        let client = self.client.clone();
        let poll_interval = self.poll_interval;
        let max_batch = self.max_batch;
        let last_applied_ms = self.last_applied_ms.clone();
        let handle = tokio::spawn(async move {
            run_forever(cache, client, poll_interval, max_batch, last_applied_ms).await;
        });
        *task_guard = Some(handle);
    }

    /// Tears down the ingestion loop. Best-effort: the in-flight poll, if
    /// any, is allowed to finish before the task exits.
    pub async fn stop(&self) {
        let mut task_guard = self.task.lock().await;
        if let Some(handle) = task_guard.take() {
            handle.abort();
        }
    }

    pub fn cache(&self) -> &Arc<LiquidityCache> {
        &self.cache
    }
}

async fn run_forever(
    cache: Arc<LiquidityCache>,
    client: Arc<dyn ChainClient>,
    poll_interval: Duration,
    max_batch: usize,
    last_applied_ms: Arc<AtomicU64>,
) {
    if let Some(mut subscription) = client.subscribe_events() {
        tracing::info!("ingestion: using push subscription");
        loop {
            match subscription.next().await {
                Some(event) => {
                    let now = now_ms();
                    cache.apply_event(event, now);
                    last_applied_ms.store(now, Ordering::Relaxed);
                }
                None => {
                    tracing::warn!("ingestion: subscription dropped, falling back to polling");
                    break;
                }
            }
        }
    }
    poll_forever(cache, client, poll_interval, max_batch, last_applied_ms).await;
}

async fn poll_forever(
    cache: Arc<LiquidityCache>,
    client: Arc<dyn ChainClient>,
    poll_interval: Duration,
    max_batch: usize,
    last_applied_ms: Arc<AtomicU64>,
) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        let cursor = cache.cursor();
        match client.poll_events(cursor, max_batch).await {
            Ok(batch) => {
                backoff = INITIAL_BACKOFF;
                let now = now_ms();
                let advanced = batch.cursor;
                let applied_any = !batch.events.is_empty();
                for event in batch.events {
                    cache.apply_event(event, now);
                }
                if applied_any {
                    last_applied_ms.store(now, Ordering::Relaxed);
                }
                cache.advance_cursor(advanced);
                tokio::time::sleep(poll_interval).await;
            }
            Err(err) => {
                tracing::warn!(?err, backoff_ms = backoff.as_millis(), "event poll failed, backing off");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
