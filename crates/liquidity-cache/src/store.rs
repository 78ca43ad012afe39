use std::collections::HashMap;

use parking_lot::RwLock;
use router_types::{
    AssetType, ChainEvent, EventCursor, Intent, IntentId, IntentStatus, Offer, OfferId,
    OfferStatus, TimestampMs,
};

/// Event-driven liquidity state: offers and intents keyed by id, plus a
/// pair-indexed view over active offers (spec §4.3).
///
/// Many readers, one writer: every public method takes `&self` and
/// synchronizes internally, so query callers never block the ingestion
/// worker's writes for longer than copying a lock guard, and the ingestion
/// worker is the only caller that ever calls `apply_event` (spec §5).
pub struct LiquidityCache {
    offers: RwLock<HashMap<OfferId, Offer>>,
    intents: RwLock<HashMap<IntentId, Intent>>,
    pair_index: RwLock<HashMap<(AssetType, AssetType), Vec<OfferId>>>,
    cursor: RwLock<EventCursor>,
}

impl Default for LiquidityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LiquidityCache {
    pub fn new() -> Self {
        Self {
            offers: RwLock::new(HashMap::new()),
            intents: RwLock::new(HashMap::new()),
            pair_index: RwLock::new(HashMap::new()),
            cursor: RwLock::new(EventCursor::default()),
        }
    }

    pub fn cursor(&self) -> EventCursor {
        *self.cursor.read()
    }

    pub fn advance_cursor(&self, new_cursor: EventCursor) {
        let mut cursor = self.cursor.write();
        *cursor = cursor.advance_past(new_cursor.0);
    }

    /// Applies one chain event. Idempotent for creation events (a known id
    /// is ignored); monotone for status transitions (never regresses
    /// `remaining_amount` or moves status away from terminal). Unknown or
    /// malformed events are logged and skipped — this method never panics
    /// (spec §4.3).
    pub fn apply_event(&self, event: ChainEvent, now_ms: TimestampMs) {
        match event {
            ChainEvent::OfferCreated(created) => {
                let mut offers = self.offers.write();
                if offers.contains_key(&created.offer_id) {
                    return; // idempotent: creation for a known id is ignored
                }
                let offer = Offer {
                    offer_id: created.offer_id,
                    maker: created.maker,
                    offer_asset: created.offer_asset.clone(),
                    want_asset: created.want_asset.clone(),
                    initial_amount: created.initial_amount,
                    remaining_amount: created.initial_amount,
                    min_price: created.min_price,
                    max_price: created.max_price,
                    fill_policy: created.fill_policy,
                    min_fill_amount: created.min_fill_amount,
                    expiry_ms: created.expiry_ms,
                    status: OfferStatus::Created,
                    total_filled: 0,
                    fill_count: 0,
                    last_updated_at: now_ms,
                };
                let key = (created.offer_asset, created.want_asset);
                offers.insert(created.offer_id, offer);
                drop(offers);
                self.pair_index
                    .write()
                    .entry(key)
                    .or_default()
                    .push(created.offer_id);
            }
            ChainEvent::OfferFilled(filled) => {
                let mut offers = self.offers.write();
                if let Some(offer) = offers.get_mut(&filled.offer_id) {
                    if offer.status.is_terminal() {
                        return; // monotone: no further fills once terminal
                    }
                    let fill_amount = filled.fill_amount.min(offer.remaining_amount);
                    *offer = offer.apply_fill(fill_amount, filled.observed_at.max(now_ms));
                } else {
                    tracing::warn!(offer_id = %filled.offer_id, "fill for unknown offer, skipping");
                }
            }
            ChainEvent::OfferWithdrawn(withdrawn) => {
                self.terminate_offer(withdrawn.offer_id, OfferStatus::Withdrawn, withdrawn.observed_at.max(now_ms));
            }
            ChainEvent::OfferExpired(expired) => {
                self.terminate_offer(expired.offer_id, OfferStatus::Expired, expired.observed_at.max(now_ms));
            }
            ChainEvent::IntentSubmitted(submitted) => {
                let mut intents = self.intents.write();
                if intents.contains_key(&submitted.intent_id) {
                    return;
                }
                intents.insert(
                    submitted.intent_id,
                    Intent {
                        intent_id: submitted.intent_id,
                        creator: submitted.creator,
                        receive_asset: submitted.receive_asset,
                        pay_asset: submitted.pay_asset,
                        receive_amount: submitted.receive_amount,
                        max_pay_amount: submitted.max_pay_amount,
                        min_price: submitted.min_price,
                        max_price: submitted.max_price,
                        expiry_ms: submitted.expiry_ms,
                        status: IntentStatus::Pending,
                    },
                );
            }
            ChainEvent::EncryptedIntentSubmitted(submitted) => {
                let mut intents = self.intents.write();
                if intents.contains_key(&submitted.intent_id) {
                    return;
                }
                intents.insert(
                    submitted.intent_id,
                    Intent {
                        intent_id: submitted.intent_id,
                        creator: submitted.creator,
                        receive_asset: submitted.receive_asset,
                        pay_asset: submitted.pay_asset,
                        receive_amount: 0,
                        max_pay_amount: 0,
                        min_price: 0,
                        max_price: 0,
                        expiry_ms: submitted.expiry_ms,
                        status: IntentStatus::Pending,
                    },
                );
            }
            ChainEvent::IntentExecuted(executed) => {
                self.terminate_intent(executed.intent_id, IntentStatus::Executed);
            }
            ChainEvent::IntentCancelled(cancelled) => {
                self.terminate_intent(cancelled.intent_id, IntentStatus::Cancelled);
            }
            ChainEvent::IntentExpired(expired) => {
                self.terminate_intent(expired.intent_id, IntentStatus::Expired);
            }
            ChainEvent::Unknown { type_tag } => {
                tracing::warn!(%type_tag, "unrecognized event type, skipping");
            }
        }
    }

    fn terminate_offer(&self, id: OfferId, status: OfferStatus, observed_at: TimestampMs) {
        let mut offers = self.offers.write();
        match offers.get_mut(&id) {
            Some(offer) if !offer.status.is_terminal() => {
                offer.status = status;
                offer.last_updated_at = observed_at;
            }
            Some(_) => {} // already terminal: monotone, ignore
            None => tracing::warn!(offer_id = %id, "terminal event for unknown offer, skipping"),
        }
    }

    fn terminate_intent(&self, id: IntentId, status: IntentStatus) {
        let mut intents = self.intents.write();
        match intents.get_mut(&id) {
            Some(intent) if intent.status == IntentStatus::Pending => {
                intent.status = status;
            }
            Some(_) => {}
            None => tracing::warn!(intent_id = %id, "terminal event for unknown intent, skipping"),
        }
    }

    /// Offers matching `(offer_asset, want_asset) == (receive, pay)`, with
    /// status in `{Created, PartiallyFilled}`, unexpired, and a positive
    /// remaining amount — sorted by `min_price` ascending, `remaining_amount`
    /// descending as tie-break (spec §4.3).
    pub fn active_offers(&self, receive: &AssetType, pay: &AssetType, now_ms: TimestampMs) -> Vec<Offer> {
        let ids = self
            .pair_index
            .read()
            .get(&(receive.clone(), pay.clone()))
            .cloned()
            .unwrap_or_default();
        let offers = self.offers.read();
        let mut matching: Vec<Offer> = ids
            .into_iter()
            .filter_map(|id| offers.get(&id).cloned())
            .filter(|offer| offer.is_active(now_ms))
            .collect();
        drop(offers);
        matching.sort_by(|a, b| {
            a.min_price
                .cmp(&b.min_price)
                .then(b.remaining_amount.cmp(&a.remaining_amount))
        });
        matching
    }

    /// Intents in `Pending` status with `expiry_ms > now` (spec §4.3).
    pub fn pending_intents(&self, now_ms: TimestampMs) -> Vec<Intent> {
        self.intents
            .read()
            .values()
            .filter(|intent| intent.is_pending(now_ms))
            .cloned()
            .collect()
    }

    pub fn get_offer(&self, id: OfferId) -> Option<Offer> {
        self.offers.read().get(&id).cloned()
    }

    pub fn get_intent(&self, id: IntentId) -> Option<Intent> {
        self.intents.read().get(&id).cloned()
    }

    pub fn offer_count(&self) -> usize {
        self.offers.read().len()
    }

    pub fn intent_count(&self) -> usize {
        self.intents.read().len()
    }
}
