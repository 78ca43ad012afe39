use crate::{
    asset::AssetType,
    ids::{Address, IntentId, OfferId},
    offer::FillPolicy,
    price::{ScaledPrice, TimestampMs},
};

/// Payload of an `OfferCreated[V2]` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferCreated {
    pub offer_id: OfferId,
    pub maker: Address,
    pub offer_asset: AssetType,
    pub want_asset: AssetType,
    pub initial_amount: u64,
    pub min_price: ScaledPrice,
    pub max_price: ScaledPrice,
    pub fill_policy: FillPolicy,
    pub min_fill_amount: u64,
    pub expiry_ms: TimestampMs,
}

/// Payload of an `OfferFilled` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferFilled {
    pub offer_id: OfferId,
    pub fill_amount: u64,
    pub observed_at: TimestampMs,
}

/// Payload of an `OfferWithdrawn` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferWithdrawn {
    pub offer_id: OfferId,
    pub observed_at: TimestampMs,
}

/// Payload of an `OfferExpired` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferExpired {
    pub offer_id: OfferId,
    pub observed_at: TimestampMs,
}

/// Payload of an `IntentSubmitted[V2]` event, plaintext variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentSubmitted {
    pub intent_id: IntentId,
    pub creator: Address,
    pub receive_asset: AssetType,
    pub pay_asset: AssetType,
    pub receive_amount: u64,
    pub max_pay_amount: u64,
    pub min_price: ScaledPrice,
    pub max_price: ScaledPrice,
    pub expiry_ms: TimestampMs,
}

/// Payload of an `EncryptedIntentSubmitted` event: an opaque intent whose
/// real parameters live behind the confidentiality collaborator. The
/// sentinel fields are carried explicitly (always zero) so ingestion need
/// not special-case the shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedIntentSubmitted {
    pub intent_id: IntentId,
    pub creator: Address,
    pub receive_asset: AssetType,
    pub pay_asset: AssetType,
    pub expiry_ms: TimestampMs,
}

/// Payload of an `IntentExecuted` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentExecuted {
    pub intent_id: IntentId,
    pub observed_at: TimestampMs,
}

/// Payload of an `IntentCancelled` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentCancelled {
    pub intent_id: IntentId,
    pub observed_at: TimestampMs,
}

/// Payload of an `IntentExpired` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentExpired {
    pub intent_id: IntentId,
    pub observed_at: TimestampMs,
}

/// A parsed chain event (spec §6). `Unknown` absorbs any type tag the
/// ingestion worker doesn't recognize so the cache can skip it without
/// failing the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    OfferCreated(OfferCreated),
    OfferFilled(OfferFilled),
    OfferWithdrawn(OfferWithdrawn),
    OfferExpired(OfferExpired),
    IntentSubmitted(IntentSubmitted),
    EncryptedIntentSubmitted(EncryptedIntentSubmitted),
    IntentExecuted(IntentExecuted),
    IntentCancelled(IntentCancelled),
    IntentExpired(IntentExpired),
    /// A recognized-but-unhandled, or entirely unrecognized, event type tag.
    Unknown { type_tag: String },
}

impl ChainEvent {
    pub fn type_tag(&self) -> &str {
        match self {
            ChainEvent::OfferCreated(_) => "OfferCreated",
            ChainEvent::OfferFilled(_) => "OfferFilled",
            ChainEvent::OfferWithdrawn(_) => "OfferWithdrawn",
            ChainEvent::OfferExpired(_) => "OfferExpired",
            ChainEvent::IntentSubmitted(_) => "IntentSubmitted",
            ChainEvent::EncryptedIntentSubmitted(_) => "EncryptedIntentSubmitted",
            ChainEvent::IntentExecuted(_) => "IntentExecuted",
            ChainEvent::IntentCancelled(_) => "IntentCancelled",
            ChainEvent::IntentExpired(_) => "IntentExpired",
            ChainEvent::Unknown { type_tag } => type_tag,
        }
    }
}

/// A resumable position in the chain's event history, advanced
/// monotonically by the ingestion worker (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventCursor(pub u64);

impl EventCursor {
    pub fn advance_past(self, latest_seen: u64) -> Self {
        Self(self.0.max(latest_seen))
    }
}
