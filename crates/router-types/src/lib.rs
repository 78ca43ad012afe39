//! Shared domain types for the execution router: offers, intents, quotes,
//! routing decisions, chain events, and the error taxonomy every other
//! crate in the workspace converts into at its boundary.

mod asset;
mod decision;
mod error;
mod event;
mod ids;
mod intent;
mod offer;
mod price;
mod quote;

pub use asset::{AssetPair, AssetType};
pub use decision::{RoutingDecision, RoutingLeg};
pub use error::{RouterError, RouterResult};
pub use event::{
    ChainEvent, EncryptedIntentSubmitted, EventCursor, IntentCancelled, IntentExecuted,
    IntentExpired, IntentSubmitted, OfferCreated, OfferExpired, OfferFilled, OfferWithdrawn,
};
pub use ids::{Address, InvalidObjectId, IntentId, ObjectId, OfferId};
pub use intent::{DecryptedIntentParams, Intent, IntentStatus};
pub use offer::{FillPolicy, Offer, OfferStatus};
pub use price::{ScaledPrice, TimestampMs, SCALE};
pub use quote::{QuoteMetadata, VenueName, VenueQuote, NATIVE_VENUE};
