use serde::{Deserialize, Serialize};

use crate::{
    asset::AssetType,
    ids::{Address, OfferId},
    price::{ScaledPrice, TimestampMs},
};

/// How an offer's remaining amount may be consumed by fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPolicy {
    /// The offer can only be taken in full.
    FullOnly,
    /// Any amount up to `remaining_amount` may be taken.
    Partial,
    /// Like `Partial`, but subject to additional on-chain gating the router
    /// treats identically to `Partial` (the gate is enforced on-chain, not
    /// by the router).
    PartialGated,
}

impl FillPolicy {
    /// The numeric encoding the protocol's move-call surface expects
    /// (spec §6).
    pub fn as_move_arg(self) -> u8 {
        match self {
            FillPolicy::FullOnly => 0,
            FillPolicy::Partial => 1,
            FillPolicy::PartialGated => 2,
        }
    }
}

/// Lifecycle status of an offer. `Filled`, `Expired` and `Withdrawn` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    Created,
    PartiallyFilled,
    Filled,
    Expired,
    Withdrawn,
}

impl OfferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OfferStatus::Filled | OfferStatus::Expired | OfferStatus::Withdrawn
        )
    }
}

/// A maker's escrowed supply of one asset at a bounded price band (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub offer_id: OfferId,
    pub maker: Address,
    pub offer_asset: AssetType,
    pub want_asset: AssetType,
    pub initial_amount: u64,
    pub remaining_amount: u64,
    pub min_price: ScaledPrice,
    pub max_price: ScaledPrice,
    pub fill_policy: FillPolicy,
    pub min_fill_amount: u64,
    pub expiry_ms: TimestampMs,
    pub status: OfferStatus,
    pub total_filled: u64,
    pub fill_count: u32,
    pub last_updated_at: TimestampMs,
}

impl Offer {
    pub fn is_active(&self, now_ms: TimestampMs) -> bool {
        matches!(self.status, OfferStatus::Created | OfferStatus::PartiallyFilled)
            && self.expiry_ms > now_ms
            && self.remaining_amount > 0
    }

    /// Applies a fill of `fill_amount` at `effective_price`, returning the
    /// updated offer. Exhausting the remaining amount transitions the
    /// status to `Filled`; a partial fill that leaves a remainder moves
    /// `Created` to `PartiallyFilled`.
    pub fn apply_fill(&self, fill_amount: u64, now_ms: TimestampMs) -> Offer {
        let mut updated = self.clone();
        updated.remaining_amount = updated.remaining_amount.saturating_sub(fill_amount);
        updated.total_filled += fill_amount;
        updated.fill_count += 1;
        updated.last_updated_at = now_ms;
        updated.status = if updated.remaining_amount == 0 {
            OfferStatus::Filled
        } else {
            OfferStatus::PartiallyFilled
        };
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_offer() -> Offer {
        Offer {
            offer_id: OfferId::from_u64(1),
            maker: Address::from_u64(2),
            offer_asset: AssetType::new("0x2::sui::SUI"),
            want_asset: AssetType::new("0x2::usdc::USDC"),
            initial_amount: 100,
            remaining_amount: 100,
            min_price: 1_000_000_000,
            max_price: 1_500_000_000,
            fill_policy: FillPolicy::Partial,
            min_fill_amount: 1,
            expiry_ms: 1_000,
            status: OfferStatus::Created,
            total_filled: 0,
            fill_count: 0,
            last_updated_at: 0,
        }
    }

    #[test]
    fn fill_transitions_to_filled_when_exhausted() {
        let offer = base_offer();
        let filled = offer.apply_fill(100, 10);
        assert_eq!(filled.status, OfferStatus::Filled);
        assert_eq!(filled.remaining_amount, 0);
    }

    #[test]
    fn partial_fill_transitions_to_partially_filled() {
        let offer = base_offer();
        let filled = offer.apply_fill(40, 10);
        assert_eq!(filled.status, OfferStatus::PartiallyFilled);
        assert_eq!(filled.remaining_amount, 60);
        assert_eq!(filled.total_filled, 40);
    }

    #[test]
    fn expired_offer_is_not_active() {
        let mut offer = base_offer();
        offer.expiry_ms = 5;
        assert!(!offer.is_active(10));
    }

    #[test]
    fn withdrawn_offer_is_not_active_even_with_remaining_balance() {
        let mut offer = base_offer();
        offer.status = OfferStatus::Withdrawn;
        assert!(!offer.is_active(0));
    }
}
