use serde::{Deserialize, Serialize};

use crate::{
    asset::AssetType,
    ids::{Address, IntentId},
    price::{ScaledPrice, TimestampMs},
};

/// Lifecycle status of an intent. Only `Pending` is non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentStatus {
    Pending,
    Executed,
    Cancelled,
    Expired,
}

/// A taker's bounded-price demand (spec §3).
///
/// When `receive_amount == 0 && min_price == 0 && max_price == 0` the intent
/// is opaque: its real parameters live behind the confidentiality
/// collaborator and must be retrieved by intent id before routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub intent_id: IntentId,
    pub creator: Address,
    pub receive_asset: AssetType,
    pub pay_asset: AssetType,
    pub receive_amount: u64,
    pub max_pay_amount: u64,
    pub min_price: ScaledPrice,
    pub max_price: ScaledPrice,
    pub expiry_ms: TimestampMs,
    pub status: IntentStatus,
}

impl Intent {
    /// The opaque sentinel: `receive_amount = min_price = max_price = 0`
    /// (spec §3, §6).
    pub fn is_opaque(&self) -> bool {
        self.receive_amount == 0 && self.min_price == 0 && self.max_price == 0
    }

    pub fn is_pending(&self, now_ms: TimestampMs) -> bool {
        self.status == IntentStatus::Pending && self.expiry_ms > now_ms
    }
}

/// The real parameters behind an opaque intent, as returned by the
/// confidentiality collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptedIntentParams {
    pub receive_amount: u64,
    pub min_price: ScaledPrice,
    pub max_price: ScaledPrice,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_intent() -> Intent {
        Intent {
            intent_id: IntentId::from_u64(1),
            creator: Address::from_u64(2),
            receive_asset: AssetType::new("0x2::sui::SUI"),
            pay_asset: AssetType::new("0x2::usdc::USDC"),
            receive_amount: 10,
            max_pay_amount: 20,
            min_price: 1_000_000_000,
            max_price: 2_000_000_000,
            expiry_ms: 1_000,
            status: IntentStatus::Pending,
        }
    }

    #[test]
    fn opaque_sentinel_detected() {
        let mut intent = base_intent();
        intent.receive_amount = 0;
        intent.min_price = 0;
        intent.max_price = 0;
        assert!(intent.is_opaque());
    }

    #[test]
    fn non_zero_amount_is_not_opaque() {
        assert!(!base_intent().is_opaque());
    }

    #[test]
    fn zero_price_bounds_alone_do_not_make_an_intent_opaque() {
        let mut intent = base_intent();
        intent.min_price = 0;
        intent.max_price = 0;
        // receive_amount is still non-zero, so this is a plain (non-opaque)
        // intent that merely allows any price.
        assert!(!intent.is_opaque());
    }
}
