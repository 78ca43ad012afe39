use crate::{asset::AssetPair, price::ScaledPrice, quote::QuoteMetadata};

/// One venue's contribution to a route (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingLeg {
    pub fill_amount: u64,
    pub pay_amount: u64,
    pub effective_price: ScaledPrice,
    pub metadata: QuoteMetadata,
}

impl RoutingLeg {
    pub fn is_native(&self) -> bool {
        self.metadata.is_native()
    }
}

/// The router's output for a single search: an ordered, possibly-split set
/// of legs covering the requested amount at the lowest total cost found
/// (spec §3, §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub pair: AssetPair,
    pub total_receive_amount: u64,
    pub total_pay_amount: u64,
    pub blended_price: ScaledPrice,
    pub legs: Vec<RoutingLeg>,
    pub is_split: bool,
    pub computed_at: crate::price::TimestampMs,
}

impl RoutingDecision {
    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }
}
