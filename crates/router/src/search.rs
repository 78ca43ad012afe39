use std::sync::Arc;

use router_types::{
    AssetPair, FillPolicy, Offer, QuoteMetadata, RouterError, RouterResult, RoutingDecision,
    RoutingLeg, ScaledPrice, TimestampMs, VenueQuote,
};
use venue_adapter::VenueAdapter;

use liquidity_cache::LiquidityCache;

use crate::config::RouterConfig;

/// A native leg paired with the offer's `min_fill_amount`, needed to decide
/// whether an all-native candidate's overfill is admissible (spec §4.4.3)
/// without widening [`RoutingLeg`] itself with a field only this module
/// needs.
struct NativeLeg {
    leg: RoutingLeg,
    min_fill_amount: u64,
}

/// Finds the cheapest [`RoutingDecision`] covering `receive_amount` of
/// `pair.receive` paid for in `pair.pay`, or `None` if no combination of
/// native and external liquidity satisfies the constraints — a regular
/// outcome, not an error (spec §4.4, "Failure semantics").
pub struct Router {
    cache: Arc<LiquidityCache>,
    adapters: Vec<Arc<dyn VenueAdapter>>,
    config: RouterConfig,
}

impl Router {
    pub fn new(
        cache: Arc<LiquidityCache>,
        adapters: Vec<Arc<dyn VenueAdapter>>,
        config: RouterConfig,
    ) -> Self {
        Self {
            cache,
            adapters,
            config,
        }
    }

    #[tracing::instrument(
        skip(self, pair),
        fields(
            pair = %format!("{}/{}", pair.receive, pair.pay),
            receive_amount,
            leg_count = tracing::field::Empty,
            total_pay = tracing::field::Empty,
        )
    )]
    pub async fn search(
        &self,
        pair: &AssetPair,
        receive_amount: u64,
        now_ms: TimestampMs,
    ) -> Option<RoutingDecision> {
        let native_legs = self.build_native_legs(pair, receive_amount, now_ms);
        let external_quotes = self.fan_out_external_quotes(pair, receive_amount).await;

        let mut candidates = Vec::new();
        if let Some(decision) =
            self.all_native_candidate(pair, receive_amount, &native_legs, now_ms)
        {
            candidates.push(decision);
        }
        for quote in &external_quotes {
            if let Some(decision) = self.single_external_candidate(pair, quote, now_ms) {
                candidates.push(decision);
            }
        }
        if self.config.enable_splits {
            for quote in &external_quotes {
                if let Some(decision) =
                    self.split_candidate(pair, receive_amount, &native_legs, quote, now_ms)
                {
                    candidates.push(decision);
                }
            }
        }

        let winner = self.rank(candidates);
        if let Some(decision) = &winner {
            tracing::Span::current().record("leg_count", decision.leg_count());
            tracing::Span::current().record("total_pay", decision.total_pay_amount);
        }
        winner
    }

    /// Walks `activeOffers` in sorted order, deciding each candidate's fill
    /// per the table in spec §4.4.1, until the target is covered or
    /// `max_native_legs` is reached.
    fn build_native_legs(
        &self,
        pair: &AssetPair,
        receive_amount: u64,
        now_ms: TimestampMs,
    ) -> Vec<NativeLeg> {
        let offers = self.cache.active_offers(&pair.receive, &pair.pay, now_ms);
        let mut legs = Vec::new();
        let mut need = receive_amount;
        for offer in offers {
            if legs.len() >= self.config.max_native_legs || need == 0 {
                break;
            }
            let Some(fill) = decide_fill(need, &offer) else {
                continue;
            };
            if fill == 0 {
                continue;
            }
            let Ok(pay_amount) = pricing_kernel::payment(fill, offer.max_price) else {
                continue;
            };
            let Ok(effective_price) = pricing_kernel::effective_price_ceil(fill, pay_amount)
            else {
                continue;
            };
            legs.push(NativeLeg {
                leg: RoutingLeg {
                    fill_amount: fill,
                    pay_amount,
                    effective_price,
                    metadata: QuoteMetadata::Native {
                        offer_id: offer.offer_id,
                        drains_offer: fill == offer.remaining_amount,
                    },
                },
                min_fill_amount: offer.min_fill_amount,
            });
            need = need.saturating_sub(fill);
        }
        legs
    }

    /// Fans out `get_detailed_quote` to every configured venue with a
    /// per-venue deadline; a timeout or `None` is a permanent miss for this
    /// search (spec §4.4.2).
    async fn fan_out_external_quotes(
        &self,
        pair: &AssetPair,
        receive_amount: u64,
    ) -> Vec<VenueQuote> {
        let queries = self.adapters.iter().map(|adapter| {
            let adapter = adapter.clone();
            let receive = pair.receive.clone();
            let pay = pair.pay.clone();
            let deadline = self.config.quote_deadline;
            async move {
                match tokio::time::timeout(
                    deadline,
                    adapter.get_detailed_quote(&receive, &pay, receive_amount),
                )
                .await
                {
                    Ok(quote) => quote,
                    Err(_) => {
                        tracing::warn!(venue = adapter.name(), "venue quote timed out, skipping");
                        None
                    }
                }
            }
        });
        futures::future::join_all(queries)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Admissible only if the walked native legs cover the target exactly
    /// or within a small positive overfill bounded by the last leg's
    /// `min_fill_amount` (spec §4.4.3, candidate 1).
    fn all_native_candidate(
        &self,
        pair: &AssetPair,
        receive_amount: u64,
        native: &[NativeLeg],
        now_ms: TimestampMs,
    ) -> Option<RoutingDecision> {
        let last = native.last()?;
        let total_receive: u64 = native.iter().map(|n| n.leg.fill_amount).sum();
        if total_receive < receive_amount {
            return None;
        }
        let overfill = total_receive - receive_amount;
        if overfill > last.min_fill_amount {
            return None;
        }
        let legs: Vec<RoutingLeg> = native.iter().map(|n| n.leg.clone()).collect();
        Some(build_decision(pair, legs, total_receive, now_ms))
    }

    /// One leg covering the target at a single external venue (spec §4.4.3,
    /// candidate 2).
    fn single_external_candidate(
        &self,
        pair: &AssetPair,
        quote: &VenueQuote,
        now_ms: TimestampMs,
    ) -> Option<RoutingDecision> {
        let leg = RoutingLeg {
            fill_amount: quote.receive_amount,
            pay_amount: quote.pay_amount,
            effective_price: quote.effective_price,
            metadata: quote.metadata.clone(),
        };
        Some(build_decision(
            pair,
            vec![leg],
            quote.receive_amount,
            now_ms,
        ))
    }

    /// Keeps the prefix of native legs cheaper than `quote`, letting the
    /// venue absorb the residual at its quoted (assumed-linear) price (spec
    /// §4.4.3, candidate 3).
    fn split_candidate(
        &self,
        pair: &AssetPair,
        receive_amount: u64,
        native: &[NativeLeg],
        quote: &VenueQuote,
        now_ms: TimestampMs,
    ) -> Option<RoutingDecision> {
        let mut prefix = Vec::new();
        let mut covered = 0u64;
        for nl in native {
            if nl.leg.effective_price >= quote.effective_price {
                break;
            }
            covered += nl.leg.fill_amount;
            prefix.push(nl.leg.clone());
        }
        if covered >= receive_amount {
            return None;
        }
        let residual = receive_amount - covered;
        if residual < self.config.min_leg_amount {
            return None;
        }
        let residual_pay = pricing_kernel::payment(residual, quote.effective_price).ok()?;
        prefix.push(RoutingLeg {
            fill_amount: residual,
            pay_amount: residual_pay,
            effective_price: quote.effective_price,
            metadata: quote.metadata.clone(),
        });
        Some(build_decision(pair, prefix, receive_amount, now_ms))
    }

    /// Ranks by `total_pay_amount` ascending, then fewer legs, then the
    /// configured native-biased preference (spec §4.4.3).
    fn rank(&self, candidates: Vec<RoutingDecision>) -> Option<RoutingDecision> {
        candidates.into_iter().min_by(|a, b| {
            a.total_pay_amount
                .cmp(&b.total_pay_amount)
                .then_with(|| a.leg_count().cmp(&b.leg_count()))
                .then_with(|| self.native_bias_key(a).cmp(&self.native_bias_key(b)))
        })
    }

    /// Checks a found route against the intent it will settle (spec §8):
    /// total cost within budget, blended price within the intent's bounds,
    /// and every native leg priced at or above the source offer's own
    /// floor. Called by the engine after `search` and before composing a
    /// transaction — a route search can be cheapest-of-candidates and still
    /// fail this check if the intent's bounds are tighter than the market.
    pub fn validate_against_intent(
        &self,
        decision: &RoutingDecision,
        min_price: ScaledPrice,
        max_price: ScaledPrice,
        max_pay_amount: u64,
    ) -> RouterResult<()> {
        if decision.total_pay_amount > max_pay_amount {
            return Err(RouterError::RouteConstraintViolation(format!(
                "total_pay_amount {} exceeds max_pay_amount {max_pay_amount}",
                decision.total_pay_amount
            )));
        }
        if !pricing_kernel::price_in_bounds(decision.blended_price, min_price, max_price) {
            return Err(RouterError::RouteConstraintViolation(format!(
                "blended_price {} outside [{min_price}, {max_price}]",
                decision.blended_price
            )));
        }
        for leg in &decision.legs {
            let QuoteMetadata::Native { offer_id, .. } = &leg.metadata else {
                continue;
            };
            let Some(offer) = self.cache.get_offer(*offer_id) else {
                return Err(RouterError::RouteConstraintViolation(format!(
                    "native leg references unknown offer {offer_id}"
                )));
            };
            if leg.effective_price < offer.min_price {
                return Err(RouterError::RouteConstraintViolation(format!(
                    "leg effective_price {} undercuts offer {offer_id}'s min_price {}",
                    leg.effective_price, offer.min_price
                )));
            }
        }
        Ok(())
    }

    /// Smaller key wins. When a preference bias is configured, a candidate
    /// with more native-sourced `pay_amount` sorts first; with no bias
    /// configured every candidate compares equal here and the first
    /// encountered order (native, then external, then splits) stands.
    fn native_bias_key(&self, decision: &RoutingDecision) -> i64 {
        if self.config.native_preference_bps == 0 {
            return 0;
        }
        let native_pay: i64 = decision
            .legs
            .iter()
            .filter(|leg| leg.is_native())
            .map(|leg| leg.pay_amount as i64)
            .sum();
        -native_pay
    }
}

/// Applies the spec §4.4.1 fill decision table for one candidate offer,
/// returning `None` when the offer must be skipped.
fn decide_fill(need: u64, offer: &Offer) -> Option<u64> {
    let available = offer.remaining_amount;
    if need >= available {
        return Some(available);
    }
    if offer.fill_policy == FillPolicy::FullOnly {
        return None;
    }
    if pricing_kernel::would_leave_dust(available, need, offer.min_fill_amount) {
        return Some(available);
    }
    if need < offer.min_fill_amount {
        return None;
    }
    Some(need)
}

fn build_decision(
    pair: &AssetPair,
    legs: Vec<RoutingLeg>,
    total_receive_amount: u64,
    now_ms: TimestampMs,
) -> RoutingDecision {
    let total_pay_amount: u64 = legs.iter().map(|leg| leg.pay_amount).sum();
    let blended_price: ScaledPrice =
        pricing_kernel::price_from_fill_pay(total_receive_amount, total_pay_amount).unwrap_or(0);
    RoutingDecision {
        pair: pair.clone(),
        total_receive_amount,
        total_pay_amount,
        blended_price,
        is_split: legs.len() > 1,
        legs,
        computed_at: now_ms,
    }
}
