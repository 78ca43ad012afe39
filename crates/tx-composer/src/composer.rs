use std::collections::HashMap;
use std::sync::Arc;

use chain_client::{CoinHandle, ObjectRef, TxArg, TxBuilder};
use router_types::{
    Address, DecryptedIntentParams, OfferId, QuoteMetadata, RouterError, RouterResult,
    RoutingDecision, RoutingLeg, VenueName,
};
use venue_adapter::{LegParams, NativeVenueAdapter, VenueAdapter};

use crate::targets::{GasBudgets, ProtocolTargets};

const BPS_DENOMINATOR: u128 = 10_000;

/// Turns a [`RoutingDecision`] into a single atomic settlement transaction
/// (spec §4.5). Every operation below builds one transaction end to end and
/// never submits it — submission is the `chain-client` boundary's job.
pub struct Composer {
    native_adapter: Arc<NativeVenueAdapter>,
    external_adapters: HashMap<VenueName, Arc<dyn VenueAdapter>>,
    targets: ProtocolTargets,
    gas: GasBudgets,
    slippage_bps: u32,
}

impl Composer {
    pub fn new(
        native_adapter: Arc<NativeVenueAdapter>,
        external_adapters: Vec<Arc<dyn VenueAdapter>>,
        targets: ProtocolTargets,
        gas: GasBudgets,
        slippage_bps: u32,
    ) -> Self {
        Self {
            native_adapter,
            external_adapters: external_adapters
                .into_iter()
                .map(|adapter| (adapter.name(), adapter))
                .collect(),
            targets,
            gas,
            slippage_bps,
        }
    }

    fn min_receive_amount(&self, fill_amount: u64) -> u64 {
        let bps = (self.slippage_bps as u128).min(BPS_DENOMINATOR);
        let reduced = (fill_amount as u128) * (BPS_DENOMINATOR - bps) / BPS_DENOMINATOR;
        reduced as u64
    }

    /// A single native leg filled with no intent bound to the executor —
    /// an operator drawing down an offer directly rather than on behalf of
    /// a taker's intent (spec §4.5, "direct fill").
    #[tracing::instrument(skip(self, builder), fields(pay_amount = decision.total_pay_amount))]
    pub fn compose_direct_fill(
        &self,
        decision: &RoutingDecision,
        offer_ref: ObjectRef,
        clock: ObjectRef,
        funding_coin: CoinHandle,
        recipient: Address,
        builder: &mut dyn TxBuilder,
    ) -> RouterResult<CoinHandle> {
        let leg = single_native_leg(decision)?;
        let drains_offer = match &leg.metadata {
            QuoteMetadata::Native { drains_offer, .. } => *drains_offer,
            QuoteMetadata::External { .. } => unreachable!("single_native_leg already checked"),
        };
        let target = if drains_offer {
            &self.targets.fill_full
        } else {
            &self.targets.fill_partial
        };
        let pay_coin = builder.split_coin(funding_coin, leg.pay_amount);
        let offer_arg = builder.object_ref(offer_ref);
        let clock_arg = builder.object_ref(clock);
        let amount_arg = builder.pure_u64(leg.pay_amount);
        let recipient_arg = builder.pure_address(recipient);
        let outputs = builder.move_call(
            target.clone(),
            vec![
                offer_arg,
                TxArg::Coin(pay_coin),
                amount_arg,
                recipient_arg,
                clock_arg,
            ],
        );
        let output = *outputs
            .first()
            .ok_or_else(|| RouterError::SubmissionFailed("fill move call produced no output".into()))?;
        builder.transfer(output, recipient);
        builder.set_gas_budget(self.gas.direct);
        Ok(output)
    }

    /// A single native leg settling a specific intent, at the price the
    /// router found (spec §4.5, "intent-bound fill"). `decrypted` is
    /// `Some` only for an opaque intent, whose recovered parameters are
    /// passed through as extra arguments to the encrypted variant of the
    /// move call (spec §4.7) — the router already validated the route
    /// against those decrypted bounds before this is called.
    #[tracing::instrument(skip(self, builder, decrypted), fields(pay_amount = decision.total_pay_amount))]
    #[allow(clippy::too_many_arguments)]
    pub fn compose_intent_bound_fill(
        &self,
        decision: &RoutingDecision,
        intent_ref: ObjectRef,
        offer_ref: ObjectRef,
        executor_cap_ref: ObjectRef,
        clock: ObjectRef,
        funding_coin: CoinHandle,
        recipient: Address,
        decrypted: Option<DecryptedIntentParams>,
        builder: &mut dyn TxBuilder,
    ) -> RouterResult<CoinHandle> {
        let leg = single_native_leg(decision)?;
        let pay_coin = builder.split_coin(funding_coin, leg.pay_amount);
        let offer_arg = builder.object_ref(offer_ref);
        let intent_arg = builder.object_ref(intent_ref);
        let cap_arg = builder.object_ref(executor_cap_ref);
        let clock_arg = builder.object_ref(clock);
        let price_arg = builder.pure_u64(leg.effective_price);
        let recipient_arg = builder.pure_address(recipient);

        let target = if decrypted.is_some() {
            &self.targets.execute_against_offer_encrypted
        } else {
            &self.targets.execute_against_offer
        };
        let mut args = vec![
            offer_arg,
            intent_arg,
            TxArg::Coin(pay_coin),
            price_arg,
            cap_arg,
            recipient_arg,
            clock_arg,
        ];
        if let Some(params) = decrypted {
            args.push(builder.pure_u64(params.receive_amount));
            args.push(builder.pure_u64(params.min_price));
            args.push(builder.pure_u64(params.max_price));
        }

        let outputs = builder.move_call(target.clone(), args);
        let output = *outputs
            .first()
            .ok_or_else(|| RouterError::SubmissionFailed("execute move call produced no output".into()))?;
        builder.transfer(output, recipient);
        builder.set_gas_budget(self.gas.direct);
        Ok(output)
    }

    /// The generic path: one funding coin split per leg (the last leg takes
    /// the remainder rather than an exact split, so no dust coin is left
    /// over), each leg handed to its adapter — the native adapter for
    /// native legs, the matching external adapter otherwise — and the
    /// resulting outputs merged into one coin and transferred to the
    /// recipient (spec §4.5, "composite split"). Used for any multi-leg
    /// route, and for a single external leg bound to an intent (there is no
    /// separate single-external intent-bound operation in spec §4.5; this
    /// path degrades to it cleanly since a 1-leg composite performs no
    /// split and no merge).
    #[tracing::instrument(skip(self, builder, offer_refs), fields(leg_count = decision.legs.len()))]
    pub fn compose_composite(
        &self,
        decision: &RoutingDecision,
        offer_refs: &HashMap<OfferId, ObjectRef>,
        clock: ObjectRef,
        funding_coin: CoinHandle,
        recipient: Address,
        builder: &mut dyn TxBuilder,
    ) -> RouterResult<CoinHandle> {
        if decision.legs.is_empty() {
            return Err(RouterError::RouteConstraintViolation(
                "composite route has no legs".into(),
            ));
        }
        let last_index = decision.legs.len() - 1;
        let mut outputs = Vec::with_capacity(decision.legs.len());
        for (index, leg) in decision.legs.iter().enumerate() {
            let input_coin = if index == last_index {
                funding_coin
            } else {
                builder.split_coin(funding_coin, leg.pay_amount)
            };
            let mut extra_refs = Vec::new();
            let adapter: &dyn VenueAdapter = if let QuoteMetadata::Native { offer_id, .. } = &leg.metadata {
                let offer_ref = offer_refs.get(offer_id).cloned().ok_or_else(|| {
                    RouterError::RouteConstraintViolation(format!(
                        "missing object ref for native offer {offer_id}"
                    ))
                })?;
                extra_refs.push(offer_ref);
                self.native_adapter.as_ref()
            } else {
                self.external_adapters
                    .get(&leg.metadata.venue())
                    .ok_or_else(|| {
                        RouterError::VenueUnavailable(format!(
                            "no adapter configured for venue {}",
                            leg.metadata.venue()
                        ))
                    })?
                    .as_ref()
            };
            let params = LegParams {
                input_coin,
                pay_amount: leg.pay_amount,
                min_receive_amount: self.min_receive_amount(leg.fill_amount),
                recipient,
                metadata: leg.metadata.clone(),
                extra_refs,
                clock: clock.clone(),
            };
            let fragment = adapter.build_fragment(builder, &params).ok_or_else(|| {
                RouterError::VenueUnavailable(format!(
                    "venue {} failed to build a settlement fragment",
                    leg.metadata.venue()
                ))
            })?;
            outputs.push(fragment.output_handle);
        }
        let merged = outputs[0];
        if outputs.len() > 1 {
            builder.merge_coins(merged, outputs[1..].to_vec());
        }
        builder.transfer(merged, recipient);
        builder.set_gas_budget(self.gas.composite);
        Ok(merged)
    }
}

fn single_native_leg(decision: &RoutingDecision) -> RouterResult<&RoutingLeg> {
    match decision.legs.as_slice() {
        [leg] if leg.is_native() => Ok(leg),
        [_] => Err(RouterError::RouteConstraintViolation(
            "expected a native leg for this operation".into(),
        )),
        _ => Err(RouterError::RouteConstraintViolation(
            "expected exactly one leg for this operation".into(),
        )),
    }
}
