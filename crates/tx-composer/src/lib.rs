//! Assembles a [`router_types::RoutingDecision`] into a single atomic
//! settlement transaction (spec §4.5): direct fills, intent-bound fills,
//! and generic composite splits across native and external legs.

mod composer;
mod targets;

pub use composer::Composer;
pub use targets::{GasBudgets, ProtocolTargets};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use chain_client::{mock::RecordingTxBuilder, MoveCallTarget, ObjectRef};
    use router_types::{
        Address, AssetPair, AssetType, DecryptedIntentParams, ObjectId, OfferId, QuoteMetadata,
        RoutingDecision, RoutingLeg, SCALE,
    };
    use venue_adapter::{mock::MockAdapter, NativeVenueAdapter, VenueAdapter};

    use super::*;

    fn clock() -> ObjectRef {
        ObjectRef {
            id: ObjectId::from_u64(0xc10c4),
            version: 1,
            digest: "clock".into(),
        }
    }

    fn object_ref(tag: u64) -> ObjectRef {
        ObjectRef {
            id: ObjectId::from_u64(tag),
            version: 1,
            digest: "obj".into(),
        }
    }

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

    fn pair() -> AssetPair {
        AssetPair::new(AssetType::new("SUI"), AssetType::new("USDC"))
    }

    fn native_decision(drains_offer: bool, fill: u64, pay: u64) -> RoutingDecision {
        RoutingDecision {
            pair: pair(),
            total_receive_amount: fill,
            total_pay_amount: pay,
            blended_price: SCALE,
            is_split: false,
            computed_at: 0,
            legs: vec![RoutingLeg {
                fill_amount: fill,
                pay_amount: pay,
                effective_price: SCALE,
                metadata: QuoteMetadata::Native {
                    offer_id: OfferId::from_u64(1),
                    drains_offer,
                },
            }],
        }
    }

    fn composer_with(native: NativeVenueAdapter, externals: Vec<Arc<dyn VenueAdapter>>) -> Composer {
        Composer::new(Arc::new(native), externals, targets(), GasBudgets::default(), 50)
    }

    fn native_adapter() -> NativeVenueAdapter {
        NativeVenueAdapter::new(targets().fill_full, targets().fill_partial)
    }

    #[test]
    fn direct_fill_drains_offer_uses_fill_full_and_transfers_output() {
        let composer = composer_with(native_adapter(), Vec::new());
        let decision = native_decision(true, 100, 100);
        let mut builder = RecordingTxBuilder::new();
        let output = composer
            .compose_direct_fill(
                &decision,
                object_ref(1),
                clock(),
                chain_client::CoinHandle(0),
                Address::from_u64(9),
                &mut builder,
            )
            .unwrap();
        assert_eq!(builder.move_call_count("fill_full"), 1);
        assert!(builder
            .ops
            .iter()
            .any(|op| matches!(op, chain_client::mock::TxOp::Transfer { object, .. } if *object == output)));
        assert_eq!(builder.gas_budget, Some(GasBudgets::default().direct));
    }

    #[test]
    fn direct_fill_rejects_a_non_native_decision() {
        let composer = composer_with(native_adapter(), Vec::new());
        let decision = RoutingDecision {
            pair: pair(),
            total_receive_amount: 10,
            total_pay_amount: 10,
            blended_price: SCALE,
            is_split: false,
            computed_at: 0,
            legs: vec![RoutingLeg {
                fill_amount: 10,
                pay_amount: 10,
                effective_price: SCALE,
                metadata: QuoteMetadata::External {
                    venue: "amm",
                    payload: Vec::new(),
                },
            }],
        };
        let mut builder = RecordingTxBuilder::new();
        assert!(composer
            .compose_direct_fill(
                &decision,
                object_ref(1),
                clock(),
                chain_client::CoinHandle(0),
                Address::from_u64(9),
                &mut builder,
            )
            .is_err());
    }

    #[test]
    fn intent_bound_fill_plain_uses_execute_against_offer() {
        let composer = composer_with(native_adapter(), Vec::new());
        let decision = native_decision(false, 40, 40);
        let mut builder = RecordingTxBuilder::new();
        composer
            .compose_intent_bound_fill(
                &decision,
                object_ref(2),
                object_ref(1),
                object_ref(3),
                clock(),
                chain_client::CoinHandle(0),
                Address::from_u64(9),
                None,
                &mut builder,
            )
            .unwrap();
        assert_eq!(builder.move_call_count("execute_against_offer"), 1);
        assert_eq!(builder.move_call_count("execute_against_offer_encrypted"), 0);
    }

    #[test]
    fn intent_bound_fill_encrypted_passes_decrypted_params_and_uses_encrypted_target() {
        let composer = composer_with(native_adapter(), Vec::new());
        let decision = native_decision(false, 40, 40);
        let mut builder = RecordingTxBuilder::new();
        composer
            .compose_intent_bound_fill(
                &decision,
                object_ref(2),
                object_ref(1),
                object_ref(3),
                clock(),
                chain_client::CoinHandle(0),
                Address::from_u64(9),
                Some(DecryptedIntentParams {
                    receive_amount: 40,
                    min_price: SCALE,
                    max_price: 2 * SCALE,
                }),
                &mut builder,
            )
            .unwrap();
        assert_eq!(builder.move_call_count("execute_against_offer_encrypted"), 1);
        let args_len = builder
            .ops
            .iter()
            .find_map(|op| match op {
                chain_client::mock::TxOp::MoveCall { target, args, .. }
                    if target.function == "execute_against_offer_encrypted" =>
                {
                    Some(args.len())
                }
                _ => None,
            })
            .unwrap();
        // 7 base args plus 3 decrypted params.
        assert_eq!(args_len, 10);
    }

    #[test]
    fn composite_merges_native_and_external_legs_into_one_transfer() {
        let external: Arc<dyn VenueAdapter> = Arc::new(MockAdapter::new("amm"));
        let composer = composer_with(native_adapter(), vec![external]);
        let decision = RoutingDecision {
            pair: pair(),
            total_receive_amount: 100,
            total_pay_amount: 100,
            blended_price: SCALE,
            is_split: true,
            computed_at: 0,
            legs: vec![
                RoutingLeg {
                    fill_amount: 50,
                    pay_amount: 50,
                    effective_price: SCALE,
                    metadata: QuoteMetadata::Native {
                        offer_id: OfferId::from_u64(1),
                        drains_offer: true,
                    },
                },
                RoutingLeg {
                    fill_amount: 50,
                    pay_amount: 50,
                    effective_price: SCALE,
                    metadata: QuoteMetadata::External {
                        venue: "amm",
                        payload: Vec::new(),
                    },
                },
            ],
        };
        let mut offer_refs = HashMap::new();
        offer_refs.insert(OfferId::from_u64(1), object_ref(1));
        let mut builder = RecordingTxBuilder::new();
        let output = composer
            .compose_composite(
                &decision,
                &offer_refs,
                clock(),
                chain_client::CoinHandle(0),
                Address::from_u64(9),
                &mut builder,
            )
            .unwrap();
        assert_eq!(builder.move_call_count("fill_full"), 1);
        assert!(builder
            .ops
            .iter()
            .any(|op| matches!(op, chain_client::mock::TxOp::MergeCoins { .. })));
        assert!(builder
            .ops
            .iter()
            .any(|op| matches!(op, chain_client::mock::TxOp::Transfer { object, .. } if *object == output)));
        assert_eq!(builder.gas_budget, Some(GasBudgets::default().composite));
    }

    #[test]
    fn composite_fails_closed_when_external_adapter_cannot_build_a_fragment() {
        let external: Arc<dyn VenueAdapter> = Arc::new(MockAdapter::new("amm").failing_fragments());
        let composer = composer_with(native_adapter(), vec![external]);
        let decision = RoutingDecision {
            pair: pair(),
            total_receive_amount: 50,
            total_pay_amount: 50,
            blended_price: SCALE,
            is_split: false,
            computed_at: 0,
            legs: vec![RoutingLeg {
                fill_amount: 50,
                pay_amount: 50,
                effective_price: SCALE,
                metadata: QuoteMetadata::External {
                    venue: "amm",
                    payload: Vec::new(),
                },
            }],
        };
        let mut builder = RecordingTxBuilder::new();
        assert!(composer
            .compose_composite(
                &decision,
                &HashMap::new(),
                clock(),
                chain_client::CoinHandle(0),
                Address::from_u64(9),
                &mut builder,
            )
            .is_err());
    }

    #[test]
    fn composite_rejects_a_native_leg_with_no_known_object_ref() {
        let composer = composer_with(native_adapter(), Vec::new());
        let decision = native_decision(true, 50, 50);
        let mut builder = RecordingTxBuilder::new();
        assert!(composer
            .compose_composite(
                &decision,
                &HashMap::new(),
                clock(),
                chain_client::CoinHandle(0),
                Address::from_u64(9),
                &mut builder,
            )
            .is_err());
    }
}
