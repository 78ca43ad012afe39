//! Wraps the protocol's own `fill_full`/`fill_partial` move calls behind the
//! [`VenueAdapter`] contract, so the composer's composite-split assembly
//! (spec §4.5) can treat a native leg the same way as an external one.

use async_trait::async_trait;
use chain_client::{MoveCallTarget, TxArg, TxBuilder};
use router_types::{AssetType, QuoteMetadata, ScaledPrice, VenueName, VenueQuote, NATIVE_VENUE};

use crate::adapter::{Fragment, LegParams, VenueAdapter};

/// Emits `fill_full` or `fill_partial` for a native-book leg, chosen by the
/// `drains_offer` flag the router attaches to [`QuoteMetadata::Native`].
/// Only `build_fragment` is ever exercised in this role — native quotes
/// reach the router through the liquidity cache directly, never through
/// `get_price`/`get_detailed_quote`, which always report no liquidity here.
pub struct NativeVenueAdapter {
    fill_full: MoveCallTarget,
    fill_partial: MoveCallTarget,
}

impl NativeVenueAdapter {
    pub fn new(fill_full: MoveCallTarget, fill_partial: MoveCallTarget) -> Self {
        Self {
            fill_full,
            fill_partial,
        }
    }
}

#[async_trait]
impl VenueAdapter for NativeVenueAdapter {
    fn name(&self) -> VenueName {
        NATIVE_VENUE
    }

    async fn get_price(
        &self,
        _receive: &AssetType,
        _pay: &AssetType,
        _receive_amount: u64,
    ) -> Option<ScaledPrice> {
        None
    }

    async fn get_detailed_quote(
        &self,
        _receive: &AssetType,
        _pay: &AssetType,
        _receive_amount: u64,
    ) -> Option<VenueQuote> {
        None
    }

    fn build_fragment(&self, builder: &mut dyn TxBuilder, leg: &LegParams) -> Option<Fragment> {
        let QuoteMetadata::Native { drains_offer, .. } = &leg.metadata else {
            tracing::warn!("native adapter handed a non-native leg, refusing to build a fragment");
            return None;
        };
        let offer_ref = leg.extra_refs.first()?.clone();
        let target = if *drains_offer {
            &self.fill_full
        } else {
            &self.fill_partial
        };
        let offer_arg = builder.object_ref(offer_ref);
        let clock_arg = builder.object_ref(leg.clock.clone());
        let amount_arg = builder.pure_u64(leg.pay_amount);
        let recipient_arg = builder.pure_address(leg.recipient);
        let outputs = builder.move_call(
            target.clone(),
            vec![
                offer_arg,
                TxArg::Coin(leg.input_coin),
                amount_arg,
                recipient_arg,
                clock_arg,
            ],
        );
        let output_handle = *outputs.first()?;
        Some(Fragment {
            output_handle,
            description: format!(
                "native {} fill for {}",
                if *drains_offer { "full" } else { "partial" },
                leg.pay_amount
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use chain_client::{mock::RecordingTxBuilder, CoinHandle, ObjectRef};
    use router_types::{Address, ObjectId, OfferId};

    use super::*;

    fn targets() -> NativeVenueAdapter {
        NativeVenueAdapter::new(
            MoveCallTarget::new("0xproto", "offer", "fill_full"),
            MoveCallTarget::new("0xproto", "offer", "fill_partial"),
        )
    }

    fn clock() -> ObjectRef {
        ObjectRef {
            id: ObjectId::from_u64(0xc10c4),
            version: 1,
            digest: "clock".into(),
        }
    }

    fn leg(drains_offer: bool) -> LegParams {
        LegParams {
            input_coin: CoinHandle(0),
            pay_amount: 40,
            min_receive_amount: 38,
            recipient: Address::from_u64(9),
            metadata: QuoteMetadata::Native {
                offer_id: OfferId::from_u64(1),
                drains_offer,
            },
            extra_refs: vec![ObjectRef {
                id: ObjectId::from_u64(1),
                version: 1,
                digest: "offer".into(),
            }],
            clock: clock(),
        }
    }

    #[test]
    fn drains_offer_picks_fill_full() {
        let adapter = targets();
        let mut builder = RecordingTxBuilder::new();
        let fragment = adapter.build_fragment(&mut builder, &leg(true)).unwrap();
        assert_eq!(builder.move_call_count("fill_full"), 1);
        assert_eq!(builder.move_call_count("fill_partial"), 0);
        assert!(fragment.description.contains("full"));
    }

    #[test]
    fn partial_fill_picks_fill_partial() {
        let adapter = targets();
        let mut builder = RecordingTxBuilder::new();
        adapter.build_fragment(&mut builder, &leg(false)).unwrap();
        assert_eq!(builder.move_call_count("fill_partial"), 1);
        assert_eq!(builder.move_call_count("fill_full"), 0);
    }

    #[tokio::test]
    async fn quote_methods_always_degrade_to_none() {
        let adapter = targets();
        let receive = AssetType::new("SUI");
        let pay = AssetType::new("USDC");
        assert!(adapter.get_price(&receive, &pay, 10).await.is_none());
        assert!(adapter.get_detailed_quote(&receive, &pay, 10).await.is_none());
    }

    #[test]
    fn missing_offer_ref_yields_no_fragment() {
        let adapter = targets();
        let mut builder = RecordingTxBuilder::new();
        let mut leg = leg(true);
        leg.extra_refs.clear();
        assert!(adapter.build_fragment(&mut builder, &leg).is_none());
    }
}
