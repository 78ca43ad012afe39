use async_trait::async_trait;
use chain_client::{CoinHandle, ObjectRef, TxBuilder};
use router_types::{Address, AssetType, QuoteMetadata, ScaledPrice, VenueName, VenueQuote};

/// Parameters the composer hands a venue adapter to emit one settlement
/// fragment for a leg the router already selected (spec §4.2).
#[derive(Debug, Clone)]
pub struct LegParams {
    /// The coin to spend, already split to exactly `pay_amount`.
    pub input_coin: CoinHandle,
    pub pay_amount: u64,
    /// The minimum acceptable output, derived from the quoted price and the
    /// adapter's configured slippage tolerance — must match the promise the
    /// quote made (spec §4.2, "so the composer's min-out parameter matches
    /// the quote promise").
    pub min_receive_amount: u64,
    pub recipient: Address,
    /// The venue-specific payload from the [`VenueQuote`] this leg was
    /// built from.
    pub metadata: QuoteMetadata,
    /// Object references the adapter needs beyond the input coin — for a
    /// native leg, the offer object being filled.
    pub extra_refs: Vec<ObjectRef>,
    /// The shared clock object every time-sensitive move call takes (spec
    /// §6).
    pub clock: ObjectRef,
}

/// A venue-specific settlement fragment emitted into the transaction being
/// composed.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub output_handle: CoinHandle,
    pub description: String,
}

/// The uniform interface every external venue (and the native offer book,
/// via a thin wrapper) implements (spec §4.2).
///
/// Contract: adapters are stateless across requests aside from a bounded-TTL
/// local cache; any error (network, missing pool, insufficient depth, a
/// missing SDK dependency) degrades to `None` rather than raising — from
/// the router's point of view a disabled adapter and an adapter with no
/// liquidity for this pair are indistinguishable (spec §9, "Replacing
/// dynamic adapter loading").
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    /// Stable adapter name, used as the venue tag on every quote/leg it
    /// produces.
    fn name(&self) -> VenueName;

    /// A cheap quote used during route search: the effective price for
    /// receiving `receive_amount`, including this venue's slippage and fee
    /// model. `None` means "no liquidity" — permanent for this search.
    async fn get_price(
        &self,
        receive: &AssetType,
        pay: &AssetType,
        receive_amount: u64,
    ) -> Option<ScaledPrice>;

    /// A richer quote carrying the opaque metadata the composer will later
    /// need to emit a settlement fragment.
    async fn get_detailed_quote(
        &self,
        receive: &AssetType,
        pay: &AssetType,
        receive_amount: u64,
    ) -> Option<VenueQuote>;

    /// Emit this venue's settlement instructions into `builder`, returning
    /// a handle to the produced output asset. Adapters never sign or
    /// submit (spec §4.2).
    fn build_fragment(&self, builder: &mut dyn TxBuilder, leg: &LegParams) -> Option<Fragment>;
}
