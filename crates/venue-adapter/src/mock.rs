//! A deterministic, scriptable adapter for router and engine tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chain_client::{MoveCallTarget, TxArg, TxBuilder};
use router_types::{AssetType, QuoteMetadata, ScaledPrice, VenueName, VenueQuote};

use crate::adapter::{Fragment, LegParams, VenueAdapter};

/// A canned response for one `(receive, pay, receive_amount)` query.
#[derive(Debug, Clone)]
pub struct ScriptedQuote {
    pub pay_amount: u64,
    pub effective_price: ScaledPrice,
}

/// A venue adapter whose answers are configured up front, for use in
/// router/engine tests that need deterministic, non-networked liquidity.
/// `None` entries (or pairs absent from the script) reproduce "no
/// liquidity" the same way a disabled adapter would (spec §4.2, §9).
#[derive(Default)]
pub struct MockAdapter {
    name: &'static str,
    responses: HashMap<(AssetType, AssetType, u64), Option<ScriptedQuote>>,
    fail_fragment: bool,
}

impl MockAdapter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            responses: HashMap::new(),
            fail_fragment: false,
        }
    }

    pub fn with_quote(
        mut self,
        receive: AssetType,
        pay: AssetType,
        receive_amount: u64,
        pay_amount: u64,
        effective_price: ScaledPrice,
    ) -> Self {
        self.responses.insert(
            (receive, pay, receive_amount),
            Some(ScriptedQuote {
                pay_amount,
                effective_price,
            }),
        );
        self
    }

    /// Make this adapter behave as if it has no liquidity at all for the
    /// given query (the degraded-to-`None` contract, spec §4.2).
    pub fn with_no_liquidity(mut self, receive: AssetType, pay: AssetType, receive_amount: u64) -> Self {
        self.responses.insert((receive, pay, receive_amount), None);
        self
    }

    pub fn failing_fragments(mut self) -> Self {
        self.fail_fragment = true;
        self
    }
}

#[async_trait]
impl VenueAdapter for MockAdapter {
    fn name(&self) -> VenueName {
        self.name
    }

    async fn get_price(
        &self,
        receive: &AssetType,
        pay: &AssetType,
        receive_amount: u64,
    ) -> Option<ScaledPrice> {
        self.responses
            .get(&(receive.clone(), pay.clone(), receive_amount))
            .and_then(|entry| entry.as_ref())
            .map(|q| q.effective_price)
    }

    async fn get_detailed_quote(
        &self,
        receive: &AssetType,
        pay: &AssetType,
        receive_amount: u64,
    ) -> Option<VenueQuote> {
        let quote = self
            .responses
            .get(&(receive.clone(), pay.clone(), receive_amount))
            .and_then(|entry| entry.as_ref())?;
        Some(VenueQuote {
            venue: self.name,
            receive_amount,
            pay_amount: quote.pay_amount,
            effective_price: quote.effective_price,
            metadata: QuoteMetadata::External {
                venue: self.name,
                payload: Vec::new(),
            },
        })
    }

    fn build_fragment(&self, builder: &mut dyn TxBuilder, leg: &LegParams) -> Option<Fragment> {
        if self.fail_fragment {
            return None;
        }
        let amount_arg = builder.pure_u64(leg.pay_amount);
        let outputs = builder.move_call(
            MoveCallTarget::new("0xmock", "mock_venue", "swap"),
            vec![TxArg::Coin(leg.input_coin), amount_arg],
        );
        Some(Fragment {
            output_handle: *outputs.first()?,
            description: format!("{} mock swap", self.name),
        })
    }
}
