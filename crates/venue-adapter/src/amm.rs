use std::collections::HashMap;

use async_trait::async_trait;
use chain_client::{MoveCallTarget, TxBuilder};
use moka::future::Cache;
use router_types::{AssetType, QuoteMetadata, ScaledPrice, VenueName, VenueQuote};

use crate::adapter::{Fragment, LegParams, VenueAdapter};

/// Locally-cached pool state, the adapter's only per-request state (spec
/// §4.2, "stateless across requests aside from locally-cached
/// pool-metadata with a bounded TTL").
#[derive(Debug, Clone, Copy)]
struct PoolMetadata {
    reserve_receive: u64,
    reserve_pay: u64,
    /// Direction flag carried into [`QuoteMetadata`] for the composer, as
    /// called for by spec §3's "pool handle, direction flag, sqrt-price".
    receive_is_token_a: bool,
}

impl PoolMetadata {
    /// A coarse sqrt-price-style marker derived from the reserves, carried
    /// as opaque metadata the way a concentrated-liquidity venue would
    /// (spec §3). Not used for pricing — the quote math below uses the
    /// reserves directly.
    fn sqrt_price_marker(&self) -> u64 {
        // integer sqrt of reserve_pay / reserve_receive, scaled; a
        // deterministic stand-in, not a faithful CLMM tick price.
        let ratio = (self.reserve_pay as u128 * 1_000_000) / self.reserve_receive.max(1) as u128;
        isqrt(ratio) as u64
    }
}

fn isqrt(value: u128) -> u128 {
    if value < 2 {
        return value;
    }
    let mut x = value;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

/// A constant-product (`x * y = k`) external venue adapter. Stands in for
/// any AMM-style venue SDK — the spec treats venue internals as opaque
/// (spec §1), so this adapter is a simplified, deterministic example
/// implementation rather than a specific protocol integration.
pub struct ConstantProductAdapter {
    name: VenueName,
    move_target: MoveCallTarget,
    fee_bps: u32,
    slippage_bps: u32,
    pools: HashMap<(AssetType, AssetType), PoolMetadata>,
    cache: Cache<(AssetType, AssetType), PoolMetadata>,
}

const BPS_DENOMINATOR: u128 = 10_000;

impl ConstantProductAdapter {
    /// `pools` maps a directed `(receive, pay)` pair to its reserves, as if
    /// freshly fetched from the venue's SDK. `pool_cache_ttl` bounds how
    /// long that fetch is trusted before being treated as stale (spec
    /// §4.2).
    pub fn new(
        name: VenueName,
        move_target: MoveCallTarget,
        fee_bps: u32,
        slippage_bps: u32,
        pools: HashMap<(AssetType, AssetType), PoolMetadata>,
        pool_cache_ttl: std::time::Duration,
    ) -> Self {
        Self {
            name,
            move_target,
            fee_bps,
            slippage_bps,
            pools,
            cache: Cache::builder().time_to_live(pool_cache_ttl).build(),
        }
    }

    pub fn single_pool(
        name: VenueName,
        move_target: MoveCallTarget,
        receive: AssetType,
        pay: AssetType,
        reserve_receive: u64,
        reserve_pay: u64,
        fee_bps: u32,
        slippage_bps: u32,
    ) -> Self {
        let mut pools = HashMap::new();
        pools.insert(
            (receive, pay),
            PoolMetadata {
                reserve_receive,
                reserve_pay,
                receive_is_token_a: true,
            },
        );
        Self::new(
            name,
            move_target,
            fee_bps,
            slippage_bps,
            pools,
            std::time::Duration::from_secs(5),
        )
    }

    async fn pool_for(&self, receive: &AssetType, pay: &AssetType) -> Option<PoolMetadata> {
        let key = (receive.clone(), pay.clone());
        if let Some(cached) = self.cache.get(&key).await {
            return Some(cached);
        }
        let fetched = *self.pools.get(&key)?;
        self.cache.insert(key, fetched).await;
        Some(fetched)
    }

    /// Pay amount required for an exact-output swap of `receive_amount`,
    /// inclusive of fee and slippage buffer, or `None` if the pool lacks
    /// the depth to cover it.
    fn quote_pay_amount(&self, pool: &PoolMetadata, receive_amount: u64) -> Option<u64> {
        if receive_amount == 0 || receive_amount >= pool.reserve_receive {
            return None;
        }
        let out = receive_amount as u128;
        let reserve_out = pool.reserve_receive as u128;
        let reserve_in = pool.reserve_pay as u128;
        let fee_and_slippage_bps = self.fee_bps as u128 + self.slippage_bps as u128;
        if fee_and_slippage_bps >= BPS_DENOMINATOR {
            return None;
        }
        let numerator = out * reserve_in * BPS_DENOMINATOR;
        let denominator = (reserve_out - out) * (BPS_DENOMINATOR - fee_and_slippage_bps);
        let pay = numerator.div_ceil(denominator);
        u64::try_from(pay).ok()
    }
}

#[async_trait]
impl VenueAdapter for ConstantProductAdapter {
    fn name(&self) -> VenueName {
        self.name
    }

    async fn get_price(
        &self,
        receive: &AssetType,
        pay: &AssetType,
        receive_amount: u64,
    ) -> Option<ScaledPrice> {
        let pool = self.pool_for(receive, pay).await?;
        let pay_amount = self.quote_pay_amount(&pool, receive_amount)?;
        pricing_kernel::effective_price_ceil(receive_amount, pay_amount).ok()
    }

    async fn get_detailed_quote(
        &self,
        receive: &AssetType,
        pay: &AssetType,
        receive_amount: u64,
    ) -> Option<VenueQuote> {
        let pool = self.pool_for(receive, pay).await?;
        let pay_amount = self.quote_pay_amount(&pool, receive_amount)?;
        let effective_price = pricing_kernel::effective_price_ceil(receive_amount, pay_amount).ok()?;
        let mut payload = Vec::with_capacity(9);
        payload.push(pool.receive_is_token_a as u8);
        payload.extend_from_slice(&pool.sqrt_price_marker().to_be_bytes());
        Some(VenueQuote {
            venue: self.name,
            receive_amount,
            pay_amount,
            effective_price,
            metadata: QuoteMetadata::External {
                venue: self.name,
                payload,
            },
        })
    }

    fn build_fragment(&self, builder: &mut dyn TxBuilder, leg: &LegParams) -> Option<Fragment> {
        let amount_arg = builder.pure_u64(leg.pay_amount);
        let min_out_arg = builder.pure_u64(leg.min_receive_amount);
        let recipient_arg = builder.pure_address(leg.recipient);
        let outputs = builder.move_call(
            self.move_target.clone(),
            vec![
                chain_client::TxArg::Coin(leg.input_coin),
                amount_arg,
                min_out_arg,
                recipient_arg,
            ],
        );
        let output_handle = *outputs.first()?;
        Some(Fragment {
            output_handle,
            description: format!("{} swap for {}", self.name, leg.pay_amount),
        })
    }
}
