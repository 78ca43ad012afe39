//! The venue adapter contract (spec §4.2): a uniform quote and
//! transaction-fragment interface over external liquidity venues.

mod adapter;
mod amm;
mod native;

#[cfg(feature = "test-util")]
pub mod mock;

pub use adapter::{Fragment, LegParams, VenueAdapter};
pub use amm::ConstantProductAdapter;
pub use native::NativeVenueAdapter;
