use std::fmt;

use serde::{Deserialize, Serialize};

/// A Move type tag identifying a coin/asset, e.g. `0x2::sui::SUI`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetType(pub String);

impl AssetType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directed asset pair for a routing search: `receive` is what the taker
/// wants out, `pay` is what the taker gives up. An offer is a match when its
/// `offer_asset == receive` and `want_asset == pay`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPair {
    pub receive: AssetType,
    pub pay: AssetType,
}

impl AssetPair {
    pub fn new(receive: AssetType, pay: AssetType) -> Self {
        Self { receive, pay }
    }
}
