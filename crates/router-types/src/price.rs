/// Fixed-point scale factor: all prices are `want-asset per one offer-asset`,
/// scaled by this factor. See spec §3.
pub const SCALE: u64 = 1_000_000_000;

/// A price scaled by [`SCALE`]. Newtype to keep scaled and unscaled amounts
/// from being mixed up at call sites.
pub type ScaledPrice = u64;

/// A millisecond Unix timestamp, as carried by chain events (spec §6,
/// `expiry_*` fields).
pub type TimestampMs = u64;
