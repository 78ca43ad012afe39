use std::time::Duration;

/// Policy knobs for one search (spec §4.4, "Inputs to a search").
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// How many native offers a single search may walk before giving up on
    /// extending the native prefix.
    pub max_native_legs: usize,
    /// The smallest residual a split's external leg (or a standalone native
    /// fill) is allowed to absorb.
    pub min_leg_amount: u64,
    /// Whether split (native-prefix + external-residual) candidates are
    /// considered at all.
    pub enable_splits: bool,
    /// Tie-break preference for native-sourced legs, in basis points. Only
    /// consulted when candidates are otherwise equal on cost and leg count.
    pub native_preference_bps: u32,
    /// Per-search deadline for the external-quote fan-out; a venue slower
    /// than this is treated as a miss for this search only.
    pub quote_deadline: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_native_legs: 5,
            min_leg_amount: 1,
            enable_splits: true,
            native_preference_bps: 0,
            quote_deadline: Duration::from_millis(250),
        }
    }
}
