use chain_client::MoveCallTarget;

/// The protocol's fixed move-call surface the composer targets (spec §6).
/// Supplied once at construction by the engine from `EngineConfig`'s
/// configured package id.
#[derive(Debug, Clone)]
pub struct ProtocolTargets {
    /// Consumes an offer's entire remaining balance.
    pub fill_full: MoveCallTarget,
    /// Consumes less than an offer's remaining balance.
    pub fill_partial: MoveCallTarget,
    /// Settles a plaintext intent against a native offer at an explicit
    /// price (spec §4.5, "intent-bound fill").
    pub execute_against_offer: MoveCallTarget,
    /// Same as `execute_against_offer`, but for an opaque intent: the
    /// decrypted parameters are passed through as opaque arguments the
    /// on-chain policy module re-derives and checks (spec §4.5, §4.7).
    pub execute_against_offer_encrypted: MoveCallTarget,
}

/// Gas budget ceilings attached to a composed transaction (spec §4.5,
/// "composite fills, having more legs, use a larger default budget than
/// direct fills").
#[derive(Debug, Clone, Copy)]
pub struct GasBudgets {
    pub direct: u64,
    pub composite: u64,
}

impl Default for GasBudgets {
    fn default() -> Self {
        Self {
            direct: 50_000_000,
            composite: 100_000_000,
        }
    }
}
