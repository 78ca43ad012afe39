use async_trait::async_trait;
use router_types::{DecryptedIntentParams, IntentId, TimestampMs};

/// A short-lived credential the external confidentiality collaborator
/// issues to authenticate decrypt/encrypt calls. Refresh is this crate's
/// responsibility; the collaborator itself only ever hands out one at a
/// time (spec §4.7).
#[derive(Debug, Clone)]
pub struct SessionCredential {
    pub token: String,
    pub expires_at_ms: TimestampMs,
}

/// The external confidentiality collaborator's contract (spec §1, §4.7),
/// narrowed to the three operations the router needs. The collaborator
/// itself — key management, the actual encryption scheme — is out of
/// scope; every failure here degrades to `None`, never a panic or a
/// propagated error, matching the `ConfidentialityMiss` semantics in the
/// shared error taxonomy (spec §7).
#[async_trait]
pub trait ConfidentialityCollaborator: Send + Sync {
    /// Acquires a fresh session credential. `None` means the collaborator
    /// is unreachable right now.
    async fn acquire_session(&self) -> Option<SessionCredential>;

    /// Recovers the real parameters behind an opaque intent.
    async fn decrypt(
        &self,
        session: &SessionCredential,
        intent_id: IntentId,
    ) -> Option<DecryptedIntentParams>;

    /// Encrypts parameters for a 32-byte recipient identity, producing the
    /// opaque argument bytes the composer passes through unread into the
    /// encrypted move call.
    async fn encrypt(
        &self,
        session: &SessionCredential,
        params: DecryptedIntentParams,
        identity: [u8; 32],
    ) -> Option<Vec<u8>>;
}
