use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use router_types::{DecryptedIntentParams, Intent, IntentId};

use crate::collaborator::{ConfidentialityCollaborator, SessionCredential};

/// Singleton cache key: the shim manages exactly one session credential at
/// a time (spec §4.7 ambient addition), the same keyed-singleton idiom
/// `venue-adapter`'s pool-metadata cache uses per-pool instead.
const SESSION_KEY: () = ();

/// The router's single point of contact with the confidentiality
/// collaborator: opaque-intent detection, decrypt, and encrypt, with a
/// lazily-refreshed, TTL-bounded session credential cached in between
/// (spec §4.7).
pub struct ConfidentialityShim {
    collaborator: Arc<dyn ConfidentialityCollaborator>,
    session: Cache<(), SessionCredential>,
}

impl ConfidentialityShim {
    pub fn new(collaborator: Arc<dyn ConfidentialityCollaborator>, credential_ttl: Duration) -> Self {
        Self {
            collaborator,
            session: Cache::builder().time_to_live(credential_ttl).build(),
        }
    }

    /// Whether `intent` carries the opaque sentinel (spec §3, §6). A pure
    /// delegation to [`Intent::is_opaque`], kept here so callers can treat
    /// the shim as the single point of contact for everything
    /// confidentiality-related.
    pub fn is_opaque(&self, intent: &Intent) -> bool {
        intent.is_opaque()
    }

    /// Returns a session credential valid as of now, first checking the
    /// cached one's own `expires_at_ms` rather than relying solely on the
    /// cache's TTL eviction (spec §4.7, "expiry is checked before each
    /// decryption") — the two are independent: the cache's TTL bounds how
    /// long a session is trusted by this process, while `expires_at_ms` is
    /// the collaborator's own claim about the credential's validity.
    async fn session(&self) -> Option<SessionCredential> {
        if let Some(cached) = self.session.get(&SESSION_KEY).await {
            if now_ms() < cached.expires_at_ms {
                return Some(cached);
            }
            self.session.invalidate(&SESSION_KEY).await;
        }
        let fresh = self.collaborator.acquire_session().await?;
        self.session.insert(SESSION_KEY, fresh.clone()).await;
        Some(fresh)
    }

    /// Recovers an opaque intent's real parameters, or `None` if the
    /// collaborator is unreachable or the decrypt itself fails — a
    /// `ConfidentialityMiss` from the caller's point of view (spec §7),
    /// never propagated as an error.
    pub async fn decrypt(&self, intent_id: IntentId) -> Option<DecryptedIntentParams> {
        let session = match self.session().await {
            Some(session) => session,
            None => {
                tracing::warn!(%intent_id, "confidentiality miss: no session credential available");
                return None;
            }
        };
        let result = self.collaborator.decrypt(&session, intent_id).await;
        if result.is_none() {
            tracing::warn!(%intent_id, "confidentiality miss: decrypt failed");
        }
        result
    }

    /// Encrypts `params` for `identity`, for composing the encrypted
    /// variant of an intent-bound fill (spec §4.5, §4.7).
    pub async fn encrypt(&self, params: DecryptedIntentParams, identity: [u8; 32]) -> Option<Vec<u8>> {
        let session = self.session().await?;
        self.collaborator.encrypt(&session, params, identity).await
    }
}

fn now_ms() -> router_types::TimestampMs {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
