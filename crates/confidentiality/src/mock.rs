//! A deterministic confidentiality collaborator for router/engine tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use router_types::{DecryptedIntentParams, IntentId};

use crate::collaborator::{ConfidentialityCollaborator, SessionCredential};

pub struct MockCollaborator {
    params: Mutex<HashMap<IntentId, DecryptedIntentParams>>,
    session_available: bool,
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self {
            params: Mutex::new(HashMap::new()),
            session_available: true,
        }
    }

    pub fn with_params(self, intent_id: IntentId, params: DecryptedIntentParams) -> Self {
        self.params.lock().unwrap().insert(intent_id, params);
        self
    }

    /// Makes this collaborator behave as unreachable, exercising the
    /// confidentiality-miss path with no session credential at all.
    pub fn unreachable() -> Self {
        Self {
            params: Mutex::new(HashMap::new()),
            session_available: false,
        }
    }
}

impl Default for MockCollaborator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfidentialityCollaborator for MockCollaborator {
    async fn acquire_session(&self) -> Option<SessionCredential> {
        if !self.session_available {
            return None;
        }
        Some(SessionCredential {
            token: "mock-session".into(),
            expires_at_ms: u64::MAX,
        })
    }

    async fn decrypt(&self, _session: &SessionCredential, intent_id: IntentId) -> Option<DecryptedIntentParams> {
        self.params.lock().unwrap().get(&intent_id).copied()
    }

    async fn encrypt(
        &self,
        _session: &SessionCredential,
        params: DecryptedIntentParams,
        _identity: [u8; 32],
    ) -> Option<Vec<u8>> {
        Some(format!("{}:{}:{}", params.receive_amount, params.min_price, params.max_price).into_bytes())
    }
}
