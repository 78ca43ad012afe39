//! Thin boundary around the external confidentiality collaborator (spec
//! §4.7): opaque-intent detection, decrypt, and encrypt, with a
//! short-lived session credential cached the way `venue-adapter` caches
//! pool metadata.

mod collaborator;
mod shim;

#[cfg(feature = "test-util")]
pub mod mock;

pub use collaborator::{ConfidentialityCollaborator, SessionCredential};
pub use shim::ConfidentialityShim;
