use std::fmt;

use serde::{Deserialize, Serialize};

/// A 32-byte on-chain object identity, as used for offers, intents, makers
/// and creators in the settlement protocol's object model.
///
/// Serializes as a `0x`-prefixed hex string, matching the wire encoding of
/// the chain client's event payloads (spec §6).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidObjectId> {
        let array: [u8; 32] = bytes.try_into().map_err(|_| InvalidObjectId)?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// A deterministic id for tests, identified by a small integer.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("object id must be exactly 32 bytes")]
pub struct InvalidObjectId;

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex_encode(&self.0))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex_encode(&self.0))
    }
}

impl std::str::FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex_decode(stripped)?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Result<Vec<u8>, InvalidObjectId> {
    if s.len() % 2 != 0 {
        return Err(InvalidObjectId);
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| InvalidObjectId))
        .collect()
}

/// Offer identifier.
pub type OfferId = ObjectId;
/// Intent identifier.
pub type IntentId = ObjectId;
/// A maker, creator, or executor address.
pub type Address = ObjectId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_parse() {
        let id = ObjectId::from_u64(42);
        let text = id.to_string();
        assert_eq!(text.parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn round_trips_through_serde() {
        let id = ObjectId::from_u64(7);
        let json = serde_json::to_string(&id).unwrap();
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(ObjectId::from_bytes(&[0u8; 31]).is_err());
    }

    #[test]
    fn rejects_odd_length_hex_instead_of_panicking() {
        assert!("0x1".parse::<ObjectId>().is_err());
        assert!(format!("0x{}", "a".repeat(63)).parse::<ObjectId>().is_err());
    }
}
