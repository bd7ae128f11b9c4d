//! # Commitment Derivation
//!
//! A [`Commitment`] is the 32-byte SHA-256 digest of a credential
//! identifier's UTF-8 bytes. It is the only value that ever reaches the
//! ledger; the identifier itself stays off-chain.
//!
//! ## Security Invariant
//!
//! Derivation performs no normalization. `"URN:uuid:1"` and `"urn:uuid:1"`
//! produce different commitments, and a trailing space is significant. The
//! caller's encoding is authoritative.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ParseError;

/// Length of a commitment in bytes (Solidity `bytes32`).
pub const COMMITMENT_LEN: usize = 32;

/// A fixed-size commitment standing in for a credential identifier.
///
/// Serializes as a `0x`-prefixed lowercase hex string, the conventional
/// rendering of a `bytes32` value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Commitment([u8; COMMITMENT_LEN]);

impl Commitment {
    /// Derive the commitment for a credential identifier.
    ///
    /// Pure and infallible: the same identifier always yields the same
    /// commitment, for any UTF-8 input including the empty string.
    pub fn derive(identifier: &str) -> Self {
        let hash = Sha256::digest(identifier.as_bytes());
        let mut bytes = [0u8; COMMITMENT_LEN];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    /// Wrap raw bytes already known to be a commitment (e.g. decoded from a
    /// ledger event).
    pub fn from_bytes(bytes: [u8; COMMITMENT_LEN]) -> Self {
        Self(bytes)
    }

    /// The all-zero commitment. Never produced by [`Commitment::derive`] in
    /// practice; used as a harmless probe key for readiness checks.
    pub fn zero() -> Self {
        Self([0u8; COMMITMENT_LEN])
    }

    /// Return the raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; COMMITMENT_LEN] {
        &self.0
    }

    /// Render as lowercase hex without a prefix.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse from 64 hex characters, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let digits = crate::hex::strip_prefix(s.trim());
        if digits.len() != COMMITMENT_LEN * 2 {
            return Err(ParseError::InvalidCommitment(format!(
                "expected {} hex chars, got {}",
                COMMITMENT_LEN * 2,
                digits.len()
            )));
        }
        let decoded = crate::hex::decode(digits)
            .map_err(|e| ParseError::InvalidCommitment(e.to_string()))?;
        let mut bytes = [0u8; COMMITMENT_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl std::fmt::Debug for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Commitment({self})")
    }
}

impl std::str::FromStr for Commitment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_known_vector() {
        // sha256(b"urn:uuid:1111-aaaa")
        let c = Commitment::derive("urn:uuid:1111-aaaa");
        assert_eq!(
            c.to_hex(),
            "1d9f535e368e2847207e4bb44674eb8f4a34ca2eff16615a89daca75ff75b352"
        );
    }

    #[test]
    fn derive_empty_identifier() {
        let c = Commitment::derive("");
        assert_eq!(
            c.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn derive_does_not_normalize() {
        let base = Commitment::derive("urn:uuid:1111-aaaa");
        assert_ne!(base, Commitment::derive("URN:UUID:1111-AAAA"));
        assert_ne!(base, Commitment::derive(" urn:uuid:1111-aaaa"));
        assert_ne!(base, Commitment::derive("urn:uuid:1111-aaaa\n"));
    }

    #[test]
    fn display_is_prefixed_hex() {
        let c = Commitment::derive("x");
        let s = c.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 66);
    }

    #[test]
    fn from_hex_accepts_prefix_and_case() {
        let c = Commitment::derive("urn:uuid:1111-aaaa");
        assert_eq!(Commitment::from_hex(&c.to_hex()).unwrap(), c);
        assert_eq!(Commitment::from_hex(&c.to_string()).unwrap(), c);
        assert_eq!(
            Commitment::from_hex(&c.to_hex().to_uppercase()).unwrap(),
            c
        );
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(Commitment::from_hex("0x1234").is_err());
        assert!(Commitment::from_hex(&"zz".repeat(32)).is_err());
        assert!(Commitment::from_hex("").is_err());
    }

    #[test]
    fn serde_uses_prefixed_hex() {
        let c = Commitment::derive("urn:uuid:1111-aaaa");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(
            json,
            "\"0x1d9f535e368e2847207e4bb44674eb8f4a34ca2eff16615a89daca75ff75b352\""
        );
        let back: Commitment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn zero_commitment_is_all_zero() {
        assert_eq!(Commitment::zero().as_bytes(), &[0u8; 32]);
    }
}
