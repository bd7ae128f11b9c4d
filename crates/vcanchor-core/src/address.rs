//! # Ledger Addresses
//!
//! 20-byte account/program addresses in their EVM `0x` + 40 hex form.
//! Validated at construction so a malformed program address or signer is a
//! configuration error, never a runtime RPC failure.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// Length of a ledger address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// A validated ledger address.
///
/// Stored as raw bytes; rendered as `0x`-prefixed lowercase hex. Mixed-case
/// (EIP-55) input is accepted but the checksum is not enforced.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedgerAddress([u8; ADDRESS_LEN]);

impl LedgerAddress {
    /// Parse an address of the form `0x` followed by 40 hex characters.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();
        let is_well_formed = s.len() == 2 + ADDRESS_LEN * 2
            && (s.starts_with("0x") || s.starts_with("0X"))
            && s[2..].chars().all(|c| c.is_ascii_hexdigit());
        if !is_well_formed {
            return Err(ParseError::InvalidAddress(s.to_string()));
        }
        let decoded = crate::hex::decode(&s[2..])?;
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Return the raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl std::fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", crate::hex::encode(&self.0))
    }
}

impl std::fmt::Debug for LedgerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerAddress({self})")
    }
}

impl std::str::FromStr for LedgerAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for LedgerAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LedgerAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
