//! Minimal hex helpers shared by the commitment, address, and ABI codecs.

use crate::error::ParseError;

/// Encode bytes as lowercase hex without a prefix.
pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode an unprefixed hex string into bytes.
pub fn decode(hex: &str) -> Result<Vec<u8>, ParseError> {
    if !hex.is_ascii() {
        return Err(ParseError::InvalidHex("non-ASCII character".to_string()));
    }
    if hex.len() % 2 != 0 {
        return Err(ParseError::InvalidHex(
            "hex string must have even length".to_string(),
        ));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| ParseError::InvalidHex(format!("invalid hex at position {i}: {e}")))
        })
        .collect()
}

/// Strip an optional `0x`/`0X` prefix.
pub fn strip_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
