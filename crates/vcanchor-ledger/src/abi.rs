//! # Anchor Program ABI
//!
//! Calldata encoding and return/log decoding for the anchor program:
//!
//! ```solidity
//! function anchor(bytes32 commitment) external returns (bool);
//! function isAnchored(bytes32 commitment) external view returns (bool);
//! function getAnchorInfo(bytes32 commitment)
//!     external view returns (uint256 blockHeight, uint256 timestamp, address submitter);
//! event AnchorRecorded(
//!     bytes32 indexed commitment,
//!     address indexed submitter,
//!     uint256 blockHeight,
//!     uint256 timestamp
//! );
//! ```
//!
//! The program is write-once: `anchor` on an existing commitment reverts
//! (or returns `false` without emitting `AnchorRecorded`).

use thiserror::Error;
use vcanchor_core::hex;
use vcanchor_core::{AnchorRecord, Commitment, LedgerAddress};

/// `keccak256("anchor(bytes32)")[..4]`
pub const ANCHOR_SELECTOR: [u8; 4] = [0xee, 0xcd, 0xf9, 0x27];
/// `keccak256("isAnchored(bytes32)")[..4]`
pub const IS_ANCHORED_SELECTOR: [u8; 4] = [0x4f, 0x0b, 0x58, 0x01];
/// `keccak256("getAnchorInfo(bytes32)")[..4]`
pub const GET_ANCHOR_INFO_SELECTOR: [u8; 4] = [0xbe, 0x23, 0xab, 0x8d];
/// `keccak256("AnchorRecorded(bytes32,address,uint256,uint256)")`
pub const ANCHOR_RECORDED_TOPIC: &str =
    "0xed886b186bdf8dd88c6c13bccd18b9a023af3130e7d8f2833262cb096af2f23f";

const WORD: usize = 32;

/// Malformed ABI payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ABI decode error: {0}")]
pub struct AbiError(pub String);

/// Encode `selector(bytes32)` calldata as a `0x` hex string.
pub fn encode_call(selector: [u8; 4], commitment: &Commitment) -> String {
    format!("0x{}{}", hex::encode(&selector), commitment.to_hex())
}

/// Split `0x`-prefixed return data into 32-byte words.
pub fn decode_words(data: &str) -> Result<Vec<[u8; WORD]>, AbiError> {
    let bytes = hex::decode(hex::strip_prefix(data.trim())).map_err(|e| AbiError(e.to_string()))?;
    if bytes.len() % WORD != 0 {
        return Err(AbiError(format!(
            "return data length {} is not a multiple of {WORD}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(WORD)
        .map(|chunk| {
            let mut word = [0u8; WORD];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

/// Decode a `uint256` word that must fit in a `u64`.
pub fn word_to_u64(word: &[u8; WORD]) -> Result<u64, AbiError> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError("uint256 value exceeds u64".to_string()));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(tail))
}

/// Decode a left-padded `address` word.
pub fn word_to_address(word: &[u8; WORD]) -> Result<LedgerAddress, AbiError> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(AbiError("address word has non-zero padding".to_string()));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(LedgerAddress::from_bytes(bytes))
}

/// Decode a `bool` word.
pub fn word_to_bool(word: &[u8; WORD]) -> Result<bool, AbiError> {
    match word_to_u64(word)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(AbiError(format!("invalid bool value {other}"))),
    }
}

/// Decode the `isAnchored` return value.
pub fn decode_is_anchored(data: &str) -> Result<bool, AbiError> {
    let words = decode_words(data)?;
    let word = words
        .first()
        .ok_or_else(|| AbiError("empty return data".to_string()))?;
    word_to_bool(word)
}

/// Decode the `getAnchorInfo` return tuple.
///
/// The program returns zeros for an unknown commitment; a zero block height
/// decodes to `None`.
pub fn decode_anchor_info(
    commitment: &Commitment,
    data: &str,
) -> Result<Option<AnchorRecord>, AbiError> {
    let words = decode_words(data)?;
    if words.len() < 3 {
        return Err(AbiError(format!(
            "getAnchorInfo returned {} words, expected 3",
            words.len()
        )));
    }
    let block_height = word_to_u64(&words[0])?;
    if block_height == 0 {
        return Ok(None);
    }
    Ok(Some(AnchorRecord {
        commitment: *commitment,
        block_height,
        timestamp: word_to_u64(&words[1])?,
        submitter: word_to_address(&words[2])?,
    }))
}

/// Decode an `AnchorRecorded` log, if `topics` identify one.
///
/// Returns `Ok(None)` for logs of other events.
pub fn decode_anchor_recorded(
    topics: &[String],
    data: &str,
) -> Result<Option<AnchorRecord>, AbiError> {
    let Some(topic0) = topics.first() else {
        return Ok(None);
    };
    if !topic0.eq_ignore_ascii_case(ANCHOR_RECORDED_TOPIC) {
        return Ok(None);
    }
    if topics.len() < 3 {
        return Err(AbiError(format!(
            "AnchorRecorded log has {} topics, expected 3",
            topics.len()
        )));
    }
    let commitment = Commitment::from_hex(&topics[1]).map_err(|e| AbiError(e.to_string()))?;
    let submitter_word = decode_words(&topics[2])?;
    let submitter = word_to_address(
        submitter_word
            .first()
            .ok_or_else(|| AbiError("empty submitter topic".to_string()))?,
    )?;
    let words = decode_words(data)?;
    if words.len() < 2 {
        return Err(AbiError(format!(
            "AnchorRecorded data has {} words, expected 2",
            words.len()
        )));
    }
    Ok(Some(AnchorRecord {
        commitment,
        block_height: word_to_u64(&words[0])?,
        timestamp: word_to_u64(&words[1])?,
        submitter,
    }))
}

/// Parse a JSON-RPC hex quantity (`"0x1a"`).
pub fn parse_quantity(s: &str) -> Result<u64, AbiError> {
    let digits = hex::strip_prefix(s.trim());
    if digits.is_empty() {
        return Err(AbiError(format!("empty quantity {s:?}")));
    }
    u64::from_str_radix(digits, 16).map_err(|e| AbiError(format!("quantity {s:?}: {e}")))
}

/// Encode a `u64` as a JSON-RPC hex quantity.
pub fn format_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

/// Left-pad raw bytes into a 32-byte word, rendered as `0x` hex.
pub fn pad_word(bytes: &[u8]) -> String {
    let mut word = [0u8; WORD];
    let len = bytes.len().min(WORD);
    word[WORD - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    format!("0x{}", hex::encode(&word))
}
