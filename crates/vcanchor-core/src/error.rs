//! # Error Types
//!
//! Caller-facing error taxonomy for credential anchoring. Ledger transport
//! details never appear here directly; the ledger crate maps its own errors
//! into these variants.
//!
//! ## Design
//!
//! - Configuration errors are fatal and raised before any network call.
//! - A duplicate anchor is not an error and has no variant.
//! - `NotAnchored` is an expected negative answer on the query path.

use thiserror::Error;

use crate::commitment::Commitment;

/// Errors surfaced to callers of the anchoring and query services.
#[derive(Error, Debug)]
pub enum AnchorError {
    /// Required configuration is absent or malformed.
    #[error("missing configuration: {0}")]
    MissingConfiguration(#[from] ConfigError),

    /// The ledger could not be reached (after retries) or answered with
    /// something unusable.
    #[error("ledger network unavailable: {reason}")]
    NetworkUnavailable {
        /// Human-readable cause.
        reason: String,
    },

    /// The transaction was submitted but not confirmed in time.
    ///
    /// It remains in flight; re-query status later rather than resubmitting.
    #[error("confirmation timed out for transaction {transaction_id} after {waited_secs}s")]
    ConfirmationTimeout {
        /// Transaction that is still in flight.
        transaction_id: String,
        /// Seconds spent waiting before giving up.
        waited_secs: u64,
    },

    /// No anchor record exists for the commitment.
    #[error("commitment {commitment} is not anchored")]
    NotAnchored {
        /// The commitment that was looked up.
        commitment: Commitment,
    },

    /// The ledger reverted the write and no record exists for the
    /// commitment, so the revert was not caused by a duplicate.
    #[error("ledger rejected anchor transaction{}: {reason}", fmt_tx(.transaction_id))]
    Rejected {
        /// Transaction that reverted, if it was ever assigned an id.
        transaction_id: Option<String>,
        /// Revert reason reported by the ledger.
        reason: String,
    },
}

fn fmt_tx(tx: &Option<String>) -> String {
    tx.as_ref().map(|t| format!(" {t}")).unwrap_or_default()
}

impl AnchorError {
    /// Machine-readable kind, stable across versions.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingConfiguration(_) => "missing_configuration",
            Self::NetworkUnavailable { .. } => "network_unavailable",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
            Self::NotAnchored { .. } => "not_anchored",
            Self::Rejected { .. } => "rejected",
        }
    }
}

/// Configuration failures. Always fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("required setting {0} is not set")]
    Missing(&'static str),

    /// A setting is present but malformed.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Setting name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A configuration file could not be read or parsed.
    #[error("configuration file {path}: {reason}")]
    File {
        /// File path as given.
        path: String,
        /// Read or parse failure.
        reason: String,
    },
}

/// Errors parsing wire representations of core types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a 32-byte hex commitment.
    #[error("invalid commitment: {0}")]
    InvalidCommitment(String),

    /// Not a `0x` + 40 hex address.
    #[error("invalid ledger address: {0}")]
    InvalidAddress(String),

    /// Malformed hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}
