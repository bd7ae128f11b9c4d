//! Ledger client error types.
//!
//! [`LedgerError`] carries enough detail to decide whether a call may be
//! retried; [`From<LedgerError>`] for [`AnchorError`] collapses it into the
//! caller-facing taxonomy.

use std::time::Duration;

use vcanchor_core::AnchorError;

/// Errors from ledger client calls.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The endpoint could not be reached or refused service. The request
    /// provably had no effect on the ledger, so it is safe to retry.
    #[error("ledger {network} unavailable: {reason}")]
    Unavailable { network: String, reason: String },

    /// A state-changing request was sent but its fate is unknown (timed out
    /// or the connection dropped mid-response). Never retried.
    #[error("ledger {network} did not answer a submission: {reason}")]
    Indeterminate { network: String, reason: String },

    /// The endpoint returned a non-2xx status that is not a service outage.
    #[error("ledger {network} returned HTTP {status}: {body}")]
    Http {
        network: String,
        status: u16,
        body: String,
    },

    /// The endpoint returned a JSON-RPC error object.
    #[error("ledger {network} JSON-RPC error {code}: {message}")]
    Rpc {
        network: String,
        code: i64,
        message: String,
    },

    /// The response was not shaped as expected.
    #[error("malformed response from ledger {network}: {reason}")]
    MalformedResponse { network: String, reason: String },

    /// The anchor program reverted the transaction (or accepted it without
    /// recording anything).
    #[error("transaction {} reverted: {reason}", .transaction_id.as_deref().unwrap_or("<unsent>"))]
    TransactionReverted {
        transaction_id: Option<String>,
        reason: String,
    },

    /// The transaction did not reach the required confirmations in time.
    #[error("transaction {transaction_id} unconfirmed after {waited:?}")]
    ConfirmationTimeout {
        transaction_id: String,
        waited: Duration,
    },
}

impl LedgerError {
    /// Whether retrying the same call could succeed without risk of a
    /// duplicate effect.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl From<LedgerError> for AnchorError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ConfirmationTimeout {
                transaction_id,
                waited,
            } => AnchorError::ConfirmationTimeout {
                transaction_id,
                waited_secs: waited.as_secs(),
            },
            LedgerError::TransactionReverted {
                transaction_id,
                reason,
            } => AnchorError::Rejected {
                transaction_id,
                reason,
            },
            other => AnchorError::NetworkUnavailable {
                reason: other.to_string(),
            },
        }
    }
}
