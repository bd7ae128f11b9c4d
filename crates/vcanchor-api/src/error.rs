//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`AnchorError`] and request validation failures to HTTP status codes
//! with a JSON body carrying an error code, message, and optional details.
//! Ledger transport details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use vcanchor_core::AnchorError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_ANCHORED", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, e.g. the in-flight transaction on a timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// No anchor record exists (404).
    #[error("commitment {commitment} is not anchored")]
    NotAnchored { commitment: String },

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Ledger unreachable or misbehaving after retries (502). Message is
    /// logged but not returned to the client.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// Ledger reverted the anchor without recording it (502).
    #[error("{0}")]
    LedgerRejected(String),

    /// Submitted but not confirmed in time (504). The transaction remains
    /// in flight.
    #[error("transaction {transaction_id} not confirmed after {waited_secs}s; query status later")]
    ConfirmationTimeout {
        transaction_id: String,
        waited_secs: u64,
    },

    /// Ledger access is not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotAnchored { .. } => (StatusCode::NOT_FOUND, "NOT_ANCHORED"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::LedgerUnavailable(_) => (StatusCode::BAD_GATEWAY, "LEDGER_UNAVAILABLE"),
            Self::LedgerRejected(_) => (StatusCode::BAD_GATEWAY, "LEDGER_REJECTED"),
            Self::ConfirmationTimeout { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, "CONFIRMATION_TIMEOUT")
            }
            Self::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::NotAnchored { commitment } => {
                Some(serde_json::json!({ "commitment": commitment }))
            }
            Self::ConfirmationTimeout {
                transaction_id,
                waited_secs,
            } => Some(serde_json::json!({
                "transaction_id": transaction_id,
                "waited_secs": waited_secs,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::LedgerUnavailable(_) => "The ledger is currently unavailable".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::LedgerUnavailable(_) => tracing::error!(error = %self, "ledger unavailable"),
            Self::LedgerRejected(_) => tracing::warn!(error = %self, "ledger rejected anchor"),
            Self::ConfirmationTimeout { .. } => {
                tracing::warn!(error = %self, "confirmation timed out")
            }
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AnchorError> for AppError {
    fn from(err: AnchorError) -> Self {
        match err {
            AnchorError::NotAnchored { commitment } => Self::NotAnchored {
                commitment: commitment.to_string(),
            },
            AnchorError::NetworkUnavailable { reason } => Self::LedgerUnavailable(reason),
            AnchorError::ConfirmationTimeout {
                transaction_id,
                waited_secs,
            } => Self::ConfirmationTimeout {
                transaction_id,
                waited_secs,
            },
            err @ AnchorError::Rejected { .. } => Self::LedgerRejected(err.to_string()),
            AnchorError::MissingConfiguration(e) => Self::ServiceUnavailable(e.to_string()),
        }
    }
}
