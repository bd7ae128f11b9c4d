//! # Commitment Derivation
//!
//! `GET /v1/commitments?identifier=...` returns the commitment an
//! identifier anchors under. Pure computation; the ledger is not touched.

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;
use vcanchor_core::Commitment;

use super::IdentifierQuery;
use crate::error::{AppError, ErrorBody};
use crate::extractors::extract_validated_query;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct CommitmentResponse {
    pub identifier: String,
    /// `0x`-prefixed SHA-256 of the identifier's UTF-8 bytes.
    pub commitment: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/commitments", get(derive_commitment))
}

/// GET /v1/commitments: Derive the commitment for an identifier.
#[utoipa::path(
    get,
    path = "/v1/commitments",
    params(IdentifierQuery),
    responses(
        (status = 200, description = "Derived commitment", body = CommitmentResponse),
        (status = 422, description = "Missing or empty identifier", body = ErrorBody),
    ),
    tag = "commitments"
)]
pub(crate) async fn derive_commitment(
    query: Result<Query<IdentifierQuery>, QueryRejection>,
) -> Result<Json<CommitmentResponse>, AppError> {
    let query = extract_validated_query(query)?;
    let commitment = Commitment::derive(&query.identifier);
    Ok(Json(CommitmentResponse {
        identifier: query.identifier,
        commitment: commitment.to_string(),
    }))
}
