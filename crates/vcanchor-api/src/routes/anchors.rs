//! # Anchor Routes
//!
//! - `POST /v1/anchors` anchors an identifier. `201` when this call wrote
//!   the record, `200` when it already existed (including a lost race).
//! - `GET /v1/anchors/status` reports whether an identifier is anchored.
//! - `GET /v1/anchors/info` returns the ledger record, or `404`.
//!
//! Handlers only translate; anchoring semantics live in `vcanchor-service`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vcanchor_core::{AnchorRecord, AnchorResult, AnchorState, Commitment};

use super::{validate_identifier, IdentifierQuery};
use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, extract_validated_query, Validate};
use crate::state::AppState;

// -- Request DTOs -------------------------------------------------------------

/// Request to anchor a credential identifier.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AnchorRequest {
    /// Credential identifier, e.g. `urn:uuid:...` or a DID URL.
    pub identifier: String,
}

impl Validate for AnchorRequest {
    fn validate(&self) -> Result<(), String> {
        validate_identifier(&self.identifier)
    }
}

// -- Response DTOs ------------------------------------------------------------

/// Result of an anchor request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnchorResponse {
    pub commitment: String,
    /// Hash of the transaction this call submitted. Absent when the
    /// commitment was already anchored.
    pub transaction_id: Option<String>,
    pub block_height: u64,
    pub already_anchored: bool,
}

impl AnchorResponse {
    fn new(commitment: &Commitment, result: AnchorResult) -> Self {
        Self {
            commitment: commitment.to_string(),
            transaction_id: result.transaction_id,
            block_height: result.block_height,
            already_anchored: result.already_anchored,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub commitment: String,
    /// `true` only when a record was read. An unreachable ledger reports
    /// `false` with `state` set to `unknown`.
    pub anchored: bool,
    /// One of `anchored`, `not_anchored`, `unknown`.
    pub state: String,
}

/// An anchor record as stored by the ledger program.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnchorRecordResponse {
    pub commitment: String,
    pub block_height: u64,
    /// Block timestamp, seconds since the Unix epoch.
    pub timestamp: u64,
    pub anchored_at: Option<DateTime<Utc>>,
    /// Address that submitted the winning transaction.
    pub submitter: String,
}

impl From<AnchorRecord> for AnchorRecordResponse {
    fn from(record: AnchorRecord) -> Self {
        Self {
            anchored_at: record.anchored_at(),
            commitment: record.commitment.to_string(),
            block_height: record.block_height,
            timestamp: record.timestamp,
            submitter: record.submitter.to_string(),
        }
    }
}

// -- Router -------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/anchors", post(anchor))
        .route("/v1/anchors/status", get(status))
        .route("/v1/anchors/info", get(info))
}

// -- Handlers -----------------------------------------------------------------

/// POST /v1/anchors: Anchor a credential identifier.
#[utoipa::path(
    post,
    path = "/v1/anchors",
    request_body = AnchorRequest,
    responses(
        (status = 201, description = "Anchored by this request", body = AnchorResponse),
        (status = 200, description = "Already anchored", body = AnchorResponse),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 502, description = "Ledger unavailable or transaction rejected", body = ErrorBody),
        (status = 504, description = "Submitted but not confirmed in time", body = ErrorBody),
    ),
    tag = "anchors"
)]
pub(crate) async fn anchor(
    State(state): State<AppState>,
    body: Result<Json<AnchorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnchorResponse>), AppError> {
    let request = extract_validated_json(body)?;
    let outcome = state.service.coordinator.anchor(&request.identifier).await?;

    let status = if outcome.already_anchored() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let commitment = outcome.record().commitment;
    Ok((
        status,
        Json(AnchorResponse::new(&commitment, AnchorResult::from(outcome))),
    ))
}

/// GET /v1/anchors/status: Whether an identifier is anchored.
#[utoipa::path(
    get,
    path = "/v1/anchors/status",
    params(IdentifierQuery),
    responses(
        (status = 200, description = "Anchoring status", body = StatusResponse),
        (status = 422, description = "Missing or empty identifier", body = ErrorBody),
    ),
    tag = "anchors"
)]
pub(crate) async fn status(
    State(state): State<AppState>,
    query: Result<Query<IdentifierQuery>, QueryRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let query = extract_validated_query(query)?;
    let commitment = Commitment::derive(&query.identifier);
    let anchor_state: AnchorState = state.service.query.check_commitment(&commitment).await;
    Ok(Json(StatusResponse {
        commitment: commitment.to_string(),
        anchored: anchor_state.is_anchored(),
        state: anchor_state.as_str().to_string(),
    }))
}

/// GET /v1/anchors/info: The ledger record for an identifier.
#[utoipa::path(
    get,
    path = "/v1/anchors/info",
    params(IdentifierQuery),
    responses(
        (status = 200, description = "Anchor record", body = AnchorRecordResponse),
        (status = 404, description = "Not anchored", body = ErrorBody),
        (status = 422, description = "Missing or empty identifier", body = ErrorBody),
        (status = 502, description = "Ledger unavailable", body = ErrorBody),
    ),
    tag = "anchors"
)]
pub(crate) async fn info(
    State(state): State<AppState>,
    query: Result<Query<IdentifierQuery>, QueryRejection>,
) -> Result<Json<AnchorRecordResponse>, AppError> {
    let query = extract_validated_query(query)?;
    let record = state.service.query.info(&query.identifier).await?;
    Ok(Json(record.into()))
}
