//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "vcanchor: Credential Anchoring Service",
        version = "0.1.0",
        description = "Anchors verifiable-credential identifiers on an EVM ledger as SHA-256 commitments and answers existence queries.\n\nAnchoring is idempotent: repeating a request, or losing a race to another submitter, reports `already_anchored: true` with the existing record.",
        license(name = "AGPL-3.0-or-later"),
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        crate::routes::anchors::anchor,
        crate::routes::anchors::status,
        crate::routes::anchors::info,
        crate::routes::commitments::derive_commitment,
    ),
    components(schemas(
        crate::routes::anchors::AnchorRequest,
        crate::routes::anchors::AnchorResponse,
        crate::routes::anchors::StatusResponse,
        crate::routes::anchors::AnchorRecordResponse,
        crate::routes::commitments::CommitmentResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "anchors", description = "Anchor credentials and query their status"),
        (name = "commitments", description = "Commitment derivation"),
    )
)]
pub struct ApiDoc;

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}
