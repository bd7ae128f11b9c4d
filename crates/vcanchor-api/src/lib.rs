//! # vcanchor-api: HTTP Service
//!
//! Axum front end for the anchoring service.
//!
//! ## Routes
//!
//! | Path                    | Module                    | Purpose                     |
//! |-------------------------|---------------------------|-----------------------------|
//! | `POST /v1/anchors`      | [`routes::anchors`]       | Anchor an identifier        |
//! | `GET /v1/anchors/status`| [`routes::anchors`]       | Anchored or not             |
//! | `GET /v1/anchors/info`  | [`routes::anchors`]       | Ledger record               |
//! | `GET /v1/commitments`   | [`routes::commitments`]   | Derive a commitment         |
//! | `GET /openapi.json`     | [`openapi`]               | OpenAPI document            |
//! | `GET /health/*`         | this module               | Kubernetes probes           |
//! | `GET /metrics`          | this module               | Prometheus scrape           |
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers; they delegate to `vcanchor-service`.
//! - All errors map to structured HTTP responses via [`AppError`].

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router with all routes and middleware.
///
/// `/metrics` is mounted only when `state.metrics` holds a handle.
pub fn app(state: AppState) -> Router {
    let metrics_on = state.metrics.is_some();

    let mut api = Router::new()
        .merge(routes::anchors::router())
        .merge(routes::commitments::router())
        .merge(openapi::router());

    if metrics_on {
        api = api.layer(from_fn(middleware::metrics::metrics_middleware));
    }

    let mut probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    if metrics_on {
        probes = probes.route("/metrics", get(prometheus_metrics));
    }

    Router::new()
        .merge(probes)
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health/liveness: The process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// GET /health/readiness: The ledger answers reads.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if state.service.query.ledger_reachable().await {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "ledger unreachable")
    }
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}
