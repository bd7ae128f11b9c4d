//! # HTTP Metrics
//!
//! Request counts and latency recorded through the `metrics` facade. The
//! installed Prometheus recorder exposes them on `/metrics`; without a
//! recorder the macros are no-ops.
//!
//! Paths are labelled by their route template ([`MatchedPath`]) so query
//! strings and unmatched paths do not explode label cardinality.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};

/// Record `vcanchor_http_requests_total` and
/// `vcanchor_http_request_duration_seconds` for every request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    counter!(
        "vcanchor_http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status,
    )
    .increment(1);
    histogram!(
        "vcanchor_http_request_duration_seconds",
        "method" => method,
        "path" => path,
    )
    .record(started.elapsed().as_secs_f64());

    response
}
