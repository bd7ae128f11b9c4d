//! Service metrics, recorded through the `metrics` facade.
//!
//! ## Counters
//! - `vcanchor_anchor_total{outcome}`: anchoring requests by outcome
//!   (`anchored`, `already_anchored`, or the error kind)
//! - `vcanchor_query_total{operation, state}`: status and info lookups
//!
//! ## Histograms
//! - `vcanchor_confirmation_seconds`: submission to confirmation latency
//! - `vcanchor_anchor_duration_seconds{outcome}`: end-to-end anchor latency
//!
//! Without an installed recorder every call is a no-op.

use metrics::{counter, histogram};

pub(crate) fn record_anchor(outcome: &'static str, duration_secs: f64) {
    counter!("vcanchor_anchor_total", "outcome" => outcome).increment(1);
    histogram!("vcanchor_anchor_duration_seconds", "outcome" => outcome).record(duration_secs);
}

pub(crate) fn record_confirmation(duration_secs: f64) {
    histogram!("vcanchor_confirmation_seconds").record(duration_secs);
}

pub(crate) fn record_query(operation: &'static str, state: &'static str) {
    counter!("vcanchor_query_total", "operation" => operation, "state" => state).increment(1);
}
