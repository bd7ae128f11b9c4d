//! # Telemetry Setup
//!
//! Tracing subscriber and Prometheus recorder installation for the server
//! binary.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;

/// Set `VCANCHOR_LOG_FORMAT=json` for one JSON object per event.
pub const ENV_LOG_FORMAT: &str = "VCANCHOR_LOG_FORMAT";
/// Set to `false` to disable the Prometheus recorder and `/metrics`.
pub const ENV_METRICS_ENABLED: &str = "VCANCHOR_METRICS_ENABLED";

/// Initialize the global tracing subscriber. Filter from `RUST_LOG`,
/// defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Whether metrics are enabled. Defaults to `true` when the variable is
/// absent or set to anything other than `"false"`.
pub fn metrics_enabled() -> bool {
    std::env::var(ENV_METRICS_ENABLED)
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_metrics() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().install_recorder()
}
