//! # Application State
//!
//! Shared state for the Axum application: the anchoring service and, when
//! metrics are enabled, the Prometheus render handle.

use metrics_exporter_prometheus::PrometheusHandle;
use vcanchor_service::AnchorService;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Coordinator and query service over one ledger connection.
    pub service: AnchorService,
    /// Present when the Prometheus recorder is installed; `/metrics` is
    /// mounted only then.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl AppState {
    pub fn new(service: AnchorService) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle, enabling the `/metrics` route.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
