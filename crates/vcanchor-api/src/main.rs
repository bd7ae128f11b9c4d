//! vcanchor API server.
//!
//! Ledger settings come from an optional YAML file named by
//! `VCANCHOR_CONFIG`, overlaid by `VCANCHOR_*` environment variables.
//! Missing ledger configuration aborts startup before the listener binds.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use vcanchor_api::{app, telemetry, AppState};
use vcanchor_core::LedgerSettings;
use vcanchor_service::AnchorService;

const ENV_CONFIG: &str = "VCANCHOR_CONFIG";
const ENV_PORT: &str = "VCANCHOR_PORT";
const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let mut settings = LedgerSettings::default();
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        settings = LedgerSettings::from_yaml_file(Path::new(&path))?;
    }
    let settings = settings.overlay(LedgerSettings::from_env()?);
    let service = AnchorService::connect(settings).context("ledger configuration")?;

    let mut state = AppState::new(service);
    if telemetry::metrics_enabled() {
        let handle = telemetry::install_metrics().context("installing Prometheus recorder")?;
        state = state.with_metrics(handle);
    }

    let port = port_from(std::env::var(ENV_PORT).ok())?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("vcanchor-api listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Listen port from `VCANCHOR_PORT`. Unset means the default; anything
/// else must be a valid port number.
fn port_from(value: Option<String>) -> anyhow::Result<u16> {
    match value {
        None => Ok(DEFAULT_PORT),
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{ENV_PORT} must be a port number, got {raw:?}")),
    }
}
