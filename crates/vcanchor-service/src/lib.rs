//! # vcanchor-service: Anchoring and Queries
//!
//! The business layer between callers (HTTP API, CLI) and the ledger:
//!
//! - **Coordinator** ([`coordinator`]): idempotent anchoring with duplicate
//!   normalization. A second anchor of the same identifier, or losing a
//!   race to another submitter, is a success reported as already anchored.
//!
//! - **Query** ([`query`]): status and record lookups.
//!
//! Both hold the ledger as `Arc<dyn LedgerClient>` and are cheap to clone.
//! [`AnchorService`] wires them to one ledger handle.

pub mod coordinator;
mod metrics;
pub mod query;

use std::sync::Arc;

use vcanchor_core::{AnchorError, LedgerSettings, RetryPolicy};
use vcanchor_ledger::{EvmLedgerClient, LedgerClient};

pub use coordinator::AnchorCoordinator;
pub use query::AnchorQueryService;

/// Coordinator and query service sharing one ledger handle.
#[derive(Debug, Clone)]
pub struct AnchorService {
    pub coordinator: AnchorCoordinator,
    pub query: AnchorQueryService,
    ledger: Arc<dyn LedgerClient>,
}

impl AnchorService {
    pub fn new(ledger: Arc<dyn LedgerClient>, retry: RetryPolicy) -> Self {
        Self {
            coordinator: AnchorCoordinator::new(Arc::clone(&ledger), retry),
            query: AnchorQueryService::new(Arc::clone(&ledger), retry),
            ledger,
        }
    }

    /// Validate `settings` and connect to the configured EVM ledger.
    ///
    /// Fails with [`AnchorError::MissingConfiguration`] before any network
    /// call when a required setting is absent.
    pub fn connect(settings: LedgerSettings) -> Result<Self, AnchorError> {
        let client = EvmLedgerClient::from_settings(settings)?;
        let retry = client.config().retry;
        tracing::info!(
            network = client.network(),
            contract = %client.config().contract_address,
            signer = %client.submitter(),
            "ledger client configured"
        );
        Ok(Self::new(Arc::new(client), retry))
    }

    /// The shared ledger handle.
    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }
}
