//! # Anchor Query Service
//!
//! Read-only lookups by credential identifier. Never submits a transaction.

use std::sync::Arc;

use vcanchor_core::{AnchorError, AnchorRecord, AnchorState, Commitment, RetryPolicy};
use vcanchor_ledger::{with_retry, LedgerClient};

use crate::metrics;

/// Answers "is this credential anchored, and where?"
#[derive(Debug, Clone)]
pub struct AnchorQueryService {
    ledger: Arc<dyn LedgerClient>,
    retry: RetryPolicy,
}

impl AnchorQueryService {
    pub fn new(ledger: Arc<dyn LedgerClient>, retry: RetryPolicy) -> Self {
        Self { ledger, retry }
    }

    /// Whether `identifier` is anchored.
    ///
    /// Availability first: a failed read is logged and reported as `false`.
    /// Use [`check`](Self::check) to tell "not anchored" from "unknown".
    pub async fn status(&self, identifier: &str) -> bool {
        self.check(identifier).await.is_anchored()
    }

    /// Three-valued status of `identifier`.
    pub async fn check(&self, identifier: &str) -> AnchorState {
        self.check_commitment(&Commitment::derive(identifier)).await
    }

    /// Three-valued status of an already derived commitment.
    pub async fn check_commitment(&self, commitment: &Commitment) -> AnchorState {
        let state = match self.read(commitment).await {
            Ok(Some(_)) => AnchorState::Anchored,
            Ok(None) => AnchorState::NotAnchored,
            Err(e) => {
                tracing::warn!(commitment = %commitment, "anchor status unknown: {e}");
                AnchorState::Unknown
            }
        };
        metrics::record_query("status", state.as_str());
        state
    }

    /// The ledger record for `identifier`.
    pub async fn info(&self, identifier: &str) -> Result<AnchorRecord, AnchorError> {
        let commitment = Commitment::derive(identifier);
        let result = match self.read(&commitment).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(AnchorError::NotAnchored { commitment }),
            Err(e) => Err(e),
        };
        let state = match &result {
            Ok(_) => AnchorState::Anchored,
            Err(AnchorError::NotAnchored { .. }) => AnchorState::NotAnchored,
            Err(_) => AnchorState::Unknown,
        };
        metrics::record_query("info", state.as_str());
        result
    }

    /// Whether the ledger answers reads at all. Used for readiness probes.
    pub async fn ledger_reachable(&self) -> bool {
        match self.ledger.is_anchored(&Commitment::zero()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(network = self.ledger.network(), "ledger unreachable: {e}");
                false
            }
        }
    }

    async fn read(&self, commitment: &Commitment) -> Result<Option<AnchorRecord>, AnchorError> {
        with_retry(&self.retry, "read_anchor", || self.ledger.read_anchor(commitment))
            .await
            .map_err(AnchorError::from)
    }
}
