//! # Anchor Coordinator
//!
//! Idempotent anchoring of a credential identifier.
//!
//! ## Flow
//!
//! 1. Derive the commitment.
//! 2. Read the ledger (with retry). An existing record is returned as
//!    [`AnchorOutcome::AlreadyAnchored`] without submitting anything.
//! 3. Submit (retrying only failures that provably never reached the node),
//!    then await confirmation.
//! 4. A revert is re-checked at the chain head: if a record now exists,
//!    another submitter won and the call still succeeds with
//!    `AlreadyAnchored`; otherwise it is [`AnchorError::Rejected`].
//!
//! The read in step 2 is not a lock. Two coordinators can both pass it; the
//! anchor program's first-writer-wins rule decides, and step 4 turns the
//! loser's revert into a success.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;
use vcanchor_core::{AnchorError, AnchorOutcome, AnchorRecord, Commitment, RetryPolicy};
use vcanchor_ledger::{with_retry, LedgerClient, LedgerError};

use crate::metrics;

/// Drives anchoring requests against a ledger.
#[derive(Debug, Clone)]
pub struct AnchorCoordinator {
    ledger: Arc<dyn LedgerClient>,
    retry: RetryPolicy,
}

impl AnchorCoordinator {
    pub fn new(ledger: Arc<dyn LedgerClient>, retry: RetryPolicy) -> Self {
        Self { ledger, retry }
    }

    /// Anchor `identifier`, or report the existing anchor.
    pub async fn anchor(&self, identifier: &str) -> Result<AnchorOutcome, AnchorError> {
        let commitment = Commitment::derive(identifier);
        let span = tracing::info_span!(
            "anchor",
            operation_id = %Uuid::new_v4(),
            commitment = %commitment,
            network = self.ledger.network(),
        );
        let started = Instant::now();
        let result = self.anchor_commitment(&commitment).instrument(span).await;

        let outcome = match &result {
            Ok(AnchorOutcome::Anchored { .. }) => "anchored",
            Ok(AnchorOutcome::AlreadyAnchored { .. }) => "already_anchored",
            Err(e) => e.kind(),
        };
        metrics::record_anchor(outcome, started.elapsed().as_secs_f64());
        result
    }

    async fn anchor_commitment(
        &self,
        commitment: &Commitment,
    ) -> Result<AnchorOutcome, AnchorError> {
        if let Some(record) = self.read(commitment).await? {
            tracing::info!(block_height = record.block_height, "already anchored");
            return Ok(AnchorOutcome::AlreadyAnchored {
                transaction_id: None,
                record,
            });
        }

        let submitted = with_retry(&self.retry, "submit_anchor", || {
            self.ledger.submit_anchor(commitment)
        })
        .await;
        let pending = match submitted {
            Ok(pending) => pending,
            Err(LedgerError::TransactionReverted {
                transaction_id,
                reason,
            }) => return self.resolve_revert(commitment, transaction_id, reason).await,
            Err(e) => return Err(e.into()),
        };
        tracing::info!(transaction_id = %pending.transaction_id, "awaiting confirmation");

        let waiting = Instant::now();
        let confirmed = self.ledger.await_confirmation(&pending).await;
        metrics::record_confirmation(waiting.elapsed().as_secs_f64());

        match confirmed {
            Ok(record) => {
                tracing::info!(
                    transaction_id = %pending.transaction_id,
                    block_height = record.block_height,
                    "anchored"
                );
                Ok(AnchorOutcome::Anchored {
                    transaction_id: pending.transaction_id,
                    record,
                })
            }
            Err(LedgerError::TransactionReverted {
                transaction_id,
                reason,
            }) => self.resolve_revert(commitment, transaction_id, reason).await,
            Err(e) => {
                tracing::warn!(transaction_id = %pending.transaction_id, "confirmation failed: {e}");
                Err(e.into())
            }
        }
    }

    /// A revert means either a duplicate (record exists at the chain head)
    /// or a genuine rejection (no record).
    async fn resolve_revert(
        &self,
        commitment: &Commitment,
        transaction_id: Option<String>,
        reason: String,
    ) -> Result<AnchorOutcome, AnchorError> {
        let latest = with_retry(&self.retry, "read_latest_anchor", || {
            self.ledger.read_latest_anchor(commitment)
        })
        .await?;
        match latest {
            Some(record) => {
                tracing::info!(
                    block_height = record.block_height,
                    submitter = %record.submitter,
                    "lost anchoring race; commitment already anchored"
                );
                Ok(AnchorOutcome::AlreadyAnchored {
                    transaction_id: None,
                    record,
                })
            }
            None => {
                tracing::warn!(?transaction_id, %reason, "anchor transaction rejected");
                Err(AnchorError::Rejected {
                    transaction_id,
                    reason,
                })
            }
        }
    }

    async fn read(&self, commitment: &Commitment) -> Result<Option<AnchorRecord>, AnchorError> {
        with_retry(&self.retry, "read_anchor", || self.ledger.read_anchor(commitment))
            .await
            .map_err(AnchorError::from)
    }
}
