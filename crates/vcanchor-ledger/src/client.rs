//! # Ledger Client Interface
//!
//! The only place the rest of the system touches a ledger. Implementations
//! translate between commitments/records and whatever the ledger speaks;
//! callers never see transport details.
//!
//! ## Contract
//!
//! - `read_anchor` never changes ledger state and is safe to retry.
//! - `submit_anchor` hands exactly one transaction to the network per call.
//!   It returns as soon as the transaction is accepted, before inclusion.
//! - `await_confirmation` blocks until the transaction has the configured
//!   number of confirmations, reverts, or the configured timeout elapses.
//!
//! The trait is sealed: the write-once and confirmation semantics the
//! coordinator relies on are only guaranteed by the implementations in this
//! crate.

use async_trait::async_trait;
use vcanchor_core::{AnchorRecord, Commitment, LedgerAddress, PendingTransaction};

use crate::error::LedgerError;

/// Access to the anchor program on a ledger.
#[async_trait]
pub trait LedgerClient: private::Sealed + Send + Sync + std::fmt::Debug {
    /// Look up the anchor record for a commitment.
    ///
    /// `Ok(None)` means the ledger positively has no record.
    async fn read_anchor(
        &self,
        commitment: &Commitment,
    ) -> Result<Option<AnchorRecord>, LedgerError>;

    /// Look up the anchor record at the chain head, ignoring any configured
    /// finality lag. Used to explain a reverted submission, where the
    /// competing record may be only a block old.
    async fn read_latest_anchor(
        &self,
        commitment: &Commitment,
    ) -> Result<Option<AnchorRecord>, LedgerError> {
        self.read_anchor(commitment).await
    }

    /// Cheap existence check.
    async fn is_anchored(&self, commitment: &Commitment) -> Result<bool, LedgerError> {
        Ok(self.read_anchor(commitment).await?.is_some())
    }

    /// Submit an anchoring transaction for `commitment`.
    async fn submit_anchor(
        &self,
        commitment: &Commitment,
    ) -> Result<PendingTransaction, LedgerError>;

    /// Wait for a submitted transaction to be confirmed and return the
    /// record it wrote.
    ///
    /// A transaction that was included but recorded nothing (the commitment
    /// was already anchored) is reported as [`LedgerError::TransactionReverted`].
    async fn await_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> Result<AnchorRecord, LedgerError>;

    /// Label of the connected network, for logs.
    fn network(&self) -> &str;

    /// Account submissions are sent from.
    fn submitter(&self) -> LedgerAddress;
}

mod private {
    pub trait Sealed {}
    impl Sealed for crate::evm::EvmLedgerClient {}
    impl Sealed for crate::memory::InMemoryLedger {}
}
