//! # Anchor Records and Results
//!
//! [`AnchorRecord`] mirrors the ledger-resident entry written by the anchor
//! program. Everything else here is service-local and transient:
//! [`PendingTransaction`] is the handle between submission and confirmation,
//! [`AnchorOutcome`] is the coordinator's explicit result variant, and
//! [`AnchorResult`] is its flattened wire form.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::address::LedgerAddress;
use crate::commitment::Commitment;

/// The ledger's record of an anchored commitment.
///
/// Written once by the first successful submission; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// The anchored commitment (the record's key on the ledger).
    pub commitment: Commitment,
    /// Height of the block that included the anchoring transaction.
    pub block_height: u64,
    /// Block timestamp, Unix seconds.
    pub timestamp: u64,
    /// Account that submitted the winning transaction.
    pub submitter: LedgerAddress,
}

impl AnchorRecord {
    /// Block timestamp as a UTC datetime, if representable.
    pub fn anchored_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.timestamp).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

/// A submitted, not yet confirmed, anchoring transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Ledger transaction identifier (hash).
    pub transaction_id: String,
    /// Commitment the transaction attempts to anchor.
    pub commitment: Commitment,
    /// Local time the transaction was handed to the network.
    pub submitted_at: DateTime<Utc>,
}

impl PendingTransaction {
    /// Create a pending transaction stamped with the current time.
    pub fn new(transaction_id: impl Into<String>, commitment: Commitment) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            commitment,
            submitted_at: Utc::now(),
        }
    }
}

/// Outcome of an anchoring request.
///
/// Both variants are successes: a duplicate anchor is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorOutcome {
    /// This call's transaction wrote the record.
    Anchored {
        transaction_id: String,
        record: AnchorRecord,
    },
    /// The record already existed, or another submitter won the race.
    ///
    /// `transaction_id` is best-effort and usually unknown.
    AlreadyAnchored {
        transaction_id: Option<String>,
        record: AnchorRecord,
    },
}

impl AnchorOutcome {
    /// The authoritative ledger record.
    pub fn record(&self) -> &AnchorRecord {
        match self {
            Self::Anchored { record, .. } | Self::AlreadyAnchored { record, .. } => record,
        }
    }

    /// Whether the record existed before this call's transaction.
    pub fn already_anchored(&self) -> bool {
        matches!(self, Self::AlreadyAnchored { .. })
    }

    /// Transaction identifier, when known.
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Self::Anchored { transaction_id, .. } => Some(transaction_id),
            Self::AlreadyAnchored { transaction_id, .. } => transaction_id.as_deref(),
        }
    }
}

/// Flattened result returned to callers of `anchor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorResult {
    /// Transaction identifier; `None` when unknown (already anchored).
    pub transaction_id: Option<String>,
    /// Block height of the authoritative record.
    pub block_height: u64,
    /// `true` if the commitment was anchored before this call's transaction.
    pub already_anchored: bool,
}

impl From<&AnchorOutcome> for AnchorResult {
    fn from(outcome: &AnchorOutcome) -> Self {
        Self {
            transaction_id: outcome.transaction_id().map(str::to_string),
            block_height: outcome.record().block_height,
            already_anchored: outcome.already_anchored(),
        }
    }
}

impl From<AnchorOutcome> for AnchorResult {
    fn from(outcome: AnchorOutcome) -> Self {
        Self::from(&outcome)
    }
}

/// Three-valued anchoring status.
///
/// Distinguishes "definitely not anchored" from "could not determine".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorState {
    /// A record exists on the ledger.
    Anchored,
    /// The ledger answered and holds no record (yet).
    NotAnchored,
    /// The ledger could not be read.
    Unknown,
}

impl AnchorState {
    /// Collapse to a boolean, treating `Unknown` as not anchored.
    pub fn is_anchored(&self) -> bool {
        matches!(self, Self::Anchored)
    }

    /// Returns the state identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anchored => "anchored",
            Self::NotAnchored => "not_anchored",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AnchorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
