//! # vcanchor-core: Foundational Types for Credential Anchoring
//!
//! Leaf crate of the workspace. Defines the commitment a credential
//! identifier is reduced to before it touches a ledger, the records the
//! ledger keeps about it, the caller-facing error taxonomy, and the
//! configuration every ledger client is built from.
//!
//! ## Key Design Principles
//!
//! 1. **Only commitments go on-chain.** [`Commitment::derive`] is the single
//!    path from identifier to ledger key: SHA-256 over the raw UTF-8 bytes,
//!    no normalization.
//!
//! 2. **Validated newtypes.** [`LedgerAddress`] and [`Commitment`] are
//!    parsed once at the boundary; no bare hex strings flow inward.
//!
//! 3. **Duplicates are not errors.** [`AnchorOutcome`] models "already
//!    anchored" as a success variant; [`AnchorError`] has no duplicate case.
//!
//! 4. **Explicit configuration.** [`LedgerConfig`] is built once at startup
//!    and passed by reference. Nothing below the binaries reads the
//!    environment.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vcanchor-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod address;
pub mod commitment;
pub mod config;
pub mod error;
pub mod hex;
pub mod record;

pub use address::LedgerAddress;
pub use commitment::{Commitment, COMMITMENT_LEN};
pub use config::{LedgerConfig, LedgerSettings, RetryPolicy, SigningCredential};
pub use error::{AnchorError, ConfigError, ParseError};
pub use record::{AnchorOutcome, AnchorRecord, AnchorResult, AnchorState, PendingTransaction};
