//! # vcanchor-ledger: Ledger Access
//!
//! Everything that talks to the ledger hosting the anchor program:
//!
//! - **Client** ([`client`]): The sealed [`LedgerClient`] trait. Reads
//!   records, submits anchoring transactions, awaits confirmation.
//!
//! - **EVM** ([`evm`]): [`EvmLedgerClient`], JSON-RPC against an
//!   EVM-compatible chain. Signing is delegated to the endpoint.
//!
//! - **In-Memory** ([`memory`]): [`InMemoryLedger`], a simulated chain with
//!   the same write-once semantics plus fault injection, for tests and
//!   local development.
//!
//! - **ABI** ([`abi`]): Calldata encoding and return/event decoding for the
//!   anchor program.
//!
//! - **Retry** ([`retry`]): Bounded exponential backoff for transient
//!   failures.
//!
//! ## Crate Policy
//!
//! - Depends on `vcanchor-core` only internally.
//! - Errors are [`LedgerError`]; they convert into
//!   [`vcanchor_core::AnchorError`] at the service boundary.
//! - No private keys are held anywhere in this crate.

pub mod abi;
pub mod client;
pub mod error;
pub mod evm;
pub mod memory;
pub mod retry;

pub use client::LedgerClient;
pub use error::LedgerError;
pub use evm::EvmLedgerClient;
pub use memory::InMemoryLedger;
pub use retry::with_retry;
