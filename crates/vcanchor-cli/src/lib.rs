//! # vcanchor-cli: Command-Line Client
//!
//! ## Subcommands
//!
//! - `derive`: Print the commitment for an identifier. Needs no ledger.
//! - `anchor`: Anchor an identifier and wait for confirmation.
//! - `status`: Whether an identifier is anchored.
//! - `info`: The ledger record for an identifier.
//!
//! Ledger settings resolve from `--config` (YAML), then `VCANCHOR_*`
//! environment variables, then flags; later sources win.
//!
//! ## Exit Codes
//!
//! `0` success or anchored, `1` error, `2` not anchored, `3` status unknown.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers here return a [`Report`]
//!   so they can be tested without a terminal.
//! - Handler functions delegate to `vcanchor-service`; no anchoring logic here.

pub mod anchor;
pub mod ledger;

pub use anchor::Report;
