//! # Ledger Arguments
//!
//! Global flags that locate the ledger, merged with the YAML file and the
//! environment into [`LedgerSettings`].

use std::path::PathBuf;

use clap::Args;
use vcanchor_core::{ConfigError, LedgerSettings};

/// Ledger connection flags shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct LedgerArgs {
    /// YAML file with ledger settings.
    #[arg(long, global = true, env = "VCANCHOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON-RPC endpoint of the ledger node.
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Account that signs anchor transactions (unlocked on the node).
    #[arg(long, global = true)]
    pub signer: Option<String>,

    /// Address of the anchoring program.
    #[arg(long, global = true)]
    pub contract: Option<String>,

    /// Chain id included in submitted transactions.
    #[arg(long, global = true)]
    pub chain_id: Option<u64>,
}

impl LedgerArgs {
    /// Resolve settings from the config file, the process environment, and
    /// these flags.
    pub fn settings(&self) -> Result<LedgerSettings, ConfigError> {
        self.settings_with(|key| std::env::var(key).ok())
    }

    /// Resolve settings with `lookup` standing in for the environment.
    pub fn settings_with<F>(&self, lookup: F) -> Result<LedgerSettings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match &self.config {
            Some(path) => LedgerSettings::from_yaml_file(path)?,
            None => LedgerSettings::default(),
        };
        let env = LedgerSettings::from_lookup(lookup)?;
        Ok(file.overlay(env).overlay(self.flags()))
    }

    fn flags(&self) -> LedgerSettings {
        LedgerSettings {
            rpc_url: self.rpc_url.clone(),
            signer_address: self.signer.clone(),
            contract_address: self.contract.clone(),
            chain_id: self.chain_id,
            ..Default::default()
        }
    }
}
