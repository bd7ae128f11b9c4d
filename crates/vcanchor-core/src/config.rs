//! # Ledger Configuration
//!
//! Configuration is gathered once at startup into a [`LedgerSettings`]
//! (every field optional, from environment, YAML, or CLI flags), then
//! validated into a [`LedgerConfig`] that is passed by reference into the
//! ledger client constructor. Business logic never reads the environment.
//!
//! Required: endpoint URL, signing credential, program address. Absence of
//! any of them is a [`ConfigError::Missing`] before any network call.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::LedgerAddress;
use crate::error::ConfigError;

pub const ENV_RPC_URL: &str = "VCANCHOR_RPC_URL";
pub const ENV_SIGNER_ADDRESS: &str = "VCANCHOR_SIGNER_ADDRESS";
pub const ENV_CONTRACT_ADDRESS: &str = "VCANCHOR_CONTRACT_ADDRESS";
pub const ENV_CHAIN_ID: &str = "VCANCHOR_CHAIN_ID";
pub const ENV_CONFIRMATIONS: &str = "VCANCHOR_CONFIRMATIONS";
pub const ENV_CONFIRMATION_TIMEOUT_SECS: &str = "VCANCHOR_CONFIRMATION_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL_MS: &str = "VCANCHOR_POLL_INTERVAL_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "VCANCHOR_REQUEST_TIMEOUT_SECS";
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "VCANCHOR_RETRY_MAX_ATTEMPTS";
pub const ENV_BLOCK_TAG: &str = "VCANCHOR_BLOCK_TAG";

const DEFAULT_CONFIRMATIONS: u64 = 1;
const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BLOCK_TAG: &str = "latest";
const BLOCK_TAGS: [&str; 3] = ["latest", "safe", "finalized"];

/// Bounded exponential backoff for pre-submission ledger calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (minimum 1).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// 200ms → 400ms → 800ms … with the default policy, capped at
    /// `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// The signing identity used for anchoring transactions.
///
/// The key itself is held by the endpoint's key management (HSM, KMS, or an
/// unlocked node account); this service only names the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningCredential {
    /// Account whose transactions the endpoint signs.
    pub account: LedgerAddress,
}

/// Validated ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint (http or https).
    pub rpc_url: url::Url,
    /// Signing identity for submissions.
    pub signer: SigningCredential,
    /// Address of the deployed anchor program.
    pub contract_address: LedgerAddress,
    /// Chain id to pin transactions to, if known.
    pub chain_id: Option<u64>,
    /// Blocks (including the inclusion block) before a transaction counts as
    /// confirmed.
    pub confirmations: u64,
    /// Upper bound on `await_confirmation`.
    pub confirmation_timeout: Duration,
    /// Delay between receipt polls.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Block tag used for reads (`latest`, `safe`, or `finalized`).
    pub block_tag: String,
    /// Retry policy for pre-submission calls.
    pub retry: RetryPolicy,
}

impl LedgerConfig {
    /// Build a configuration with defaults for everything but the three
    /// required inputs.
    pub fn new(
        rpc_url: url::Url,
        signer: SigningCredential,
        contract_address: LedgerAddress,
    ) -> Self {
        Self {
            rpc_url,
            signer,
            contract_address,
            chain_id: None,
            confirmations: DEFAULT_CONFIRMATIONS,
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            block_tag: DEFAULT_BLOCK_TAG.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Network label for logs and errors (`host[:port]`).
    pub fn network_label(&self) -> String {
        match (self.rpc_url.host_str(), self.rpc_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => self.rpc_url.to_string(),
        }
    }
}

/// Unvalidated settings, every field optional.
///
/// Sources are merged with [`LedgerSettings::overlay`]; later sources win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerSettings {
    pub rpc_url: Option<String>,
    pub signer_address: Option<String>,
    pub contract_address: Option<String>,
    pub chain_id: Option<u64>,
    pub confirmations: Option<u64>,
    pub confirmation_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub retry_max_attempts: Option<u32>,
    pub block_tag: Option<String>,
}

impl LedgerSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            rpc_url: get(ENV_RPC_URL),
            signer_address: get(ENV_SIGNER_ADDRESS),
            contract_address: get(ENV_CONTRACT_ADDRESS),
            chain_id: parse_number(ENV_CHAIN_ID, get(ENV_CHAIN_ID))?,
            confirmations: parse_number(ENV_CONFIRMATIONS, get(ENV_CONFIRMATIONS))?,
            confirmation_timeout_secs: parse_number(
                ENV_CONFIRMATION_TIMEOUT_SECS,
                get(ENV_CONFIRMATION_TIMEOUT_SECS),
            )?,
            poll_interval_ms: parse_number(ENV_POLL_INTERVAL_MS, get(ENV_POLL_INTERVAL_MS))?,
            request_timeout_secs: parse_number(
                ENV_REQUEST_TIMEOUT_SECS,
                get(ENV_REQUEST_TIMEOUT_SECS),
            )?,
            retry_max_attempts: parse_number(
                ENV_RETRY_MAX_ATTEMPTS,
                get(ENV_RETRY_MAX_ATTEMPTS),
            )?,
            block_tag: get(ENV_BLOCK_TAG),
        })
    }

    /// Load settings from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let file_err = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| file_err(e.to_string()))?;
        serde_yaml::from_str(&text).map_err(|e| file_err(e.to_string()))
    }

    /// Overlay `other` on top of `self`: any field set in `other` wins.
    pub fn overlay(self, other: LedgerSettings) -> Self {
        Self {
            rpc_url: other.rpc_url.or(self.rpc_url),
            signer_address: other.signer_address.or(self.signer_address),
            contract_address: other.contract_address.or(self.contract_address),
            chain_id: other.chain_id.or(self.chain_id),
            confirmations: other.confirmations.or(self.confirmations),
            confirmation_timeout_secs: other
                .confirmation_timeout_secs
                .or(self.confirmation_timeout_secs),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            retry_max_attempts: other.retry_max_attempts.or(self.retry_max_attempts),
            block_tag: other.block_tag.or(self.block_tag),
        }
    }

    /// Validate into a [`LedgerConfig`].
    ///
    /// Checks the signing credential first so its absence is reported even
    /// when other settings are also missing.
    pub fn validate(self) -> Result<LedgerConfig, ConfigError> {
        let signer = self
            .signer_address
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_SIGNER_ADDRESS))
            .and_then(|s| parse_address(ENV_SIGNER_ADDRESS, s))?;
        let rpc_url = self
            .rpc_url
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_RPC_URL))
            .and_then(parse_rpc_url)?;
        let contract_address = self
            .contract_address
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_CONTRACT_ADDRESS))
            .and_then(|s| parse_address(ENV_CONTRACT_ADDRESS, s))?;

        let mut config = LedgerConfig::new(
            rpc_url,
            SigningCredential { account: signer },
            contract_address,
        );
        config.chain_id = self.chain_id;

        if let Some(confirmations) = self.confirmations {
            if confirmations == 0 {
                return Err(ConfigError::Invalid {
                    name: ENV_CONFIRMATIONS,
                    reason: "must be at least 1".to_string(),
                });
            }
            config.confirmations = confirmations;
        }
        if let Some(secs) = self.confirmation_timeout_secs {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: ENV_CONFIRMATION_TIMEOUT_SECS,
                    reason: "must be positive".to_string(),
                });
            }
            config.confirmation_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(attempts) = self.retry_max_attempts {
            config.retry.max_attempts = attempts.max(1);
        }
        if let Some(tag) = self.block_tag {
            let tag = tag.trim().to_ascii_lowercase();
            if !BLOCK_TAGS.contains(&tag.as_str()) {
                return Err(ConfigError::Invalid {
                    name: ENV_BLOCK_TAG,
                    reason: format!("expected one of {BLOCK_TAGS:?}, got {tag:?}"),
                });
            }
            config.block_tag = tag;
        }
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.map(|v| {
        v.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: format!("{v:?}: {e}"),
        })
    })
    .transpose()
}

fn parse_address(name: &'static str, raw: &str) -> Result<LedgerAddress, ConfigError> {
    LedgerAddress::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_rpc_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url = url::Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        name: ENV_RPC_URL,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            name: ENV_RPC_URL,
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}
