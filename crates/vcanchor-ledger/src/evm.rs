//! # EVM JSON-RPC Ledger Client
//!
//! Production [`LedgerClient`] that talks to an anchor program deployed on an
//! EVM-compatible chain via JSON-RPC.
//!
//! ## How It Works
//!
//! 1. Reads call `getAnchorInfo(bytes32)` via `eth_call` against the
//!    configured block tag. The re-read after a reverted submission uses
//!    `latest`, since the competing record may not be `safe` or `finalized`
//!    yet.
//! 2. Submissions call `anchor(bytes32)` via `eth_sendTransaction`. The
//!    endpoint signs with the configured account (HSM, KMS, or an unlocked
//!    node account); this client never holds private keys.
//! 3. Confirmation polls `eth_getTransactionReceipt` and `eth_blockNumber`
//!    until the receipt's block has the configured depth, then decodes the
//!    `AnchorRecorded` event from the receipt logs.
//!
//! ## Failure Classification
//!
//! Reads are idempotent, so every transport failure and 5xx/429 status is
//! [`LedgerError::Unavailable`] and may be retried. A submission is only
//! `Unavailable` when the connection was never established; anything after
//! the request may have left the process is [`LedgerError::Indeterminate`].

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use vcanchor_core::{
    AnchorError, AnchorRecord, Commitment, LedgerAddress, LedgerConfig, LedgerSettings,
    PendingTransaction,
};

use crate::abi::{self, AbiError};
use crate::client::LedgerClient;
use crate::error::LedgerError;

const LATEST_BLOCK_TAG: &str = "latest";

/// Whether a request can change ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Read,
    Submission,
}

/// What a mined receipt says about an anchoring transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReceiptOutcome {
    /// Included and recorded; `block` is the inclusion height.
    Recorded { block: u64, record: AnchorRecord },
    /// Included but reverted or recorded nothing.
    Reverted(String),
}

/// [`LedgerClient`] for EVM chains.
#[derive(Debug)]
pub struct EvmLedgerClient {
    client: reqwest::Client,
    config: LedgerConfig,
    network: String,
    next_id: AtomicU64,
}

impl EvmLedgerClient {
    /// Create a client from validated configuration.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let network = config.network_label();
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LedgerError::Unavailable {
                network: network.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            config,
            network,
            next_id: AtomicU64::new(1),
        })
    }

    /// Validate raw settings and create a client.
    ///
    /// Missing configuration is reported before any network activity.
    pub fn from_settings(settings: LedgerSettings) -> Result<Self, AnchorError> {
        let config = settings.validate()?;
        Ok(Self::new(config)?)
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(
        &self,
        method: &str,
        params: Value,
        delivery: Delivery,
    ) -> Result<Value, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let resp = self
            .client
            .post(self.config.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(method, &e, delivery))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let reason = format!("{method}: HTTP {status}");
            return Err(match delivery {
                Delivery::Read if status.is_server_error() || status.as_u16() == 429 => {
                    LedgerError::Unavailable {
                        network: self.network.clone(),
                        reason,
                    }
                }
                Delivery::Submission if status.is_server_error() => LedgerError::Indeterminate {
                    network: self.network.clone(),
                    reason,
                },
                _ => LedgerError::Http {
                    network: self.network.clone(),
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let json: Value = resp.json().await.map_err(|e| {
            let reason = format!("{method}: invalid JSON response: {e}");
            match delivery {
                Delivery::Read => LedgerError::MalformedResponse {
                    network: self.network.clone(),
                    reason,
                },
                Delivery::Submission => LedgerError::Indeterminate {
                    network: self.network.clone(),
                    reason,
                },
            }
        })?;

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error")
                .to_string();
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            return Err(LedgerError::Rpc {
                network: self.network.clone(),
                code,
                message,
            });
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| self.malformed(format!("{method}: response missing 'result' field")))
    }

    fn transport_error(&self, method: &str, e: &reqwest::Error, delivery: Delivery) -> LedgerError {
        let reason = if e.is_timeout() {
            format!("{method}: request timed out")
        } else {
            format!("{method}: {e}")
        };
        match delivery {
            Delivery::Submission if !e.is_connect() => LedgerError::Indeterminate {
                network: self.network.clone(),
                reason,
            },
            _ => LedgerError::Unavailable {
                network: self.network.clone(),
                reason,
            },
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> LedgerError {
        LedgerError::MalformedResponse {
            network: self.network.clone(),
            reason: reason.into(),
        }
    }

    fn abi_error(&self, e: AbiError) -> LedgerError {
        self.malformed(e.to_string())
    }

    /// `eth_call` a view function of the anchor program at `block_tag`.
    async fn call_view(&self, calldata: String, block_tag: &str) -> Result<String, LedgerError> {
        let call = json!({
            "to": self.config.contract_address.to_string(),
            "data": calldata,
        });
        let result = self
            .rpc_call("eth_call", json!([call, block_tag]), Delivery::Read)
            .await?;
        let data = result
            .as_str()
            .ok_or_else(|| self.malformed("eth_call returned non-string result"))?;
        if abi::decode_words(data).map(|w| w.is_empty()).unwrap_or(false) {
            return Err(self.malformed(format!(
                "empty return data; is the anchor program deployed at {}?",
                self.config.contract_address
            )));
        }
        Ok(data.to_string())
    }

    async fn anchor_info_at(
        &self,
        commitment: &Commitment,
        block_tag: &str,
    ) -> Result<Option<AnchorRecord>, LedgerError> {
        let data = self
            .call_view(
                abi::encode_call(abi::GET_ANCHOR_INFO_SELECTOR, commitment),
                block_tag,
            )
            .await?;
        abi::decode_anchor_info(commitment, &data).map_err(|e| self.abi_error(e))
    }

    /// Build the `eth_sendTransaction` object for an anchor call.
    fn anchor_transaction(&self, commitment: &Commitment) -> Value {
        let mut tx = json!({
            "from": self.config.signer.account.to_string(),
            "to": self.config.contract_address.to_string(),
            "data": abi::encode_call(abi::ANCHOR_SELECTOR, commitment),
        });
        if let Some(chain_id) = self.config.chain_id {
            tx["chainId"] = Value::String(abi::format_quantity(chain_id));
        }
        tx
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        let result = self
            .rpc_call("eth_blockNumber", json!([]), Delivery::Read)
            .await?;
        let hex = result
            .as_str()
            .ok_or_else(|| self.malformed("eth_blockNumber returned non-string result"))?;
        abi::parse_quantity(hex).map_err(|e| self.abi_error(e))
    }

    /// Poll until the transaction is confirmed or reverted. Unbounded; the
    /// caller applies the timeout.
    ///
    /// Once broadcast, the transaction may still land, so RPC failures while
    /// polling are logged and retried on the next tick. Only a receipt that
    /// cannot be decoded ends the wait early.
    async fn poll_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> Result<AnchorRecord, LedgerError> {
        let tx = &pending.transaction_id;
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let receipt = match self
                .rpc_call("eth_getTransactionReceipt", json!([tx]), Delivery::Read)
                .await
            {
                Ok(receipt) => receipt,
                Err(e) => {
                    tracing::warn!(transaction_id = %tx, "receipt poll failed: {e}");
                    continue;
                }
            };
            if receipt.is_null() {
                tracing::debug!(transaction_id = %tx, "transaction pending");
                continue;
            }

            let outcome = interpret_receipt(
                &receipt,
                &self.config.contract_address,
                &pending.commitment,
            )
            .map_err(|e| self.abi_error(e))?;

            let (block, record) = match outcome {
                ReceiptOutcome::Reverted(reason) => {
                    return Err(LedgerError::TransactionReverted {
                        transaction_id: Some(tx.clone()),
                        reason,
                    });
                }
                ReceiptOutcome::Recorded { block, record } => (block, record),
            };

            let head = match self.block_number().await {
                Ok(head) => head,
                Err(e) => {
                    tracing::warn!(transaction_id = %tx, "block number poll failed: {e}");
                    continue;
                }
            };
            let depth = head.saturating_sub(block) + 1;
            if depth >= self.config.confirmations {
                return Ok(record);
            }
            tracing::debug!(
                transaction_id = %tx,
                depth,
                required = self.config.confirmations,
                "awaiting confirmations"
            );
        }
    }
}

#[async_trait]
impl LedgerClient for EvmLedgerClient {
    async fn read_anchor(
        &self,
        commitment: &Commitment,
    ) -> Result<Option<AnchorRecord>, LedgerError> {
        self.anchor_info_at(commitment, &self.config.block_tag).await
    }

    async fn read_latest_anchor(
        &self,
        commitment: &Commitment,
    ) -> Result<Option<AnchorRecord>, LedgerError> {
        self.anchor_info_at(commitment, LATEST_BLOCK_TAG).await
    }

    async fn is_anchored(&self, commitment: &Commitment) -> Result<bool, LedgerError> {
        let data = self
            .call_view(
                abi::encode_call(abi::IS_ANCHORED_SELECTOR, commitment),
                &self.config.block_tag,
            )
            .await?;
        abi::decode_is_anchored(&data).map_err(|e| self.abi_error(e))
    }

    async fn submit_anchor(
        &self,
        commitment: &Commitment,
    ) -> Result<PendingTransaction, LedgerError> {
        let tx = self.anchor_transaction(commitment);
        let result = match self
            .rpc_call("eth_sendTransaction", json!([tx]), Delivery::Submission)
            .await
        {
            Ok(result) => result,
            // Gas estimation runs the call first; a revert there means the
            // transaction was never broadcast.
            Err(LedgerError::Rpc { message, .. })
                if message.to_ascii_lowercase().contains("revert") =>
            {
                return Err(LedgerError::TransactionReverted {
                    transaction_id: None,
                    reason: message,
                });
            }
            Err(e) => return Err(e),
        };

        let transaction_id = result.as_str().ok_or_else(|| LedgerError::Indeterminate {
            network: self.network.clone(),
            reason: "eth_sendTransaction returned non-string result".to_string(),
        })?;
        tracing::info!(
            network = %self.network,
            commitment = %commitment,
            transaction_id,
            "anchor transaction submitted"
        );
        Ok(PendingTransaction::new(transaction_id, *commitment))
    }

    async fn await_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> Result<AnchorRecord, LedgerError> {
        let waited = self.config.confirmation_timeout;
        match tokio::time::timeout(waited, self.poll_confirmation(pending)).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::ConfirmationTimeout {
                transaction_id: pending.transaction_id.clone(),
                waited,
            }),
        }
    }

    fn network(&self) -> &str {
        &self.network
    }

    fn submitter(&self) -> LedgerAddress {
        self.config.signer.account
    }
}

/// Interpret a mined receipt for an anchor transaction on `commitment`.
pub(crate) fn interpret_receipt(
    receipt: &Value,
    contract: &LedgerAddress,
    commitment: &Commitment,
) -> Result<ReceiptOutcome, AbiError> {
    // Pre-Byzantium receipts carry no status; treat them as successful and
    // rely on the event.
    if let Some(status) = receipt.get("status").and_then(Value::as_str) {
        if abi::parse_quantity(status)? == 0 {
            return Ok(ReceiptOutcome::Reverted("receipt status 0x0".to_string()));
        }
    }

    let block = receipt
        .get("blockNumber")
        .and_then(Value::as_str)
        .ok_or_else(|| AbiError("receipt missing blockNumber".to_string()))
        .and_then(abi::parse_quantity)?;

    let contract = contract.to_string();
    let logs = receipt
        .get("logs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for log in logs {
        let from_contract = log
            .get("address")
            .and_then(Value::as_str)
            .is_some_and(|a| a.eq_ignore_ascii_case(&contract));
        if !from_contract {
            continue;
        }
        let topics: Vec<String> = log
            .get("topics")
            .and_then(Value::as_array)
            .map(|ts| {
                ts.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let data = log.get("data").and_then(Value::as_str).unwrap_or("0x");
        if let Some(record) = abi::decode_anchor_recorded(&topics, data)? {
            if record.commitment == *commitment {
                return Ok(ReceiptOutcome::Recorded { block, record });
            }
        }
    }

    Ok(ReceiptOutcome::Reverted(
        "transaction recorded no AnchorRecorded event".to_string(),
    ))
}
