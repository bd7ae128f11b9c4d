//! # In-Memory Ledger
//!
//! A simulated chain running the anchor program in process, for tests and
//! local development. Semantics follow the deployed program:
//!
//! - Submissions enter a mempool and are mined into the next block in
//!   submission order. The first transaction for a commitment writes the
//!   record and emits `AnchorRecorded`; later ones in the same or later
//!   blocks revert.
//! - A submission for a commitment that is already recorded fails gas
//!   estimation and is never broadcast.
//! - Blocks are produced when a caller awaits confirmation, unless block
//!   production is paused, in which case only [`InMemoryLedger::mine`]
//!   produces blocks.
//!
//! Handles created with [`InMemoryLedger::connect_as`] share one chain, so
//! several submitters can race for the same commitment.
//!
//! Fault injection hooks let tests exercise outages, front-running, and
//! stalled confirmation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use vcanchor_core::hex;
use vcanchor_core::{AnchorRecord, Commitment, LedgerAddress, PendingTransaction};

use crate::client::LedgerClient;
use crate::error::LedgerError;

const NETWORK: &str = "in-memory";
const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone)]
struct QueuedTransaction {
    transaction_id: String,
    commitment: Commitment,
    submitter: LedgerAddress,
}

#[derive(Debug, Clone)]
enum Receipt {
    Recorded(AnchorRecord),
    Reverted { block_height: u64 },
}

#[derive(Debug, Default)]
struct ChainState {
    height: u64,
    last_timestamp: u64,
    nonce: u64,
    records: HashMap<Commitment, AnchorRecord>,
    mempool: Vec<QueuedTransaction>,
    receipts: HashMap<String, Receipt>,
    events: Vec<AnchorRecord>,
    paused: bool,
    failing_reads: u32,
    failing_submissions: u32,
    front_runner: Option<LedgerAddress>,
    revert_next: bool,
    doomed: HashSet<String>,
    submissions: u64,
}

impl ChainState {
    fn enqueue(&mut self, commitment: Commitment, submitter: LedgerAddress) -> String {
        self.nonce += 1;
        let mut hasher = Sha256::new();
        hasher.update(submitter.as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(commitment.as_bytes());
        let transaction_id = format!("0x{}", hex::encode(&hasher.finalize()));
        self.mempool.push(QueuedTransaction {
            transaction_id: transaction_id.clone(),
            commitment,
            submitter,
        });
        transaction_id
    }

    /// Produce one block containing the whole mempool.
    fn mine_block(&mut self) -> u64 {
        self.height += 1;
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        self.last_timestamp = now.max(self.last_timestamp + 1);
        let block_height = self.height;
        for tx in std::mem::take(&mut self.mempool) {
            let doomed = self.doomed.remove(&tx.transaction_id);
            let receipt = if doomed || self.records.contains_key(&tx.commitment) {
                Receipt::Reverted { block_height }
            } else {
                let record = AnchorRecord {
                    commitment: tx.commitment,
                    block_height,
                    timestamp: self.last_timestamp,
                    submitter: tx.submitter,
                };
                self.records.insert(tx.commitment, record.clone());
                self.events.push(record.clone());
                Receipt::Recorded(record)
            };
            self.receipts.insert(tx.transaction_id, receipt);
        }
        block_height
    }

    fn in_mempool(&self, transaction_id: &str) -> bool {
        self.mempool.iter().any(|tx| tx.transaction_id == transaction_id)
    }
}

/// [`LedgerClient`] backed by a simulated in-process chain.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    chain: Arc<Mutex<ChainState>>,
    submitter: LedgerAddress,
    confirmation_timeout: Duration,
}

impl InMemoryLedger {
    /// Start a fresh chain with `submitter` as this handle's account.
    pub fn new(submitter: LedgerAddress) -> Self {
        Self {
            chain: Arc::new(Mutex::new(ChainState::default())),
            submitter,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    /// Another handle on the same chain, submitting as `submitter`.
    pub fn connect_as(&self, submitter: LedgerAddress) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            submitter,
            confirmation_timeout: self.confirmation_timeout,
        }
    }

    /// Bound `await_confirmation` by `timeout`.
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Make the next `n` reads fail as unavailable.
    pub fn fail_next_reads(&self, n: u32) {
        self.chain.lock().failing_reads = n;
    }

    /// Make the next `n` submissions fail as unavailable, before reaching
    /// the mempool.
    pub fn fail_next_submissions(&self, n: u32) {
        self.chain.lock().failing_submissions = n;
    }

    /// Slip a transaction from `competitor` for the same commitment into the
    /// mempool ahead of the next submission.
    pub fn front_run_next_submission(&self, competitor: LedgerAddress) {
        self.chain.lock().front_runner = Some(competitor);
    }

    /// Make the next submission revert on inclusion without recording
    /// anything, as an out-of-gas or paused program would.
    pub fn revert_next_submission(&self) {
        self.chain.lock().revert_next = true;
    }

    /// Stop producing blocks on `await_confirmation`.
    pub fn pause_block_production(&self) {
        self.chain.lock().paused = true;
    }

    /// Resume producing blocks on `await_confirmation`.
    pub fn resume_block_production(&self) {
        self.chain.lock().paused = false;
    }

    /// Produce a block from the current mempool, returning its height.
    pub fn mine(&self) -> u64 {
        self.chain.lock().mine_block()
    }

    /// Current chain height.
    pub fn height(&self) -> u64 {
        self.chain.lock().height
    }

    /// `AnchorRecorded` events emitted so far, in emission order.
    pub fn events(&self) -> Vec<AnchorRecord> {
        self.chain.lock().events.clone()
    }

    /// Number of transactions handed to the mempool through
    /// [`LedgerClient::submit_anchor`] on any handle.
    pub fn submitted_transactions(&self) -> u64 {
        self.chain.lock().submissions
    }

    fn unavailable(reason: &str) -> LedgerError {
        LedgerError::Unavailable {
            network: NETWORK.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Settle `transaction_id` if possible, producing a block when allowed.
    fn settle(&self, transaction_id: &str) -> Result<Option<Receipt>, LedgerError> {
        let mut chain = self.chain.lock();
        if let Some(receipt) = chain.receipts.get(transaction_id) {
            return Ok(Some(receipt.clone()));
        }
        if !chain.in_mempool(transaction_id) {
            return Err(LedgerError::MalformedResponse {
                network: NETWORK.to_string(),
                reason: format!("unknown transaction {transaction_id}"),
            });
        }
        if chain.paused {
            return Ok(None);
        }
        chain.mine_block();
        Ok(chain.receipts.get(transaction_id).cloned())
    }

    async fn wait_for_receipt(&self, transaction_id: &str) -> Result<AnchorRecord, LedgerError> {
        loop {
            match self.settle(transaction_id)? {
                Some(Receipt::Recorded(record)) => return Ok(record),
                Some(Receipt::Reverted { block_height }) => {
                    return Err(LedgerError::TransactionReverted {
                        transaction_id: Some(transaction_id.to_string()),
                        reason: format!(
                            "included in block {block_height} but recorded no AnchorRecorded event"
                        ),
                    });
                }
                None => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn read_anchor(
        &self,
        commitment: &Commitment,
    ) -> Result<Option<AnchorRecord>, LedgerError> {
        let mut chain = self.chain.lock();
        if chain.failing_reads > 0 {
            chain.failing_reads -= 1;
            return Err(Self::unavailable("injected read failure"));
        }
        Ok(chain.records.get(commitment).cloned())
    }

    async fn submit_anchor(
        &self,
        commitment: &Commitment,
    ) -> Result<PendingTransaction, LedgerError> {
        let mut chain = self.chain.lock();
        if chain.failing_submissions > 0 {
            chain.failing_submissions -= 1;
            return Err(Self::unavailable("injected submission failure"));
        }
        if let Some(competitor) = chain.front_runner.take() {
            chain.enqueue(*commitment, competitor);
        }
        if chain.records.contains_key(commitment) {
            return Err(LedgerError::TransactionReverted {
                transaction_id: None,
                reason: "execution reverted: commitment already anchored".to_string(),
            });
        }
        chain.submissions += 1;
        let transaction_id = chain.enqueue(*commitment, self.submitter);
        if std::mem::take(&mut chain.revert_next) {
            chain.doomed.insert(transaction_id.clone());
        }
        drop(chain);
        tracing::debug!(
            commitment = %commitment,
            transaction_id = %transaction_id,
            "queued anchor transaction"
        );
        Ok(PendingTransaction::new(transaction_id, *commitment))
    }

    async fn await_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> Result<AnchorRecord, LedgerError> {
        let transaction_id = &pending.transaction_id;
        let wait = self.wait_for_receipt(transaction_id);
        match tokio::time::timeout(self.confirmation_timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::ConfirmationTimeout {
                transaction_id: transaction_id.clone(),
                waited: self.confirmation_timeout,
            }),
        }
    }

    fn network(&self) -> &str {
        NETWORK
    }

    fn submitter(&self) -> LedgerAddress {
        self.submitter
    }
}
