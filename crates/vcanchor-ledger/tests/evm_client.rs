//! # Integration Tests for the EVM JSON-RPC Ledger Client
//!
//! Runs [`EvmLedgerClient`] against wiremock JSON-RPC endpoints to verify
//! request construction, response decoding, failure classification, and the
//! confirmation polling loop without a live chain.

use std::time::Duration;

use serde_json::json;
use vcanchor_core::{Commitment, LedgerAddress, LedgerConfig, SigningCredential};
use vcanchor_ledger::abi;
use vcanchor_ledger::{EvmLedgerClient, LedgerClient, LedgerError};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
const SIGNER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const TX_HASH: &str = "0x8a3b0c3f2f5b3c1d8e7a6b5c4d3e2f1a0b9c8d7e6f5a4b3c2d1e0f9a8b7c6d5e";

fn config(server: &MockServer) -> LedgerConfig {
    let mut config = LedgerConfig::new(
        server.uri().parse().expect("mock uri"),
        SigningCredential {
            account: LedgerAddress::parse(SIGNER).expect("signer"),
        },
        LedgerAddress::parse(CONTRACT).expect("contract"),
    );
    config.poll_interval = Duration::from_millis(10);
    config.confirmation_timeout = Duration::from_millis(500);
    config.request_timeout = Duration::from_secs(2);
    config
}

fn client(server: &MockServer) -> EvmLedgerClient {
    EvmLedgerClient::new(config(server)).expect("client build")
}

fn commitment() -> Commitment {
    Commitment::derive("urn:uuid:1111-aaaa")
}

fn word(v: u64) -> String {
    abi::pad_word(&v.to_be_bytes())[2..].to_string()
}

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": {"code": code, "message": message}
    }))
}

async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(response)
        .mount(server)
        .await;
}

fn anchor_receipt(block: u64) -> serde_json::Value {
    json!({
        "transactionHash": TX_HASH,
        "status": "0x1",
        "blockNumber": abi::format_quantity(block),
        "logs": [{
            "address": CONTRACT,
            "topics": [
                abi::ANCHOR_RECORDED_TOPIC,
                commitment().to_string(),
                abi::pad_word(LedgerAddress::parse(SIGNER).unwrap().as_bytes()),
            ],
            "data": format!("0x{}{}", word(block), word(1_767_225_600)),
        }]
    })
}

// ── Reads ────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_anchor_decodes_record() {
    let server = MockServer::start().await;
    let calldata = abi::encode_call(abi::GET_ANCHOR_INFO_SELECTOR, &commitment());
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "eth_call",
            "params": [{"to": CONTRACT, "data": calldata}, "latest"]
        })))
        .respond_with(rpc_result(json!(format!(
            "0x{}{}{}",
            word(42),
            word(1_767_225_600),
            &abi::pad_word(LedgerAddress::parse(SIGNER).unwrap().as_bytes())[2..]
        ))))
        .expect(1)
        .mount(&server)
        .await;

    let record = client(&server)
        .read_anchor(&commitment())
        .await
        .expect("read")
        .expect("record present");
    assert_eq!(record.block_height, 42);
    assert_eq!(record.timestamp, 1_767_225_600);
    assert_eq!(record.submitter.to_string(), SIGNER);
    assert_eq!(record.commitment, commitment());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_anchor_zero_tuple_is_absent() {
    let server = MockServer::start().await;
    mount(
        &server,
        "eth_call",
        rpc_result(json!(format!("0x{}", "0".repeat(192)))),
    )
    .await;

    let record = client(&server).read_anchor(&commitment()).await.expect("read");
    assert!(record.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn is_anchored_uses_view_function() {
    let server = MockServer::start().await;
    let calldata = abi::encode_call(abi::IS_ANCHORED_SELECTOR, &commitment());
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "eth_call",
            "params": [{"to": CONTRACT, "data": calldata}, "latest"]
        })))
        .respond_with(rpc_result(json!(format!("0x{}", word(1)))))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).is_anchored(&commitment()).await.expect("call"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_server_error_is_transient() {
    let server = MockServer::start().await;
    mount(&server, "eth_call", ResponseTemplate::new(503)).await;

    let err = client(&server).read_anchor(&commitment()).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unavailable { .. }), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_client_error_is_permanent() {
    let server = MockServer::start().await;
    mount(&server, "eth_call", ResponseTemplate::new(401).set_body_string("no key")).await;

    let err = client(&server).read_anchor(&commitment()).await.unwrap_err();
    match err {
        LedgerError::Http { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "no key");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_rpc_error_is_permanent() {
    let server = MockServer::start().await;
    mount(&server, "eth_call", rpc_error(-32602, "invalid params")).await;

    let err = client(&server).read_anchor(&commitment()).await.unwrap_err();
    assert!(matches!(err, LedgerError::Rpc { code: -32602, .. }), "got {err:?}");
    assert!(!err.is_transient());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_without_deployed_program_is_malformed() {
    let server = MockServer::start().await;
    mount(&server, "eth_call", rpc_result(json!("0x"))).await;

    let err = client(&server).read_anchor(&commitment()).await.unwrap_err();
    assert!(matches!(err, LedgerError::MalformedResponse { .. }), "got {err:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_endpoint_is_transient() {
    let mut config = LedgerConfig::new(
        "http://127.0.0.1:1".parse().unwrap(),
        SigningCredential {
            account: LedgerAddress::parse(SIGNER).unwrap(),
        },
        LedgerAddress::parse(CONTRACT).unwrap(),
    );
    config.request_timeout = Duration::from_millis(200);
    let client = EvmLedgerClient::new(config).unwrap();

    let read = client.read_anchor(&commitment()).await.unwrap_err();
    assert!(read.is_transient(), "got {read:?}");
    // Connection refused means the submission never left the process.
    let submit = client.submit_anchor(&commitment()).await.unwrap_err();
    assert!(submit.is_transient(), "got {submit:?}");
}

// ── Submission ───────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_sends_anchor_call_from_signer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "eth_sendTransaction",
            "params": [{
                "from": SIGNER,
                "to": CONTRACT,
                "data": abi::encode_call(abi::ANCHOR_SELECTOR, &commitment()),
            }]
        })))
        .respond_with(rpc_result(json!(TX_HASH)))
        .expect(1)
        .mount(&server)
        .await;

    let pending = client(&server)
        .submit_anchor(&commitment())
        .await
        .expect("submit");
    assert_eq!(pending.transaction_id, TX_HASH);
    assert_eq!(pending.commitment, commitment());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_revert_during_estimation_is_reverted_without_id() {
    let server = MockServer::start().await;
    mount(
        &server,
        "eth_sendTransaction",
        rpc_error(3, "execution reverted: already anchored"),
    )
    .await;

    let err = client(&server).submit_anchor(&commitment()).await.unwrap_err();
    match err {
        LedgerError::TransactionReverted {
            transaction_id,
            reason,
        } => {
            assert!(transaction_id.is_none());
            assert!(reason.contains("already anchored"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_server_error_is_indeterminate() {
    let server = MockServer::start().await;
    mount(&server, "eth_sendTransaction", ResponseTemplate::new(502)).await;

    let err = client(&server).submit_anchor(&commitment()).await.unwrap_err();
    assert!(matches!(err, LedgerError::Indeterminate { .. }), "got {err:?}");
    assert!(!err.is_transient());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_timeout_is_indeterminate() {
    let server = MockServer::start().await;
    mount(
        &server,
        "eth_sendTransaction",
        rpc_result(json!(TX_HASH)).set_delay(Duration::from_secs(5)),
    )
    .await;
    let mut config = config(&server);
    config.request_timeout = Duration::from_millis(100);
    let client = EvmLedgerClient::new(config).unwrap();

    let err = client.submit_anchor(&commitment()).await.unwrap_err();
    assert!(matches!(err, LedgerError::Indeterminate { .. }), "got {err:?}");
}

// ── Confirmation ─────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn await_confirmation_decodes_event_once_deep_enough() {
    let server = MockServer::start().await;
    mount(&server, "eth_getTransactionReceipt", rpc_result(anchor_receipt(100))).await;
    mount(&server, "eth_blockNumber", rpc_result(json!("0x66"))).await;
    let mut config = config(&server);
    config.confirmations = 3;
    let client = EvmLedgerClient::new(config).unwrap();

    let pending = vcanchor_core::PendingTransaction::new(TX_HASH, commitment());
    let record = client.await_confirmation(&pending).await.expect("confirmed");
    assert_eq!(record.block_height, 100);
    assert_eq!(record.commitment, commitment());
    assert_eq!(record.submitter.to_string(), SIGNER);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn await_confirmation_times_out_while_pending() {
    let server = MockServer::start().await;
    mount(&server, "eth_getTransactionReceipt", rpc_result(json!(null))).await;

    let pending = vcanchor_core::PendingTransaction::new(TX_HASH, commitment());
    let err = client(&server).await_confirmation(&pending).await.unwrap_err();
    match err {
        LedgerError::ConfirmationTimeout {
            transaction_id,
            waited,
        } => {
            assert_eq!(transaction_id, TX_HASH);
            assert_eq!(waited, Duration::from_millis(500));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn await_confirmation_times_out_when_too_shallow() {
    let server = MockServer::start().await;
    mount(&server, "eth_getTransactionReceipt", rpc_result(anchor_receipt(100))).await;
    mount(&server, "eth_blockNumber", rpc_result(json!("0x64"))).await;
    let mut config = config(&server);
    config.confirmations = 12;
    config.confirmation_timeout = Duration::from_millis(150);
    let client = EvmLedgerClient::new(config).unwrap();

    let pending = vcanchor_core::PendingTransaction::new(TX_HASH, commitment());
    let err = client.await_confirmation(&pending).await.unwrap_err();
    assert!(matches!(err, LedgerError::ConfirmationTimeout { .. }), "got {err:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn await_confirmation_reports_revert() {
    let server = MockServer::start().await;
    mount(
        &server,
        "eth_getTransactionReceipt",
        rpc_result(json!({"status": "0x0", "blockNumber": "0x64", "logs": []})),
    )
    .await;

    let pending = vcanchor_core::PendingTransaction::new(TX_HASH, commitment());
    let err = client(&server).await_confirmation(&pending).await.unwrap_err();
    match err {
        LedgerError::TransactionReverted { transaction_id, .. } => {
            assert_eq!(transaction_id.as_deref(), Some(TX_HASH));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn await_confirmation_rides_out_poll_outages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount(&server, "eth_getTransactionReceipt", rpc_result(anchor_receipt(7))).await;
    mount(&server, "eth_blockNumber", rpc_result(json!("0x7"))).await;

    let pending = vcanchor_core::PendingTransaction::new(TX_HASH, commitment());
    let record = client(&server)
        .await_confirmation(&pending)
        .await
        .expect("confirmed after outage");
    assert_eq!(record.block_height, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn await_confirmation_rides_out_rpc_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(rpc_error(-32000, "header not found"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_blockNumber"})))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount(&server, "eth_getTransactionReceipt", rpc_result(anchor_receipt(9))).await;
    mount(&server, "eth_blockNumber", rpc_result(json!("0x9"))).await;

    let pending = vcanchor_core::PendingTransaction::new(TX_HASH, commitment());
    let record = client(&server)
        .await_confirmation(&pending)
        .await
        .expect("confirmed after rpc errors");
    assert_eq!(record.block_height, 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn await_confirmation_fails_on_undecodable_receipt() {
    let server = MockServer::start().await;
    mount(
        &server,
        "eth_getTransactionReceipt",
        rpc_result(json!({"status": "0x1", "blockNumber": "not a number", "logs": []})),
    )
    .await;

    let pending = vcanchor_core::PendingTransaction::new(TX_HASH, commitment());
    let err = client(&server).await_confirmation(&pending).await.unwrap_err();
    assert!(matches!(err, LedgerError::MalformedResponse { .. }), "got {err:?}");
}

// ── Block tags ───────────────────────────────────────────────────────────

fn record_tuple(block: u64) -> serde_json::Value {
    json!(format!(
        "0x{}{}{}",
        word(block),
        word(1_767_225_600),
        &abi::pad_word(LedgerAddress::parse(SIGNER).unwrap().as_bytes())[2..]
    ))
}

async fn mount_info_at(server: &MockServer, block_tag: &str, result: serde_json::Value) {
    let calldata = abi::encode_call(abi::GET_ANCHOR_INFO_SELECTOR, &commitment());
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "eth_call",
            "params": [{"to": CONTRACT, "data": calldata}, block_tag]
        })))
        .respond_with(rpc_result(result))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_latest_anchor_ignores_configured_block_tag() {
    let server = MockServer::start().await;
    mount_info_at(&server, "finalized", json!(format!("0x{}", "0".repeat(192)))).await;
    mount_info_at(&server, "latest", record_tuple(77)).await;
    let mut config = config(&server);
    config.block_tag = "finalized".to_string();
    let client = EvmLedgerClient::new(config).unwrap();

    assert!(client.read_anchor(&commitment()).await.expect("read").is_none());
    let record = client
        .read_latest_anchor(&commitment())
        .await
        .expect("read")
        .expect("record at head");
    assert_eq!(record.block_height, 77);
}
