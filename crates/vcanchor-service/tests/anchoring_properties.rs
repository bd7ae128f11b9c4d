//! # Anchoring Properties
//!
//! End-to-end behavior of the coordinator and query service over the
//! in-memory ledger: idempotence, races between independent instances,
//! outages, stalled confirmation, and configuration failures.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use vcanchor_core::{
    AnchorError, AnchorResult, AnchorState, Commitment, LedgerAddress, LedgerSettings,
    RetryPolicy,
};
use vcanchor_ledger::InMemoryLedger;
use vcanchor_service::AnchorService;

const ISSUER_A: [u8; 20] = [0xa1; 20];
const ISSUER_B: [u8; 20] = [0xb2; 20];

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

fn service_on(ledger: &InMemoryLedger) -> AnchorService {
    AnchorService::new(Arc::new(ledger.clone()), fast_retry())
}

fn setup() -> (InMemoryLedger, AnchorService) {
    let ledger = InMemoryLedger::new(LedgerAddress::from_bytes(ISSUER_A));
    let service = service_on(&ledger);
    (ledger, service)
}

// ── Idempotence ──────────────────────────────────────────────────────────

#[tokio::test]
async fn anchoring_twice_is_idempotent() {
    let (ledger, service) = setup();

    let first = AnchorResult::from(service.coordinator.anchor("did:example:123#vc-1").await.unwrap());
    let second =
        AnchorResult::from(service.coordinator.anchor("did:example:123#vc-1").await.unwrap());

    assert!(!first.already_anchored);
    assert!(first.transaction_id.is_some());
    assert!(second.already_anchored);
    assert_eq!(second.block_height, first.block_height);
    assert_eq!(ledger.submitted_transactions(), 1);
    assert_eq!(ledger.events().len(), 1);
}

#[tokio::test]
async fn reference_scenario() {
    let (ledger, service) = setup();
    let identifier = "urn:uuid:1111-aaaa";
    assert_eq!(
        Commitment::derive(identifier).to_string(),
        "0x1d9f535e368e2847207e4bb44674eb8f4a34ca2eff16615a89daca75ff75b352"
    );

    let anchored = service.coordinator.anchor(identifier).await.unwrap();
    let height = anchored.record().block_height;
    assert!(!anchored.already_anchored());

    let info = service.query.info(identifier).await.unwrap();
    assert_eq!(info.block_height, height);
    assert_eq!(info.commitment, Commitment::derive(identifier));
    assert_eq!(info.submitter, LedgerAddress::from_bytes(ISSUER_A));

    let submitted_before = ledger.submitted_transactions();
    let again = AnchorResult::from(service.coordinator.anchor(identifier).await.unwrap());
    assert!(again.already_anchored);
    assert_eq!(again.block_height, height);
    assert_eq!(ledger.submitted_transactions(), submitted_before);
}

// ── Queries ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn status_flips_after_confirmed_anchor() {
    let (_ledger, service) = setup();
    assert!(!service.query.status("vc-42").await);
    assert_eq!(service.query.check("vc-42").await, AnchorState::NotAnchored);

    service.coordinator.anchor("vc-42").await.unwrap();

    assert!(service.query.status("vc-42").await);
    assert_eq!(service.query.check("vc-42").await, AnchorState::Anchored);
}

#[tokio::test]
async fn info_before_and_after() {
    let (_ledger, service) = setup();
    match service.query.info("vc-7").await {
        Err(AnchorError::NotAnchored { commitment }) => {
            assert_eq!(commitment, Commitment::derive("vc-7"));
        }
        other => panic!("expected NotAnchored, got {other:?}"),
    }

    let outcome = service.coordinator.anchor("vc-7").await.unwrap();
    let record = service.query.info("vc-7").await.unwrap();
    assert_eq!(record.block_height, outcome.record().block_height);
}

#[tokio::test]
async fn near_identical_identifiers_are_independent() {
    let (_ledger, service) = setup();
    service.coordinator.anchor("vc-1").await.unwrap();
    assert!(!service.query.status("vc-1 ").await);
    assert!(!service.query.status("VC-1").await);
}

// ── Races ────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_instances_agree_on_one_record() {
    let ledger_a = InMemoryLedger::new(LedgerAddress::from_bytes(ISSUER_A));
    let ledger_b = ledger_a.connect_as(LedgerAddress::from_bytes(ISSUER_B));
    // Hold both submissions in the mempool so they land in the same block.
    ledger_a.pause_block_production();
    let a = service_on(&ledger_a);
    let b = service_on(&ledger_b);

    let task_a = tokio::spawn(async move { a.coordinator.anchor("urn:uuid:race").await });
    let task_b = tokio::spawn(async move { b.coordinator.anchor("urn:uuid:race").await });

    tokio::time::timeout(Duration::from_secs(5), async {
        while ledger_a.submitted_transactions() < 2 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("both instances submit before any block is mined");
    assert!(ledger_a.events().is_empty());
    ledger_a.mine();

    let ra = task_a.await.unwrap().unwrap();
    let rb = task_b.await.unwrap().unwrap();

    let fresh = [ra.already_anchored(), rb.already_anchored()]
        .iter()
        .filter(|already| !**already)
        .count();
    assert_eq!(fresh, 1, "exactly one caller anchors: {ra:?} {rb:?}");
    assert_eq!(ra.record(), rb.record());
    assert_eq!(ledger_a.submitted_transactions(), 2);
    assert_eq!(ledger_a.events().len(), 1);
}

#[tokio::test]
async fn front_run_submission_is_already_anchored() {
    let (ledger, service) = setup();
    let competitor = LedgerAddress::from_bytes(ISSUER_B);
    ledger.front_run_next_submission(competitor);

    let outcome = service.coordinator.anchor("contested").await.unwrap();
    assert!(outcome.already_anchored());
    assert_eq!(outcome.record().submitter, competitor);
    assert_eq!(
        service.query.info("contested").await.unwrap().submitter,
        competitor
    );
}

// ── Failures ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn stalled_confirmation_times_out_then_lands() {
    let ledger = InMemoryLedger::new(LedgerAddress::from_bytes(ISSUER_A))
        .with_confirmation_timeout(Duration::from_millis(50));
    let service = service_on(&ledger);
    ledger.pause_block_production();

    let err = service.coordinator.anchor("slow").await.unwrap_err();
    let transaction_id = match err {
        AnchorError::ConfirmationTimeout { transaction_id, .. } => transaction_id,
        other => panic!("expected ConfirmationTimeout, got {other:?}"),
    };
    assert!(transaction_id.starts_with("0x"));
    assert!(!service.query.status("slow").await);

    ledger.mine();
    assert!(service.query.status("slow").await);

    // The caller re-queries rather than resubmitting; anchoring again now
    // reports the existing record.
    ledger.resume_block_production();
    let again = service.coordinator.anchor("slow").await.unwrap();
    assert!(again.already_anchored());
    assert_eq!(ledger.submitted_transactions(), 1);
}

#[tokio::test]
async fn transient_read_failures_are_retried() {
    let (ledger, service) = setup();
    ledger.fail_next_reads(2);
    let outcome = service.coordinator.anchor("flaky").await.unwrap();
    assert!(!outcome.already_anchored());
}

#[tokio::test]
async fn persistent_outage_degrades_queries() {
    let (ledger, service) = setup();
    service.coordinator.anchor("known").await.unwrap();

    ledger.fail_next_reads(3);
    assert!(!service.query.status("known").await);
    ledger.fail_next_reads(3);
    assert_eq!(service.query.check("known").await, AnchorState::Unknown);
    ledger.fail_next_reads(3);
    assert!(matches!(
        service.query.info("known").await,
        Err(AnchorError::NetworkUnavailable { .. })
    ));
    ledger.fail_next_reads(3);
    assert!(matches!(
        service.coordinator.anchor("other").await,
        Err(AnchorError::NetworkUnavailable { .. })
    ));
}

#[test]
fn missing_signer_fails_before_network() {
    let settings = LedgerSettings {
        rpc_url: Some("http://127.0.0.1:1".into()),
        contract_address: Some("0x5fbdb2315678afecb367f032d93f642f64180aa3".into()),
        ..Default::default()
    };
    match AnchorService::connect(settings) {
        Err(AnchorError::MissingConfiguration(e)) => {
            assert!(e.to_string().contains("VCANCHOR_SIGNER_ADDRESS"));
        }
        other => panic!("expected MissingConfiguration, got {other:?}"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_identifier_anchors_once(identifier in "\\PC{0,64}") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            let (ledger, service) = setup();
            let first = service.coordinator.anchor(&identifier).await.unwrap();
            let second = service.coordinator.anchor(&identifier).await.unwrap();
            prop_assert!(!first.already_anchored());
            prop_assert!(second.already_anchored());
            prop_assert_eq!(first.record(), second.record());
            prop_assert_eq!(ledger.submitted_transactions(), 1);
            Ok(())
        })?;
    }
}
