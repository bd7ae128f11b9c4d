//! # Anchor Subcommands
//!
//! Handlers for `derive`, `anchor`, `status`, and `info`. Each returns a
//! [`Report`] holding the exit code and both output renderings.

use anyhow::Result;
use serde::Serialize;
use vcanchor_core::{AnchorError, AnchorResult, AnchorState, Commitment};
use vcanchor_service::AnchorService;

/// Exit code for a negative lookup.
pub const EXIT_NOT_ANCHORED: u8 = 2;
/// Exit code when the ledger could not be read.
pub const EXIT_UNKNOWN: u8 = 3;

/// Outcome of a subcommand, ready to print.
#[derive(Debug)]
pub struct Report {
    pub exit_code: u8,
    pub text: String,
    pub json: serde_json::Value,
}

impl Report {
    fn new<T: Serialize>(exit_code: u8, text: String, body: &T) -> Result<Self> {
        Ok(Self {
            exit_code,
            text,
            json: serde_json::to_value(body)?,
        })
    }

    /// Human-readable or pretty-printed JSON output.
    pub fn render(&self, json: bool) -> String {
        if json {
            serde_json::to_string_pretty(&self.json).unwrap_or_else(|_| self.json.to_string())
        } else {
            self.text.clone()
        }
    }
}

#[derive(Serialize)]
struct DeriveOutput<'a> {
    identifier: &'a str,
    commitment: String,
}

#[derive(Serialize)]
struct AnchorOutput {
    commitment: String,
    #[serde(flatten)]
    result: AnchorResult,
}

#[derive(Serialize)]
struct StatusOutput {
    commitment: String,
    anchored: bool,
    state: AnchorState,
}

#[derive(Serialize)]
struct InfoOutput {
    commitment: String,
    anchored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    submitter: Option<String>,
}

/// `vcanchor derive <IDENTIFIER>`
pub fn run_derive(identifier: &str) -> Result<Report> {
    let commitment = Commitment::derive(identifier).to_string();
    Report::new(
        0,
        commitment.clone(),
        &DeriveOutput {
            identifier,
            commitment,
        },
    )
}

/// `vcanchor anchor <IDENTIFIER>`
///
/// Ledger failures, rejections, and confirmation timeouts are errors; an
/// existing record is a success.
pub async fn run_anchor(service: &AnchorService, identifier: &str) -> Result<Report> {
    let outcome = service.coordinator.anchor(identifier).await?;
    let commitment = outcome.record().commitment.to_string();
    let result = AnchorResult::from(outcome);

    let text = if result.already_anchored {
        format!(
            "OK: {commitment} already anchored at block {}",
            result.block_height
        )
    } else {
        format!(
            "OK: anchored {commitment} at block {} (tx {})",
            result.block_height,
            result.transaction_id.as_deref().unwrap_or("-")
        )
    };
    Report::new(0, text, &AnchorOutput { commitment, result })
}

/// `vcanchor status <IDENTIFIER>`
pub async fn run_status(service: &AnchorService, identifier: &str) -> Result<Report> {
    let commitment = Commitment::derive(identifier);
    let state = service.query.check_commitment(&commitment).await;
    let commitment = commitment.to_string();
    let exit_code = match state {
        AnchorState::Anchored => 0,
        AnchorState::NotAnchored => EXIT_NOT_ANCHORED,
        AnchorState::Unknown => EXIT_UNKNOWN,
    };
    Report::new(
        exit_code,
        format!("{commitment}: {state}"),
        &StatusOutput {
            commitment: commitment.clone(),
            anchored: state.is_anchored(),
            state,
        },
    )
}

/// `vcanchor info <IDENTIFIER>`
pub async fn run_info(service: &AnchorService, identifier: &str) -> Result<Report> {
    match service.query.info(identifier).await {
        Ok(record) => {
            let commitment = record.commitment.to_string();
            let anchored_at = record
                .anchored_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| record.timestamp.to_string());
            let text = format!(
                "Commitment: {commitment}\n  Block: {}\n  Anchored at: {anchored_at}\n  Submitter: {}",
                record.block_height, record.submitter
            );
            Report::new(
                0,
                text,
                &InfoOutput {
                    commitment,
                    anchored: true,
                    block_height: Some(record.block_height),
                    timestamp: Some(record.timestamp),
                    submitter: Some(record.submitter.to_string()),
                },
            )
        }
        Err(AnchorError::NotAnchored { commitment }) => Report::new(
            EXIT_NOT_ANCHORED,
            format!("{commitment}: not anchored"),
            &InfoOutput {
                commitment: commitment.to_string(),
                anchored: false,
                block_height: None,
                timestamp: None,
                submitter: None,
            },
        ),
        Err(e) => Err(e.into()),
    }
}
