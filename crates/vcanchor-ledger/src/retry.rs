//! Retry with exponential backoff for ledger calls.
//!
//! Retries only errors for which [`LedgerError::is_transient`] holds. Every
//! other error, including an indeterminate submission, is returned
//! immediately.

use std::future::Future;

use vcanchor_core::RetryPolicy;

use crate::error::LedgerError;

/// Run `f` until it succeeds, fails permanently, or `policy` is exhausted.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut f: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts,
                    "ledger call failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!(operation, attempts = attempt, "ledger call retries exhausted: {e}");
                }
                return Err(e);
            }
        }
    }
}
