//! Cancellation plumbing shared by the poller and the orchestrator.

use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Raised when the caller cancelled the run before an operation finished.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Races `operation` against `token`.
///
/// A token that is already cancelled wins before the operation is polled, so
/// no remote call starts after cancellation has been observed.
///
/// # Errors
///
/// Returns [`Cancelled`] when the token fires first.
pub async fn run_cancellable<F>(token: &CancellationToken, operation: F) -> Result<F::Output, Cancelled>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(Cancelled),
        output = operation => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let token = CancellationToken::new();
        let result = run_cancellable(&token, async { 7 }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_operation() {
        let token = CancellationToken::new();
        token.cancel();
        let result = run_cancellable(&token, async { 7 }).await;
        assert_eq!(result, Err(Cancelled));
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_operation() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            trigger.cancel();
        });

        let result = run_cancellable(&token, tokio::time::sleep(Duration::from_secs(30))).await;
        assert_eq!(result, Err(Cancelled));
    }
}
