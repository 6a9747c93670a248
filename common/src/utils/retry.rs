//! C10: retry / rate-limit harness.
//!
//! Wraps transient upstream calls in a uniform exponential backoff, the same
//! `tokio_retry` idiom the teacher codebase uses for re-embedding
//! (`ExponentialBackoff` + `jitter` + `Retry::spawn`). Per spec.md §4.10:
//! base 1s, factor 2, max 5 attempts, applied on HTTP 429 / provider
//! rate-limit / transient 5xx. Non-retryable errors propagate immediately.
use std::future::Future;

use tokio::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::error::AppError;

// `ExponentialBackoff::from_millis(2).factor(500)` yields 2^n * 500ms:
// 1s, 2s, 4s, 8s, ... i.e. base 1s, factor 2 per spec.md §4.10.
const BACKOFF_BASE: u64 = 2;
const BACKOFF_FACTOR_MS: u64 = 500;
const MAX_ATTEMPTS: usize = 5;

/// Runs `op` up to [`MAX_ATTEMPTS`] times with exponential backoff, retrying
/// only when [`AppError::is_retryable`] returns true for the error the
/// operation produced. The first attempt always runs; backoff delays only
/// separate subsequent attempts.
pub async fn with_backoff<F, Fut, T>(op: F) -> Result<T, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let strategy = ExponentialBackoff::from_millis(BACKOFF_BASE)
        .factor(BACKOFF_FACTOR_MS)
        .map(jitter)
        .take(MAX_ATTEMPTS.saturating_sub(1));

    let mut attempts = 0usize;
    let mut strategy_iter = strategy;
    loop {
        attempts = attempts.saturating_add(1);
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempts < MAX_ATTEMPTS => {
                if let Some(delay) = strategy_iter.next() {
                    tokio::time::sleep(delay).await;
                } else {
                    return Err(err);
                }
            }
            Err(err) => return Err(err),
        }
    }
}

/// Fixed inter-request delay applied before every request to a given
/// upstream provider (spec.md §4.10).
pub fn provider_delay(provider: Provider) -> Duration {
    match provider {
        Provider::CourtListener => Duration::from_millis(100),
        Provider::FederalRegister => Duration::from_millis(1_100),
        Provider::Embedding | Provider::Llm => Duration::ZERO,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    CourtListener,
    FederalRegister,
    Embedding,
    Llm,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_ok() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let result: Result<u32, AppError> = with_backoff(|| {
            let calls = Arc::clone(&calls2);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let result: Result<u32, AppError> = with_backoff(|| {
            let calls = Arc::clone(&calls2);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::UpstreamHttp {
                        status: 429,
                        message: "rate limited".into(),
                    })
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_retryable_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let result: Result<u32, AppError> = with_backoff(|| {
            let calls = Arc::clone(&calls2);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::UpstreamHttp {
                    status: 404,
                    message: "not found".into(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
