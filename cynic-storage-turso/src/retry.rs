//! Transient failure retry with exponential backoff

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use cynic_core::constants::defaults;
use cynic_core::Result;

/// Retry a recoverable operation up to 3 times with 50/150/450 ms backoff.
///
/// Every attempt carries the per-call store timeout; an attempt that
/// exceeds it counts as a transient failure. Unrecoverable errors
/// (validation, not-found, reset guard) fail immediately.
pub async fn with_retry<F, Fut, T>(operation_name: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for (attempt, backoff_ms) in std::iter::once(0u64)
        .chain(defaults::RETRY_BACKOFF_MS)
        .take(defaults::MAX_RETRIES + 1)
        .enumerate()
    {
        if backoff_ms > 0 {
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
        let result = match tokio::time::timeout(defaults::STORE_OP_TIMEOUT, f()).await {
            Ok(result) => result,
            Err(_) => Err(cynic_core::Error::Timeout),
        };
        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_recoverable() => {
                warn!(operation = operation_name, attempt, %err, "transient store failure");
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| cynic_core::Error::Storage("retries exhausted".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use cynic_core::Error;

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result = with_retry("op", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::Storage("transient".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unrecoverable_fails_fast() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = with_retry("op", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Validation("bad".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = with_retry("op", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Storage("down".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 4, "initial try plus 3 retries");
    }
}
