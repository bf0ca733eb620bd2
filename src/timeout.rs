//! Deadline wrapper for outbound operations.
//!
//! The operation runs as its own task. When the deadline fires first the
//! caller gets `TimeoutExceeded` and stops waiting, but the task is left to
//! finish in the background (a late summary still lands in the cache).

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Races `operation` against a timer of `deadline`.
pub async fn with_timeout<F, T>(
    deadline: Duration,
    label: impl Into<String>,
    operation: F,
) -> Result<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let label = label.into();
    let handle = tokio::spawn(operation);

    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_err)) => Err(AppError::UpstreamError(format!(
            "{} did not complete: {}",
            label, join_err
        ))),
        Err(_) => Err(AppError::TimeoutExceeded {
            label,
            deadline_ms: deadline.as_millis() as u64,
        }),
    }
}

/// Same as [`with_timeout`] for operations that can fail themselves; their
/// error comes back unchanged.
pub async fn try_with_timeout<F, T>(
    deadline: Duration,
    label: impl Into<String>,
    operation: F,
) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    with_timeout(deadline, label, operation).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::{Instant, sleep};

    #[tokio::test(start_paused = true)]
    async fn fails_at_the_deadline_not_when_the_operation_settles() {
        let started = Instant::now();
        let result = with_timeout(Duration::from_secs(1), "slow op", async {
            sleep(Duration::from_secs(30)).await;
            "done"
        })
        .await;

        match result {
            Err(AppError::TimeoutExceeded { label, deadline_ms }) => {
                assert_eq!(label, "slow op");
                assert_eq!(deadline_ms, 1000);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_operation_keeps_running() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = with_timeout(Duration::from_millis(100), "background", async move {
            sleep(Duration::from_secs(2)).await;
            flag.store(true, Ordering::SeqCst);
        })
        .await;
        assert!(result.is_err());
        assert!(!finished.load(Ordering::SeqCst));

        sleep(Duration::from_secs(3)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn success_passes_through() {
        let value = with_timeout(Duration::from_secs(1), "fast", async { 42 }).await;
        assert_eq!(value.unwrap(), 42);
    }

    #[tokio::test]
    async fn operation_failure_is_propagated_unchanged() {
        let result: Result<()> = try_with_timeout(Duration::from_secs(1), "failing", async {
            Err(AppError::UpstreamError("status 500".to_string()))
        })
        .await;

        match result {
            Err(AppError::UpstreamError(msg)) => assert_eq!(msg, "status 500"),
            other => panic!("expected upstream error, got {:?}", other),
        }
    }
}
