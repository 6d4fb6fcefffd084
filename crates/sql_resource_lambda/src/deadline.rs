//! Invocation deadline handling.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sql_resource_core::error::{DeadlineExceeded, DriverError};
use tokio::time::Instant;

/// Time kept back from the Lambda deadline so the response can still be
/// delivered after a step is aborted.
pub const RESPONSE_DELIVERY_RESERVE: Duration = Duration::from_secs(2);

/// How far past the processing deadline cleanup (a rollback) may run.
pub const CLEANUP_GRACE: Duration = Duration::from_millis(500);

/// Upper bound for uploading the response document.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Converts the runtime's epoch-millisecond deadline into a monotonic instant,
/// minus [`RESPONSE_DELIVERY_RESERVE`].
///
/// Returns `None` when the runtime did not supply a deadline.
pub fn processing_deadline(deadline_epoch_ms: u64, now: SystemTime) -> Option<Instant> {
    if deadline_epoch_ms == 0 {
        return None;
    }
    let deadline = UNIX_EPOCH + Duration::from_millis(deadline_epoch_ms);
    let remaining = deadline
        .duration_since(now)
        .unwrap_or(Duration::ZERO)
        .saturating_sub(RESPONSE_DELIVERY_RESERVE);
    Some(Instant::now() + remaining)
}

/// Time a cleanup step may take: at most `limit`, and never more than
/// [`CLEANUP_GRACE`] past `deadline`.
pub fn cleanup_budget(deadline: Option<Instant>, limit: Duration) -> Duration {
    match deadline {
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            (remaining + CLEANUP_GRACE).min(limit)
        }
        None => limit,
    }
}

/// Runs `future` until it completes or `deadline` passes.
pub async fn bounded<T, F>(
    deadline: Option<Instant>,
    stage: &'static str,
    future: F,
) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    let Some(deadline) = deadline else {
        return future.await;
    };
    match tokio::time::timeout_at(deadline, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(stage, "Invocation deadline exceeded");
            Err(Box::new(DeadlineExceeded { stage }))
        }
    }
}
