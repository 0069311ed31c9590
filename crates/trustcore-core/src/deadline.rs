//! Bounded calls into injected stores and backends.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::result::AppResult;

/// Default upper bound for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs a store call with an upper bound on its duration.
///
/// `operation` names the call in the resulting [`ErrorKind::Timeout`](crate::error::ErrorKind::Timeout)
/// message, e.g. `"session_store.get"`.
pub async fn bounded<T, F>(limit: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, limit_ms = limit.as_millis() as u64, "Store call timed out");
            Err(AppError::timeout(format!(
                "{operation} did not complete within {}ms",
                limit.as_millis()
            )))
        }
    }
}
