//! Async helpers shared by the session and export crates

use crate::error::{ErrorContext, ScholarError, ScholarResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bound how long `future` may run.
///
/// On expiry the future is dropped and [`ScholarError::Timeout`] is returned;
/// nothing is retried.
pub async fn with_timeout<F: Future>(future: F, timeout_ms: u64, operation: &str) -> ScholarResult<F::Output> {
    let budget = Duration::from_millis(timeout_ms);

    tokio::time::timeout(budget, future).await.map_err(|_elapsed| {
        warn!(operation, timeout_ms, "Gave up waiting");
        ScholarError::Timeout {
            operation: operation.to_string(),
            duration_ms: timeout_ms,
            context: ErrorContext::new("async_utils")
                .with_operation(operation)
                .with_metadata("timeout_ms", timeout_ms)
                .with_suggestion("Raise service.timeout_ms if the service is just slow")
                .with_suggestion("Check that the research service is running"),
        }
    })
}
