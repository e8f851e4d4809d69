//! Timeout wrapper for browser operations

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Run a browser operation with an explicit deadline
///
/// Keeps a hung CDP call from stalling the caller. The error names the
/// operation so timeouts and genuine failures read differently in the logs.
pub async fn with_page_timeout<F, T>(operation: F, timeout: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {} seconds",
            timeout.as_secs()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_names_operation() {
        let err = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
            Duration::from_secs(5),
            "Page load",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Page load timeout after 5 seconds");
    }

    #[tokio::test]
    async fn test_passes_through_result() {
        let value = with_page_timeout(async { Ok(7) }, Duration::from_secs(1), "op")
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
