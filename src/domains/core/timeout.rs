use std::future::Future;
use std::time::Duration;
use crate::errors::{ServiceError, ServiceResult};

/// Run a backend or gateway call under a hard deadline. An expired call is
/// reported as `ServiceError::Timeout`; the request itself is dropped.
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, future: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("{} exceeded the {:?} deadline", operation, limit);
            Err(ServiceError::Timeout(format!(
                "{} did not complete within {} seconds",
                operation,
                limit.as_secs_f64()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let result: ServiceResult<()> = with_timeout(Duration::from_millis(20), "confirm payment", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        match result {
            Err(ServiceError::Timeout(msg)) => assert!(msg.starts_with("confirm payment")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fast_call_passes_result_through() {
        let result = with_timeout(Duration::from_secs(1), "fees", async { Ok::<_, ServiceError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
