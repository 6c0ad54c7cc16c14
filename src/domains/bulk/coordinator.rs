use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use chrono::Utc;
use futures::future::join_all;
use log::debug;
use crate::domains::bulk::types::{BulkActionResult, ItemFailure};
use crate::domains::core::with_timeout;
use crate::errors::ServiceResult;
use crate::types::EntityId;

/// Fans an operation out over a set of ids. Items run concurrently and
/// independently: one failure never cancels or undoes another, and nothing
/// is retried.
#[derive(Debug, Clone, Default)]
pub struct BulkActionCoordinator {
    item_timeout: Option<Duration>,
}

impl BulkActionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each item's call separately; there is no global deadline
    pub fn with_item_timeout(item_timeout: Duration) -> Self {
        Self {
            item_timeout: Some(item_timeout),
        }
    }

    pub async fn run<F, Fut>(&self, items: &[EntityId], operation: F) -> BulkActionResult
    where
        F: Fn(EntityId) -> Fut,
        Fut: Future<Output = ServiceResult<()>>,
    {
        if items.is_empty() {
            return BulkActionResult::empty();
        }

        let success_count = AtomicUsize::new(0);
        let failure_count = AtomicUsize::new(0);
        let succeeded: Mutex<Vec<EntityId>> = Mutex::new(Vec::with_capacity(items.len()));
        let failures: Mutex<Vec<ItemFailure>> = Mutex::new(Vec::new());

        let tasks = items.iter().map(|id| {
            let call = operation(id.clone());
            let (success_count, failure_count, succeeded, failures) =
                (&success_count, &failure_count, &succeeded, &failures);
            async move {
                let outcome = match self.item_timeout {
                    Some(limit) => with_timeout(limit, &format!("Bulk item {}", id), call).await,
                    None => call.await,
                };
                match outcome {
                    Ok(()) => {
                        success_count.fetch_add(1, Ordering::SeqCst);
                        succeeded.lock().unwrap_or_else(|e| e.into_inner()).push(id.clone());
                    }
                    Err(err) => {
                        debug!("Bulk item {} failed: {}", id, err);
                        failure_count.fetch_add(1, Ordering::SeqCst);
                        failures.lock().unwrap_or_else(|e| e.into_inner()).push(ItemFailure {
                            id: id.clone(),
                            reason: err.user_message(),
                        });
                    }
                }
            }
        });
        join_all(tasks).await;

        let success_count = success_count.into_inner();
        let failure_count = failure_count.into_inner();
        BulkActionResult {
            total_processed: success_count + failure_count,
            success_count,
            failure_count,
            succeeded: succeeded.into_inner().unwrap_or_else(|e| e.into_inner()),
            failures: failures.into_inner().unwrap_or_else(|e| e.into_inner()),
            timestamp: Utc::now(),
        }
    }
}
