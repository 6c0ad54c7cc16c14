use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::EntityId;

/// Why one item of a bulk action failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub id: EntityId,
    pub reason: String,
}

/// Aggregate outcome of one bulk invocation. Built fresh per run and never
/// persisted; `success_count + failure_count == total_processed` always.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionResult {
    pub total_processed: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Ids that succeeded, in completion order
    pub succeeded: Vec<EntityId>,
    /// Per-id failure reasons, in completion order
    pub failures: Vec<ItemFailure>,
    pub timestamp: DateTime<Utc>,
}

impl BulkActionResult {
    pub fn empty() -> Self {
        Self {
            total_processed: 0,
            success_count: 0,
            failure_count: 0,
            succeeded: Vec::new(),
            failures: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// The subset to hand back for another attempt
    pub fn failed_ids(&self) -> Vec<EntityId> {
        self.failures.iter().map(|f| f.id.clone()).collect()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failure_count == 0
    }

    pub fn reason_for(&self, id: &str) -> Option<&str> {
        self.failures
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.reason.as_str())
    }
}
