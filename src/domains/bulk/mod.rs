pub mod coordinator;
pub mod service;
pub mod types;

pub use coordinator::BulkActionCoordinator;
pub use service::BulkModerationService;
pub use types::{BulkActionResult, ItemFailure};
