pub mod bulk;
pub mod campaign;
pub mod core;
pub mod donation;
pub mod fees;
pub mod moderation;
pub mod payment;
pub mod permission;

pub use bulk::{BulkActionResult, BulkModerationService};
pub use donation::{DonationOrchestrator, DonationSession};
