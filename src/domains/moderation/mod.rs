pub mod confirm;
pub mod repository;
pub mod service;
pub mod types;

pub use confirm::{AutoConfirm, ConfirmationPort};
pub use repository::{AdminRepository, HttpAdminRepository};
pub use service::ModerationWorkflow;
pub use types::{ConfirmationPrompt, ModerationAction, RoleChange, VerificationChange};
