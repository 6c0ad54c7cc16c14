use async_trait::async_trait;
use crate::domains::moderation::types::ConfirmationPrompt;

/// Asks the operator to confirm a bulk action. Supplied by the host; a
/// `false` answer means nothing is sent.
#[async_trait]
pub trait ConfirmationPort: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmationPrompt) -> bool;
}

/// For hosts that ran their own dialog before calling in
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationPort for AutoConfirm {
    async fn confirm(&self, prompt: &ConfirmationPrompt) -> bool {
        log::debug!("Auto-confirming: {}", prompt.message);
        true
    }
}

#[cfg(test)]
pub use scripted::ScriptedConfirm;
