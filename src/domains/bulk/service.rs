use std::future::Future;
use std::sync::Arc;
use log::info;
use crate::auth::AuthContext;
use crate::domains::bulk::coordinator::BulkActionCoordinator;
use crate::domains::bulk::types::BulkActionResult;
use crate::domains::moderation::confirm::ConfirmationPort;
use crate::domains::moderation::service::{authorize, ModerationWorkflow};
use crate::domains::moderation::types::{ConfirmationPrompt, ModerationAction, RoleChange, VerificationChange};
use crate::errors::ServiceResult;
use crate::types::EntityId;

/// Admin bulk screens: approve/reject campaigns, change roles and
/// verification, refund donations. Each is a documented fan-out of
/// single-entity calls, not an atomic backend operation.
///
/// All methods return `Ok(None)` when the operator declines the prompt.
pub struct BulkModerationService {
    workflow: Arc<ModerationWorkflow>,
    coordinator: BulkActionCoordinator,
    confirm: Arc<dyn ConfirmationPort>,
}

impl BulkModerationService {
    pub fn new(
        workflow: Arc<ModerationWorkflow>,
        coordinator: BulkActionCoordinator,
        confirm: Arc<dyn ConfirmationPort>,
    ) -> Self {
        Self {
            workflow,
            coordinator,
            confirm,
        }
    }

    pub async fn approve_campaigns(
        &self,
        campaign_ids: &[EntityId],
        auth: &AuthContext,
    ) -> ServiceResult<Option<BulkActionResult>> {
        let workflow = &self.workflow;
        self.execute(ModerationAction::ApproveCampaigns, campaign_ids, auth, move |id| async move {
            workflow.approve_campaign(&id, auth).await
        }).await
    }

    pub async fn reject_campaigns(
        &self,
        campaign_ids: &[EntityId],
        reason: Option<&str>,
        auth: &AuthContext,
    ) -> ServiceResult<Option<BulkActionResult>> {
        let workflow = &self.workflow;
        self.execute(ModerationAction::RejectCampaigns, campaign_ids, auth, move |id| async move {
            workflow.reject_campaign(&id, reason, auth).await
        }).await
    }

    pub async fn change_roles(
        &self,
        user_ids: &[EntityId],
        change: RoleChange,
        auth: &AuthContext,
    ) -> ServiceResult<Option<BulkActionResult>> {
        let workflow = &self.workflow;
        self.execute(ModerationAction::ChangeRole(change), user_ids, auth, move |id| async move {
            workflow.change_role(&id, change, auth).await
        }).await
    }

    pub async fn set_verification(
        &self,
        user_ids: &[EntityId],
        change: VerificationChange,
        auth: &AuthContext,
    ) -> ServiceResult<Option<BulkActionResult>> {
        let workflow = &self.workflow;
        self.execute(ModerationAction::SetVerification(change), user_ids, auth, move |id| async move {
            workflow.set_verification(&id, change, auth).await
        }).await
    }

    pub async fn refund_donations(
        &self,
        donation_ids: &[EntityId],
        reason: &str,
        auth: &AuthContext,
    ) -> ServiceResult<Option<BulkActionResult>> {
        let workflow = &self.workflow;
        self.execute(ModerationAction::RefundDonations, donation_ids, auth, move |id| async move {
            workflow.refund_donation(&id, reason, auth).await
        }).await
    }

    /// Authorize, then confirm, then fan out. A denied caller is never
    /// prompted and an empty selection is never sent.
    async fn execute<F, Fut>(
        &self,
        action: ModerationAction,
        ids: &[EntityId],
        auth: &AuthContext,
        operation: F,
    ) -> ServiceResult<Option<BulkActionResult>>
    where
        F: Fn(EntityId) -> Fut,
        Fut: Future<Output = ServiceResult<()>>,
    {
        authorize(auth, action.required_permission())?;

        if ids.is_empty() {
            return Ok(Some(BulkActionResult::empty()));
        }

        let prompt = ConfirmationPrompt::new(action, ids.len());
        if !self.confirm.confirm(&prompt).await {
            info!("Bulk {} over {} items declined by {}", action, ids.len(), auth.user_id);
            return Ok(None);
        }

        let result = self.coordinator.run(ids, operation).await;
        info!(
            "Bulk {} by {}: {} processed, {} succeeded, {} failed",
            action, auth.user_id, result.total_processed, result.success_count, result.failure_count
        );
        Ok(Some(result))
    }
}
