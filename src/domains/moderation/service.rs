use std::sync::Arc;
use std::time::Duration;
use log::info;
use crate::auth::AuthContext;
use crate::domains::campaign::{Campaign, CampaignDecision, CampaignStatus};
use crate::domains::core::with_timeout;
use crate::domains::moderation::repository::AdminRepository;
use crate::domains::moderation::types::{RoleChange, VerificationChange};
use crate::errors::{ServiceResult, ValidationError};
use crate::types::Permission;

/// Single-entity moderation behind the admin gate. Every call is authorized
/// before anything is sent; a denied call never reaches the backend.
pub struct ModerationWorkflow {
    repo: Arc<dyn AdminRepository>,
    timeout: Duration,
}

impl ModerationWorkflow {
    pub fn new(repo: Arc<dyn AdminRepository>, timeout: Duration) -> Self {
        Self { repo, timeout }
    }

    pub async fn approve_campaign(&self, campaign_id: &str, auth: &AuthContext) -> ServiceResult<()> {
        authorize(auth, Permission::ModerateCampaigns)?;
        let campaign_id = require_id("campaignId", campaign_id)?;
        with_timeout(self.timeout, "Campaign approval", self.repo.approve_campaign(campaign_id, auth)).await?;
        info!("Campaign {} approved by {}", campaign_id, auth.user_id);
        Ok(())
    }

    /// A missing reason is sent as an empty string
    pub async fn reject_campaign(&self, campaign_id: &str, reason: Option<&str>, auth: &AuthContext) -> ServiceResult<()> {
        authorize(auth, Permission::ModerateCampaigns)?;
        let campaign_id = require_id("campaignId", campaign_id)?;
        let reason = reason.map(str::trim).unwrap_or_default();
        with_timeout(
            self.timeout,
            "Campaign rejection",
            self.repo.reject_campaign(campaign_id, reason, auth),
        ).await?;
        info!("Campaign {} rejected by {}", campaign_id, auth.user_id);
        Ok(())
    }

    /// Review a campaign whose current status is known. Only PENDING
    /// campaigns can be decided; the check happens before the call.
    pub async fn review_campaign(
        &self,
        campaign: &Campaign,
        decision: CampaignDecision,
        reason: Option<&str>,
        auth: &AuthContext,
    ) -> ServiceResult<Campaign> {
        authorize(auth, Permission::ModerateCampaigns)?;
        let next: CampaignStatus = campaign.status.apply(decision)?;
        match decision {
            CampaignDecision::Approve => self.approve_campaign(&campaign.id, auth).await?,
            CampaignDecision::Reject => self.reject_campaign(&campaign.id, reason, auth).await?,
        }
        Ok(Campaign {
            status: next,
            ..campaign.clone()
        })
    }

    pub async fn change_role(&self, user_id: &str, change: RoleChange, auth: &AuthContext) -> ServiceResult<()> {
        authorize(auth, Permission::ManageUsers)?;
        let user_id = require_id("userId", user_id)?;
        with_timeout(self.timeout, "Role change", self.repo.change_role(user_id, change, auth)).await?;
        info!(
            "User {} set to {} by {}",
            user_id,
            change.target_role().as_str(),
            auth.user_id
        );
        Ok(())
    }

    pub async fn set_verification(
        &self,
        user_id: &str,
        change: VerificationChange,
        auth: &AuthContext,
    ) -> ServiceResult<()> {
        authorize(auth, Permission::ManageUsers)?;
        let user_id = require_id("userId", user_id)?;
        with_timeout(
            self.timeout,
            "Verification change",
            self.repo.set_verification(user_id, change, auth),
        ).await?;
        info!("User {} verified={} by {}", user_id, change.verified(), auth.user_id);
        Ok(())
    }

    pub async fn refund_donation(&self, donation_id: &str, reason: &str, auth: &AuthContext) -> ServiceResult<()> {
        authorize(auth, Permission::RefundDonations)?;
        let donation_id = require_id("donationId", donation_id)?;
        with_timeout(
            self.timeout,
            "Donation refund",
            self.repo.refund_donation(donation_id, reason.trim(), auth),
        ).await?;
        info!("Donation {} refunded by {}", donation_id, auth.user_id);
        Ok(())
    }
}

/// The admin flag from the identity service is required on top of the
/// action's own permission
pub(crate) fn authorize(auth: &AuthContext, permission: Permission) -> ServiceResult<()> {
    auth.authorize_admin()?;
    auth.authorize(permission)
}

fn require_id<'a>(field: &str, id: &'a str) -> ServiceResult<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::required(field).into());
    }
    Ok(id)
}
