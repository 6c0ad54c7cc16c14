use std::fmt;
use serde::{Deserialize, Serialize};
use crate::types::{Permission, UserRole};

/// Role change applied to a user. Either direction is always allowed to an
/// administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleChange {
    Promote,
    Demote,
}

impl RoleChange {
    pub fn target_role(&self) -> UserRole {
        match self {
            RoleChange::Promote => UserRole::Admin,
            RoleChange::Demote => UserRole::User,
        }
    }

    /// Backend path segment, `/admin/users/{id}/<segment>`
    pub fn path_segment(&self) -> &'static str {
        match self {
            RoleChange::Promote => "promote",
            RoleChange::Demote => "demote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationChange {
    Verify,
    Unverify,
}

impl VerificationChange {
    pub fn verified(&self) -> bool {
        matches!(self, VerificationChange::Verify)
    }

    pub fn path_segment(&self) -> &'static str {
        match self {
            VerificationChange::Verify => "verify",
            VerificationChange::Unverify => "unverify",
        }
    }
}

/// Administrative operations that can be applied to a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationAction {
    ApproveCampaigns,
    RejectCampaigns,
    ChangeRole(RoleChange),
    SetVerification(VerificationChange),
    RefundDonations,
}

impl ModerationAction {
    pub fn required_permission(&self) -> Permission {
        match self {
            ModerationAction::ApproveCampaigns | ModerationAction::RejectCampaigns => Permission::ModerateCampaigns,
            ModerationAction::ChangeRole(_) | ModerationAction::SetVerification(_) => Permission::ManageUsers,
            ModerationAction::RefundDonations => Permission::RefundDonations,
        }
    }

    fn describe(&self, count: usize) -> String {
        let noun = |singular: &str, plural: &str| {
            if count == 1 { singular.to_string() } else { plural.to_string() }
        };
        match self {
            ModerationAction::ApproveCampaigns => format!("approve {} {}", count, noun("campaign", "campaigns")),
            ModerationAction::RejectCampaigns => format!("reject {} {}", count, noun("campaign", "campaigns")),
            ModerationAction::ChangeRole(RoleChange::Promote) => {
                format!("promote {} {} to administrator", count, noun("user", "users"))
            }
            ModerationAction::ChangeRole(RoleChange::Demote) => {
                format!("demote {} {} to regular user", count, noun("user", "users"))
            }
            ModerationAction::SetVerification(VerificationChange::Verify) => {
                format!("verify {} {}", count, noun("user", "users"))
            }
            ModerationAction::SetVerification(VerificationChange::Unverify) => {
                format!("remove verification from {} {}", count, noun("user", "users"))
            }
            ModerationAction::RefundDonations => format!("refund {} {}", count, noun("donation", "donations")),
        }
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModerationAction::ApproveCampaigns => write!(f, "approve_campaigns"),
            ModerationAction::RejectCampaigns => write!(f, "reject_campaigns"),
            ModerationAction::ChangeRole(change) => write!(f, "{}_users", change.path_segment()),
            ModerationAction::SetVerification(change) => write!(f, "{}_users", change.path_segment()),
            ModerationAction::RefundDonations => write!(f, "refund_donations"),
        }
    }
}

/// What the operator is asked before a bulk action runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPrompt {
    pub action: ModerationAction,
    pub item_count: usize,
    pub message: String,
}

impl ConfirmationPrompt {
    pub fn new(action: ModerationAction, item_count: usize) -> Self {
        Self {
            action,
            item_count,
            message: format!("Are you sure you want to {}?", action.describe(item_count)),
        }
    }
}

/// Body of `POST /admin/campaigns/{id}/approve|reject`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignReviewBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of `POST /donations/{id}/refund`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRefundBody {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_wording() {
        let prompt = ConfirmationPrompt::new(ModerationAction::ApproveCampaigns, 5);
        assert_eq!(prompt.message, "Are you sure you want to approve 5 campaigns?");
        let prompt = ConfirmationPrompt::new(ModerationAction::ChangeRole(RoleChange::Promote), 1);
        assert_eq!(prompt.message, "Are you sure you want to promote 1 user to administrator?");
    }

    #[test]
    fn test_permissions_per_action() {
        assert_eq!(
            ModerationAction::RejectCampaigns.required_permission(),
            Permission::ModerateCampaigns
        );
        assert_eq!(
            ModerationAction::SetVerification(VerificationChange::Unverify).required_permission(),
            Permission::ManageUsers
        );
        assert_eq!(ModerationAction::RefundDonations.required_permission(), Permission::RefundDonations);
    }

    #[test]
    fn test_role_targets() {
        assert_eq!(RoleChange::Promote.target_role(), UserRole::Admin);
        assert_eq!(RoleChange::Demote.target_role(), UserRole::User);
        assert!(VerificationChange::Verify.verified());
        assert!(!VerificationChange::Unverify.verified());
    }

    #[test]
    fn test_approve_body_omits_reason() {
        let json = serde_json::to_value(CampaignReviewBody::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
