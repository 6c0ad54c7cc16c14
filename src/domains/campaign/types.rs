use std::fmt;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::errors::{DomainError, DomainResult};

/// Moderation status of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatus {
    Pending,
    Approved,
    Rejected,
}

/// An operator's verdict on a pending campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignDecision {
    Approve,
    Reject,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "PENDING",
            CampaignStatus::Approved => "APPROVED",
            CampaignStatus::Rejected => "REJECTED",
        }
    }

    /// Only pending campaigns can be decided; both outcomes are final
    pub fn apply(&self, decision: CampaignDecision) -> DomainResult<CampaignStatus> {
        match (self, decision) {
            (CampaignStatus::Pending, CampaignDecision::Approve) => Ok(CampaignStatus::Approved),
            (CampaignStatus::Pending, CampaignDecision::Reject) => Ok(CampaignStatus::Rejected),
            (status, decision) => Err(DomainError::illegal_transition(
                status,
                match decision {
                    CampaignDecision::Approve => "approve campaign",
                    CampaignDecision::Reject => "reject campaign",
                },
            )),
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The campaign fields this core reads or moderates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub status: CampaignStatus,
    #[serde(default)]
    pub verified: bool,
    #[serde(with = "rust_decimal::serde::float")]
    pub goal_amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub raised_amount: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Campaign {
    pub fn can_accept_donations(&self, now: DateTime<Utc>) -> bool {
        self.verified
            && self.status == CampaignStatus::Approved
            && self.start_date <= now
            && now <= self.end_date
    }

    pub fn ensure_accepting_donations(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.can_accept_donations(now) {
            return Ok(());
        }
        let reason = if !self.verified {
            "campaign is not verified"
        } else if self.status != CampaignStatus::Approved {
            "campaign is not approved"
        } else if now < self.start_date {
            "campaign has not started"
        } else {
            "campaign has ended"
        };
        Err(DomainError::CampaignUnavailable(format!("{}: {}", self.id, reason)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn campaign(status: CampaignStatus, verified: bool) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: "c-1".to_string(),
            title: Some("Clean water".to_string()),
            status,
            verified,
            goal_amount: dec!(10000),
            raised_amount: dec!(0),
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(30),
        }
    }

    #[test]
    fn test_acceptance_requires_all_conditions() {
        let now = Utc::now();
        assert!(campaign(CampaignStatus::Approved, true).can_accept_donations(now));
        assert!(!campaign(CampaignStatus::Approved, false).can_accept_donations(now));
        assert!(!campaign(CampaignStatus::Pending, true).can_accept_donations(now));
        assert!(!campaign(CampaignStatus::Approved, true).can_accept_donations(now + Duration::days(31)));
        assert!(!campaign(CampaignStatus::Approved, true).can_accept_donations(now - Duration::days(2)));
    }

    #[test]
    fn test_ensure_reports_reason() {
        let err = campaign(CampaignStatus::Rejected, true)
            .ensure_accepting_donations(Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("not approved"));
    }

    #[test]
    fn test_decisions_are_final() {
        assert_eq!(CampaignStatus::Pending.apply(CampaignDecision::Approve).unwrap(), CampaignStatus::Approved);
        assert_eq!(CampaignStatus::Pending.apply(CampaignDecision::Reject).unwrap(), CampaignStatus::Rejected);
        assert!(CampaignStatus::Approved.apply(CampaignDecision::Reject).is_err());
        assert!(CampaignStatus::Rejected.apply(CampaignDecision::Approve).is_err());
    }
}
