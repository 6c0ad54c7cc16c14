use std::fmt;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domains::fees::format_amount;
use crate::domains::payment::types::{BankAccountDetails, PaymentMethod};
use crate::errors::{DomainError, DomainResult};

/// Shown in place of the donor's name on anonymous donations
pub const ANONYMOUS_DONOR_NAME: &str = "Anonymous";

/// Maximum length of a donor's message
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Settlement status of a donation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DonationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "PENDING",
            DonationStatus::Processing => "PROCESSING",
            DonationStatus::Completed => "COMPLETED",
            DonationStatus::Failed => "FAILED",
            DonationStatus::Refunded => "REFUNDED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(DonationStatus::Pending),
            "PROCESSING" => Some(DonationStatus::Processing),
            "COMPLETED" => Some(DonationStatus::Completed),
            "FAILED" => Some(DonationStatus::Failed),
            "REFUNDED" => Some(DonationStatus::Refunded),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: DonationStatus) -> bool {
        use DonationStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Completed, Refunded)
        )
    }

    /// Failed and refunded donations never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, DonationStatus::Failed | DonationStatus::Refunded)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A donation as recorded by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: String,
    pub campaign_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub donor_email: Option<String>,
    #[serde(default, alias = "isAnonymous")]
    pub anonymous: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: DonationStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Donation {
    /// Name for any donor-facing or operator-facing view
    pub fn display_name(&self) -> &str {
        if self.anonymous {
            return ANONYMOUS_DONOR_NAME;
        }
        self.donor_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(ANONYMOUS_DONOR_NAME)
    }

    /// Copy safe for any downstream view: an anonymous donor's captured name
    /// is replaced with the placeholder
    pub fn with_name_suppressed(mut self) -> Self {
        if self.anonymous {
            self.donor_name = Some(ANONYMOUS_DONOR_NAME.to_string());
        }
        self
    }

    /// Apply a settlement status change, enforcing the status machine
    pub fn transition_to(&mut self, next: DonationStatus, at: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::illegal_transition(self.status, &format!("move to {}", next)));
        }
        self.status = next;
        if next == DonationStatus::Completed {
            self.completed_at = Some(at);
        }
        Ok(())
    }
}

/// What a bank-transfer donor needs to complete the payment manually
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInstructions {
    pub donation_id: String,
    /// Quote this reference on the transfer
    pub reference: String,
    pub amount_due: String,
    pub bank_account: Option<BankAccountDetails>,
}

impl TransferInstructions {
    pub fn for_donation(donation: &Donation, bank_account: Option<BankAccountDetails>) -> Self {
        Self {
            donation_id: donation.id.clone(),
            reference: donation.transaction_id.clone().unwrap_or_else(|| donation.id.clone()),
            amount_due: format_amount(donation.amount, &donation.currency),
            bank_account,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn donation(anonymous: bool) -> Donation {
        Donation {
            id: "d-1".to_string(),
            campaign_id: "c-1".to_string(),
            amount: dec!(50),
            currency: "MYR".to_string(),
            donor_name: Some("Siti Rahman".to_string()),
            donor_email: Some("siti@example.com".to_string()),
            anonymous,
            message: None,
            payment_method: PaymentMethod::BankTransfer,
            status: DonationStatus::Pending,
            transaction_id: None,
            receipt_url: None,
            created_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_anonymous_name_is_suppressed() {
        assert_eq!(donation(true).display_name(), ANONYMOUS_DONOR_NAME);
        assert_eq!(donation(false).display_name(), "Siti Rahman");
    }

    #[test]
    fn test_suppressed_copy_hides_raw_name() {
        let d = donation(true).with_name_suppressed();
        assert_eq!(d.donor_name.as_deref(), Some(ANONYMOUS_DONOR_NAME));
        let d = donation(false).with_name_suppressed();
        assert_eq!(d.donor_name.as_deref(), Some("Siti Rahman"));
    }

    #[test]
    fn test_transfer_instructions() {
        let instructions = TransferInstructions::for_donation(&donation(false), None);
        assert_eq!(instructions.reference, "d-1");
        assert_eq!(instructions.amount_due, "MYR 50.00");
    }

    #[test]
    fn test_status_machine() {
        use DonationStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Completed.can_transition_to(Refunded));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Refunded.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Refunded));
    }

    #[test]
    fn test_completion_stamps_time() {
        let mut d = donation(false);
        let now = Utc::now();
        d.transition_to(DonationStatus::Completed, now).unwrap();
        assert_eq!(d.completed_at, Some(now));
        assert!(d.transition_to(DonationStatus::Pending, now).is_err());
    }

    #[test]
    fn test_parses_backend_payload() {
        let d: Donation = serde_json::from_str(
            r#"{"id":"d-9","campaignId":"c-2","amount":25.5,"currency":"MYR",
                "isAnonymous":true,"paymentMethod":"GATEWAY_CARD","status":"PENDING"}"#,
        ).unwrap();
        assert!(d.anonymous);
        assert_eq!(d.amount, dec!(25.5));
        assert_eq!(d.status, DonationStatus::Pending);
    }
}
