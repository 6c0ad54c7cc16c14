use std::fmt;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domains::donation::types::{Donation, TransferInstructions, ANONYMOUS_DONOR_NAME, MAX_MESSAGE_LENGTH};
use crate::domains::fees::{validate_amount, AmountLimits, FeeBreakdown};
use crate::domains::payment::types::{DonationRequest, PaymentConfig, PaymentMethod};
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{Validate, ValidationBuilder};

/// Step of a single donation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStep {
    Amount,
    Details,
    PaymentMethod,
    Processing,
    /// Control handed to the hosted checkout; a confirmation handler settles it
    RedirectPending,
    Success,
    Failed,
    Cancelled,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Amount => "AMOUNT",
            FlowStep::Details => "DETAILS",
            FlowStep::PaymentMethod => "PAYMENT_METHOD",
            FlowStep::Processing => "PROCESSING",
            FlowStep::RedirectPending => "REDIRECT_PENDING",
            FlowStep::Success => "SUCCESS",
            FlowStep::Failed => "FAILED",
            FlowStep::Cancelled => "CANCELLED",
        }
    }

    /// Steps where the donor is still filling the form
    pub fn is_editable(&self) -> bool {
        matches!(self, FlowStep::Amount | FlowStep::Details | FlowStep::PaymentMethod)
    }

    /// No further transition is possible from here
    pub fn is_final(&self) -> bool {
        matches!(self, FlowStep::Success | FlowStep::RedirectPending | FlowStep::Cancelled)
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is giving, as captured on the details step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorDetails {
    #[serde(default)]
    pub donor_name: String,
    #[serde(default)]
    pub donor_email: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "isAnonymous")]
    pub anonymous: bool,
}

impl DonorDetails {
    /// Trimmed copy; a blank message becomes `None`
    pub fn normalized(&self) -> Self {
        Self {
            donor_name: self.donor_name.trim().to_string(),
            donor_email: self.donor_email.trim().to_string(),
            message: self
                .message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            anonymous: self.anonymous,
        }
    }

    /// Copy safe to hand to any view: an anonymous donor's name is replaced
    pub fn masked(&self) -> Self {
        Self {
            donor_name: self.outgoing_name().to_string(),
            ..self.clone()
        }
    }

    /// Name sent to the backend; the captured name never leaves when anonymous
    pub fn outgoing_name(&self) -> &str {
        if self.anonymous {
            ANONYMOUS_DONOR_NAME
        } else {
            &self.donor_name
        }
    }
}

impl Validate for DonorDetails {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("donorEmail", Some(self.donor_email.clone()))
            .required()
            .email()
            .validate()?;

        if !self.anonymous {
            ValidationBuilder::new("donorName", Some(self.donor_name.clone()))
                .required()
                .validate()?;
        }

        ValidationBuilder::new("message", self.message.clone())
            .max_length(MAX_MESSAGE_LENGTH)
            .validate()?;

        Ok(())
    }
}

/// Where a completed flow left the donor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowOutcome {
    #[serde(rename_all = "camelCase")]
    RedirectPending { redirect_url: String },
    #[serde(rename_all = "camelCase")]
    ManualTransferPending {
        donation: Donation,
        instructions: TransferInstructions,
    },
}

/// Host-facing snapshot of a flow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowState {
    pub step: FlowStep,
    pub campaign_id: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub details: Option<DonorDetails>,
    pub payment_method: Option<PaymentMethod>,
    pub enabled_methods: Vec<PaymentMethod>,
    pub fees: Option<FeeBreakdown>,
    pub error: Option<String>,
    pub outcome: Option<FlowOutcome>,
}

/// The donation step machine. Pure: it never performs I/O, the session
/// around it does, and feeds outcomes back through `redirect`, `complete`
/// and `fail`.
#[derive(Debug, Clone)]
pub struct DonationFlow {
    step: FlowStep,
    campaign_id: String,
    currency: String,
    limits: AmountLimits,
    amount: Option<Decimal>,
    details: Option<DonorDetails>,
    method: Option<PaymentMethod>,
    error: Option<String>,
    outcome: Option<FlowOutcome>,
}

impl DonationFlow {
    pub fn new(campaign_id: &str, currency: &str, limits: AmountLimits) -> Self {
        Self {
            step: FlowStep::Amount,
            campaign_id: campaign_id.to_string(),
            currency: currency.to_string(),
            limits,
            amount: None,
            details: None,
            method: None,
            error: None,
            outcome: None,
        }
    }

    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn details(&self) -> Option<&DonorDetails> {
        self.details.as_ref()
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn outcome(&self) -> Option<&FlowOutcome> {
        self.outcome.as_ref()
    }

    /// AMOUNT -> DETAILS
    pub fn submit_amount(&mut self, amount: Decimal) -> DomainResult<()> {
        self.expect_step(FlowStep::Amount, "submit an amount")?;
        let amount = validate_amount(amount, &self.limits)?;
        self.amount = Some(amount);
        self.move_to(FlowStep::Details);
        Ok(())
    }

    /// DETAILS -> PAYMENT_METHOD
    pub fn submit_details(&mut self, details: DonorDetails) -> DomainResult<()> {
        self.expect_step(FlowStep::Details, "submit donor details")?;
        let details = details.normalized();
        details.validate()?;
        self.details = Some(details);
        self.move_to(FlowStep::PaymentMethod);
        Ok(())
    }

    /// PAYMENT_METHOD -> PROCESSING. Everything captured so far is checked
    /// again, so no request can leave with an unvalidated amount or email.
    pub fn begin_processing(&mut self, method: PaymentMethod, config: &PaymentConfig) -> DomainResult<DonationRequest> {
        self.expect_step(FlowStep::PaymentMethod, "submit payment")?;
        if !config.is_enabled(method) {
            return Err(ValidationError::invalid_value(
                "paymentMethod",
                &format!("{} is not currently accepted", method),
            ).into());
        }

        let amount = self
            .amount
            .ok_or_else(|| DomainError::InvalidAmount("Donation amount is required".to_string()))?;
        validate_amount(amount, &self.limits)?;
        let details = self
            .details
            .as_ref()
            .ok_or_else(|| ValidationError::required("donorEmail"))?;
        details.validate()?;

        let request = DonationRequest {
            campaign_id: self.campaign_id.clone(),
            amount,
            currency: self.currency.clone(),
            donor_name: details.outgoing_name().to_string(),
            donor_email: details.donor_email.clone(),
            message: details.message.clone(),
            is_anonymous: details.anonymous,
            payment_method: method,
        };

        self.method = Some(method);
        self.error = None;
        self.move_to(FlowStep::Processing);
        Ok(request)
    }

    /// PROCESSING -> REDIRECT_PENDING (card payments)
    pub fn redirect(&mut self, redirect_url: &str) -> DomainResult<()> {
        self.expect_step(FlowStep::Processing, "hand off to the payment gateway")?;
        self.outcome = Some(FlowOutcome::RedirectPending {
            redirect_url: redirect_url.to_string(),
        });
        self.move_to(FlowStep::RedirectPending);
        Ok(())
    }

    /// PROCESSING -> SUCCESS
    pub fn complete(&mut self, outcome: FlowOutcome) -> DomainResult<()> {
        self.expect_step(FlowStep::Processing, "complete")?;
        self.outcome = Some(outcome);
        self.move_to(FlowStep::Success);
        Ok(())
    }

    /// PROCESSING -> FAILED, keeping the message for display
    pub fn fail(&mut self, message: &str) -> DomainResult<()> {
        self.expect_step(FlowStep::Processing, "fail")?;
        self.error = Some(message.to_string());
        self.move_to(FlowStep::Failed);
        Ok(())
    }

    /// FAILED -> PAYMENT_METHOD; amount and details are kept
    pub fn retry(&mut self) -> DomainResult<()> {
        self.expect_step(FlowStep::Failed, "retry")?;
        self.error = None;
        self.move_to(FlowStep::PaymentMethod);
        Ok(())
    }

    /// DETAILS -> AMOUNT, PAYMENT_METHOD -> DETAILS. Nothing is cleared.
    pub fn back(&mut self) -> DomainResult<()> {
        let previous = match self.step {
            FlowStep::Details => FlowStep::Amount,
            FlowStep::PaymentMethod => FlowStep::Details,
            other => return Err(DomainError::illegal_transition(other, "go back")),
        };
        self.move_to(previous);
        Ok(())
    }

    /// Abort before anything was sent
    pub fn cancel(&mut self) -> DomainResult<()> {
        if !self.step.is_editable() {
            return Err(DomainError::illegal_transition(self.step, "cancel"));
        }
        self.move_to(FlowStep::Cancelled);
        Ok(())
    }

    pub fn snapshot(&self, config: &PaymentConfig, fees: Option<FeeBreakdown>) -> FlowState {
        FlowState {
            step: self.step,
            campaign_id: self.campaign_id.clone(),
            currency: self.currency.clone(),
            amount: self.amount,
            details: self.details.as_ref().map(DonorDetails::masked),
            payment_method: self.method,
            enabled_methods: config.enabled_methods(),
            fees,
            error: self.error.clone(),
            outcome: self.outcome.clone(),
        }
    }

    fn expect_step(&self, expected: FlowStep, action: &str) -> DomainResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(DomainError::illegal_transition(self.step, action))
        }
    }

    fn move_to(&mut self, next: FlowStep) {
        debug!("Donation flow for campaign {}: {} -> {}", self.campaign_id, self.step, next);
        self.step = next;
    }
}
