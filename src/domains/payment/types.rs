use std::fmt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a donor pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    GatewayCard,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::GatewayCard => "GATEWAY_CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GATEWAY_CARD" | "CARD" => Some(PaymentMethod::GatewayCard),
            "BANK_TRANSFER" => Some(PaymentMethod::BankTransfer),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of `POST /payment/donate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub campaign_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub donor_name: String,
    pub donor_email: String,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub payment_method: PaymentMethod,
}

/// Body of `POST /payment/checkout-session`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    #[serde(flatten)]
    pub donation: DonationRequest,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    #[serde(alias = "url")]
    pub checkout_url: String,
}

/// A started hosted checkout; the host navigates to `redirect_url`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSession {
    pub redirect_url: String,
}

/// Body of `POST /payment/confirm`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
}

/// Outcome of confirming a session or intent. A declined payment is a
/// `success: false` value, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub success: bool,
    #[serde(default)]
    pub donation_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /payment/refund`; `amount: None` refunds in full
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub donation_id: String,
    #[serde(with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub refund_id: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Receiving account shown to bank-transfer donors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountDetails {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `GET /payment/config`: which methods the deployment accepts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfig {
    #[serde(default)]
    pub card_enabled: bool,
    #[serde(default)]
    pub bank_transfer_enabled: bool,
    #[serde(default)]
    pub bank_account: Option<BankAccountDetails>,
}

impl PaymentConfig {
    pub fn is_enabled(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::GatewayCard => self.card_enabled,
            PaymentMethod::BankTransfer => self.bank_transfer_enabled,
        }
    }

    pub fn enabled_methods(&self) -> Vec<PaymentMethod> {
        [PaymentMethod::GatewayCard, PaymentMethod::BankTransfer]
            .into_iter()
            .filter(|m| self.is_enabled(*m))
            .collect()
    }
}

/// The reference a gateway return carries back to the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentReference {
    CheckoutSession(String),
    PaymentIntent {
        intent_id: String,
        payment_method_id: Option<String>,
    },
}

impl PaymentReference {
    pub fn id(&self) -> &str {
        match self {
            PaymentReference::CheckoutSession(id) => id,
            PaymentReference::PaymentIntent { intent_id, .. } => intent_id,
        }
    }
}
