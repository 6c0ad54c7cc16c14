use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use crate::auth::AuthContext;
use crate::config::CoreConfig;
use crate::domains::core::with_timeout;
use crate::domains::payment::repository::PaymentRepository;
use crate::domains::payment::types::{
    CardSession, CheckoutSessionRequest, ConfirmPaymentRequest, DonationRequest, PaymentConfirmation,
    PaymentReference, RefundRequest, RefundResult,
};
use crate::errors::{DomainError, ServiceError, ServiceResult, ValidationError};
use crate::types::Permission;

/// Hosted checkout, confirmation and refunds. Owns no flow state; callers
/// decide which transition an outcome causes.
#[async_trait]
pub trait PaymentGatewaySession: Send + Sync {
    async fn start_card_session(&self, request: &DonationRequest, auth: &AuthContext) -> ServiceResult<CardSession>;

    /// A declined payment is `Ok` with `success: false`
    async fn confirm_session(
        &self,
        reference: &PaymentReference,
        auth: &AuthContext,
    ) -> ServiceResult<PaymentConfirmation>;

    /// `amount: None` refunds the full recorded amount. An acknowledgement
    /// with `success: false` is returned as `BackendRejected`.
    async fn refund(
        &self,
        donation_id: &str,
        amount: Option<Decimal>,
        reason: &str,
        auth: &AuthContext,
    ) -> ServiceResult<RefundResult>;
}

/// Gateway session backed by the backend's checkout endpoints
pub struct HostedCheckoutGateway {
    repo: Arc<dyn PaymentRepository>,
    success_url: String,
    cancel_url: String,
    timeout: Duration,
}

impl HostedCheckoutGateway {
    pub fn new(repo: Arc<dyn PaymentRepository>, config: &CoreConfig) -> Self {
        Self {
            repo,
            success_url: config.success_url_template(),
            cancel_url: config.cancel_url_template(),
            timeout: config.request_timeout(),
        }
    }
}

#[async_trait]
impl PaymentGatewaySession for HostedCheckoutGateway {
    async fn start_card_session(&self, request: &DonationRequest, auth: &AuthContext) -> ServiceResult<CardSession> {
        auth.authorize(Permission::MakeDonation)?;

        let body = CheckoutSessionRequest {
            donation: request.clone(),
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
        };
        let response = with_timeout(
            self.timeout,
            "Checkout session",
            self.repo.create_checkout_session(&body, auth),
        ).await?;

        if response.checkout_url.trim().is_empty() {
            return Err(ServiceError::ExternalService(
                "Payment gateway returned no checkout URL".to_string(),
            ));
        }

        debug!("Checkout session created for campaign {}", request.campaign_id);
        Ok(CardSession {
            redirect_url: response.checkout_url,
        })
    }

    async fn confirm_session(
        &self,
        reference: &PaymentReference,
        auth: &AuthContext,
    ) -> ServiceResult<PaymentConfirmation> {
        if reference.id().trim().is_empty() {
            return Err(ServiceError::InvalidCallback("Payment reference is empty".to_string()));
        }

        let payment_method_id = match reference {
            PaymentReference::PaymentIntent { payment_method_id, .. } => payment_method_id.clone(),
            PaymentReference::CheckoutSession(_) => None,
        };
        let body = ConfirmPaymentRequest {
            payment_intent_id: reference.id().to_string(),
            payment_method_id,
        };

        let confirmation = with_timeout(
            self.timeout,
            "Payment confirmation",
            self.repo.confirm_payment(&body, auth),
        ).await?;

        info!(
            "Payment {} confirmed with success={}",
            reference.id(),
            confirmation.success
        );
        Ok(confirmation)
    }

    async fn refund(
        &self,
        donation_id: &str,
        amount: Option<Decimal>,
        reason: &str,
        auth: &AuthContext,
    ) -> ServiceResult<RefundResult> {
        auth.authorize(Permission::RefundDonations)?;

        if donation_id.trim().is_empty() {
            return Err(ValidationError::required("donationId").into());
        }
        if let Some(amount) = amount {
            if amount <= Decimal::ZERO {
                return Err(DomainError::InvalidAmount(
                    "Refund amount must be greater than zero".to_string(),
                ).into());
            }
        }

        let body = RefundRequest {
            donation_id: donation_id.to_string(),
            amount,
            reason: reason.trim().to_string(),
        };
        let result = with_timeout(self.timeout, "Refund", self.repo.refund(&body, auth)).await?;
        if !result.success {
            warn!("Refund for donation {} was not accepted", donation_id);
            return Err(ServiceError::BackendRejected {
                status: 200,
                message: result
                    .message
                    .unwrap_or_else(|| "Refund was not accepted".to_string()),
            });
        }

        info!("Refund issued for donation {}", donation_id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::payment::repository::MockPaymentRepository;
    use crate::domains::payment::types::PaymentMethod;
    use crate::types::UserRole;
    use rust_decimal_macros::dec;

    fn gateway(repo: Arc<MockPaymentRepository>) -> HostedCheckoutGateway {
        HostedCheckoutGateway::new(repo, &CoreConfig::default())
    }

    fn donor() -> AuthContext {
        AuthContext::new("donor-1", UserRole::User, true, Some("token".to_string()))
    }

    fn admin() -> AuthContext {
        AuthContext::new("admin-1", UserRole::Admin, true, Some("token".to_string()))
    }

    fn request() -> DonationRequest {
        DonationRequest {
            campaign_id: "c-1".to_string(),
            amount: dec!(75),
            currency: "MYR".to_string(),
            donor_name: "Farid".to_string(),
            donor_email: "farid@example.com".to_string(),
            message: None,
            is_anonymous: false,
            payment_method: PaymentMethod::GatewayCard,
        }
    }

    #[tokio::test]
    async fn test_card_session_embeds_callback_templates() {
        let repo = Arc::new(MockPaymentRepository::new());
        let session = gateway(repo.clone()).start_card_session(&request(), &donor()).await.unwrap();

        assert!(session.redirect_url.starts_with("https://checkout.gateway.test/"));
        let sent = repo.last_checkout().unwrap();
        assert!(sent.success_url.ends_with("session_id={CHECKOUT_SESSION_ID}"));
        assert!(sent.cancel_url.contains("status=cancelled"));
    }

    #[tokio::test]
    async fn test_gateway_rejection_is_surfaced() {
        let repo = Arc::new(MockPaymentRepository::new());
        repo.fail(
            "create_checkout_session",
            ServiceError::PaymentRejected("Amount below gateway minimum".to_string()),
        );
        let err = gateway(repo).start_card_session(&request(), &donor()).await.unwrap_err();
        assert_eq!(err.user_message(), "Amount below gateway minimum");
    }

    #[tokio::test]
    async fn test_declined_payment_is_not_an_error() {
        let repo = Arc::new(MockPaymentRepository::new());
        repo.set_confirmation(PaymentConfirmation {
            success: false,
            donation_id: Some("don-7".to_string()),
            message: Some("Your card was declined".to_string()),
        });
        let confirmation = gateway(repo)
            .confirm_session(&PaymentReference::CheckoutSession("cs_1".to_string()), &donor())
            .await
            .unwrap();
        assert!(!confirmation.success);
    }

    #[tokio::test]
    async fn test_blank_reference_is_invalid_callback() {
        let repo = Arc::new(MockPaymentRepository::new());
        let err = gateway(repo.clone())
            .confirm_session(&PaymentReference::CheckoutSession("  ".to_string()), &donor())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCallback(_)));
        assert_eq!(repo.call_count("confirm_payment"), 0);
    }

    #[tokio::test]
    async fn test_refund_requires_permission() {
        let repo = Arc::new(MockPaymentRepository::new());
        let err = gateway(repo.clone()).refund("d-1", None, "duplicate", &donor()).await.unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
        assert_eq!(repo.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_full_and_partial_refunds() {
        let repo = Arc::new(MockPaymentRepository::new());
        let gateway = gateway(repo.clone());

        gateway.refund("d-1", None, "duplicate", &admin()).await.unwrap();
        assert_eq!(repo.last_refund().unwrap().amount, None);

        gateway.refund("d-1", Some(dec!(20)), "partial", &admin()).await.unwrap();
        assert_eq!(repo.last_refund().unwrap().amount, Some(dec!(20)));

        assert!(gateway.refund("d-1", Some(dec!(0)), "zero", &admin()).await.is_err());
        assert_eq!(repo.call_count("refund"), 2);
    }

    #[tokio::test]
    async fn test_backend_refund_rejection_passes_through() {
        let repo = Arc::new(MockPaymentRepository::new());
        repo.fail(
            "refund",
            ServiceError::BackendRejected {
                status: 400,
                message: "Refund amount exceeds donation amount".to_string(),
            },
        );
        let err = gateway(repo).refund("d-1", Some(dec!(9999)), "", &admin()).await.unwrap_err();
        assert_eq!(err.user_message(), "Refund amount exceeds donation amount");
    }

    #[tokio::test]
    async fn test_unaccepted_refund_acknowledgement_is_an_error() {
        let repo = Arc::new(MockPaymentRepository::new());
        repo.set_refund_result(RefundResult {
            success: false,
            message: Some("Refund amount exceeds donation amount".to_string()),
            ..RefundResult::default()
        });
        let err = gateway(repo.clone()).refund("d-1", Some(dec!(9999)), "", &admin()).await.unwrap_err();
        assert!(matches!(err, ServiceError::BackendRejected { status: 200, .. }));
        assert_eq!(err.user_message(), "Refund amount exceeds donation amount");
        assert_eq!(repo.call_count("refund"), 1);
    }
}
