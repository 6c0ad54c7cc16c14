use async_trait::async_trait;
use crate::auth::AuthContext;
use crate::domains::core::{ApiClient, TransportError};
use crate::domains::donation::types::Donation;
use crate::domains::fees::types::{FeeQuote, FeeRequest};
use crate::domains::payment::types::{
    CheckoutSessionRequest, CheckoutSessionResponse, ConfirmPaymentRequest, DonationRequest,
    PaymentConfig, PaymentConfirmation, RefundRequest, RefundResult,
};
use crate::errors::{ServiceError, ServiceResult};

/// Payment endpoints of the backend API gateway
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Public: which payment methods are enabled
    async fn get_config(&self) -> ServiceResult<PaymentConfig>;

    async fn calculate_fees(&self, request: &FeeRequest, auth: &AuthContext) -> ServiceResult<FeeQuote>;

    async fn create_donation(&self, request: &DonationRequest, auth: &AuthContext) -> ServiceResult<Donation>;

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
        auth: &AuthContext,
    ) -> ServiceResult<CheckoutSessionResponse>;

    async fn confirm_payment(
        &self,
        request: &ConfirmPaymentRequest,
        auth: &AuthContext,
    ) -> ServiceResult<PaymentConfirmation>;

    async fn refund(&self, request: &RefundRequest, auth: &AuthContext) -> ServiceResult<RefundResult>;
}

/// `PaymentRepository` over the REST gateway
pub struct HttpPaymentRepository {
    api: ApiClient,
}

impl HttpPaymentRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

/// Checkout creation talks to the payment gateway through the backend, so
/// its failures carry gateway meaning.
fn checkout_error(err: TransportError) -> ServiceError {
    match err {
        TransportError::Unreachable(msg) => ServiceError::GatewayUnavailable(msg),
        TransportError::Status { status, message } if (400..500).contains(&status) => {
            ServiceError::PaymentRejected(message)
        }
        TransportError::Status { status: 502..=504, message } => ServiceError::GatewayUnavailable(message),
        other => other.into(),
    }
}

/// A confirmation the backend cannot make sense of is a bad callback
fn confirm_error(err: TransportError) -> ServiceError {
    match err {
        TransportError::Status { status: 400 | 404, message } => ServiceError::InvalidCallback(message),
        other => other.into(),
    }
}

#[async_trait]
impl PaymentRepository for HttpPaymentRepository {
    async fn get_config(&self) -> ServiceResult<PaymentConfig> {
        Ok(self.api.get_json("payment/config", None).await?)
    }

    async fn calculate_fees(&self, request: &FeeRequest, auth: &AuthContext) -> ServiceResult<FeeQuote> {
        Ok(self
            .api
            .post_json("payment/calculate-fees", request, Some(auth.bearer_token()?))
            .await?)
    }

    async fn create_donation(&self, request: &DonationRequest, auth: &AuthContext) -> ServiceResult<Donation> {
        Ok(self
            .api
            .post_json("payment/donate", request, Some(auth.bearer_token()?))
            .await?)
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
        auth: &AuthContext,
    ) -> ServiceResult<CheckoutSessionResponse> {
        self.api
            .post_json("payment/checkout-session", request, Some(auth.bearer_token()?))
            .await
            .map_err(checkout_error)
    }

    async fn confirm_payment(
        &self,
        request: &ConfirmPaymentRequest,
        auth: &AuthContext,
    ) -> ServiceResult<PaymentConfirmation> {
        self.api
            .post_json("payment/confirm", request, Some(auth.bearer_token()?))
            .await
            .map_err(confirm_error)
    }

    async fn refund(&self, request: &RefundRequest, auth: &AuthContext) -> ServiceResult<RefundResult> {
        Ok(self
            .api
            .post_json("payment/refund", request, Some(auth.bearer_token()?))
            .await?)
    }
}

#[cfg(test)]
pub use mock::MockPaymentRepository;
