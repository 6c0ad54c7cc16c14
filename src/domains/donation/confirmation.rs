use std::sync::Arc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use crate::auth::AuthContext;
use crate::domains::payment::callback::RedirectCallback;
use crate::domains::payment::gateway::PaymentGatewaySession;
use crate::errors::ServiceResult;

const DEFAULT_FAILURE_MESSAGE: &str = "The payment was not completed";

/// Outcome view shown after returning from the hosted checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationOutcome {
    #[serde(rename_all = "camelCase")]
    Completed { donation_id: Option<String> },
    #[serde(rename_all = "camelCase")]
    Failed {
        donation_id: Option<String>,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Cancelled { session_id: Option<String> },
}

/// Settles a card donation from the return URL alone. Nothing from the flow
/// that started the payment is needed or consulted.
pub struct ConfirmationHandler {
    gateway: Arc<dyn PaymentGatewaySession>,
}

impl ConfirmationHandler {
    pub fn new(gateway: Arc<dyn PaymentGatewaySession>) -> Self {
        Self { gateway }
    }

    /// Resolve a gateway return. A malformed return fails with
    /// `InvalidCallback` before any call is made; confirmation errors are
    /// not retried.
    pub async fn handle_return(&self, return_url: &str, auth: &AuthContext) -> ServiceResult<ConfirmationOutcome> {
        let reference = match RedirectCallback::parse(return_url)? {
            RedirectCallback::Cancelled { session_id } => {
                info!("Donor cancelled checkout {:?}", session_id);
                return Ok(ConfirmationOutcome::Cancelled { session_id });
            }
            RedirectCallback::Returned(reference) => reference,
        };

        let confirmation = self.gateway.confirm_session(&reference, auth).await?;
        if confirmation.success {
            Ok(ConfirmationOutcome::Completed {
                donation_id: confirmation.donation_id,
            })
        } else {
            warn!("Payment {} was not completed", reference.id());
            Ok(ConfirmationOutcome::Failed {
                donation_id: confirmation.donation_id,
                message: confirmation
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::domains::payment::gateway::HostedCheckoutGateway;
    use crate::domains::payment::repository::MockPaymentRepository;
    use crate::domains::payment::types::PaymentConfirmation;
    use crate::errors::ServiceError;
    use crate::types::UserRole;

    fn handler(repo: Arc<MockPaymentRepository>) -> ConfirmationHandler {
        ConfirmationHandler::new(Arc::new(HostedCheckoutGateway::new(repo, &CoreConfig::default())))
    }

    fn donor() -> AuthContext {
        AuthContext::new("donor-1", UserRole::User, true, Some("token".to_string()))
    }

    #[tokio::test]
    async fn test_missing_parameters_rejected_without_calls() {
        let repo = Arc::new(MockPaymentRepository::new());
        let err = handler(repo.clone())
            .handle_return("https://give.example.org/payment/success?ref=abc", &donor())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCallback(_)));
        assert_eq!(repo.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_session_return_completes() {
        let repo = Arc::new(MockPaymentRepository::new());
        let outcome = handler(repo.clone())
            .handle_return("?session_id=cs_test_123", &donor())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ConfirmationOutcome::Completed {
                donation_id: Some("don-42".to_string())
            }
        );
        assert_eq!(repo.call_count("confirm_payment"), 1);
    }

    #[tokio::test]
    async fn test_cancel_return_makes_no_call() {
        let repo = Arc::new(MockPaymentRepository::new());
        let outcome = handler(repo.clone())
            .handle_return("status=cancelled&session_id=cs_test_123", &donor())
            .await
            .unwrap();
        assert!(matches!(outcome, ConfirmationOutcome::Cancelled { .. }));
        assert_eq!(repo.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_declined_payment_is_failed_outcome() {
        let repo = Arc::new(MockPaymentRepository::new());
        repo.set_confirmation(PaymentConfirmation {
            success: false,
            donation_id: Some("don-9".to_string()),
            message: None,
        });
        let outcome = handler(repo)
            .handle_return("payment_intent=pi_55", &donor())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ConfirmationOutcome::Failed {
                donation_id: Some("don-9".to_string()),
                message: DEFAULT_FAILURE_MESSAGE.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_session_is_terminal_error() {
        let repo = Arc::new(MockPaymentRepository::new());
        repo.fail(
            "confirm_payment",
            ServiceError::InvalidCallback("No such checkout session: cs_gone".to_string()),
        );
        let err = handler(repo.clone())
            .handle_return("session_id=cs_gone", &donor())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "No such checkout session: cs_gone");
        assert_eq!(repo.call_count("confirm_payment"), 1);
    }
}
