use async_trait::async_trait;
use urlencoding::encode;
use crate::auth::AuthContext;
use crate::domains::core::ApiClient;
use crate::domains::moderation::types::{CampaignReviewBody, DonationRefundBody, RoleChange, VerificationChange};
use crate::errors::{ServiceError, ServiceResult};
use crate::types::ApiAck;

/// Per-entity administrative endpoints. There are no bulk endpoints; a bulk
/// action is one call per entity.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn approve_campaign(&self, campaign_id: &str, auth: &AuthContext) -> ServiceResult<()>;

    async fn reject_campaign(&self, campaign_id: &str, reason: &str, auth: &AuthContext) -> ServiceResult<()>;

    async fn change_role(&self, user_id: &str, change: RoleChange, auth: &AuthContext) -> ServiceResult<()>;

    async fn set_verification(
        &self,
        user_id: &str,
        change: VerificationChange,
        auth: &AuthContext,
    ) -> ServiceResult<()>;

    async fn refund_donation(&self, donation_id: &str, reason: &str, auth: &AuthContext) -> ServiceResult<()>;
}

pub struct HttpAdminRepository {
    api: ApiClient,
}

impl HttpAdminRepository {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

/// A 2xx answer can still carry `success: false`; treat it as a rejection
fn check_ack(ack: Option<ApiAck>) -> ServiceResult<()> {
    match ack {
        Some(ApiAck { success: Some(false), message }) => Err(ServiceError::BackendRejected {
            status: 200,
            message: message.unwrap_or_else(|| "Request was not accepted".to_string()),
        }),
        _ => Ok(()),
    }
}

#[async_trait]
impl AdminRepository for HttpAdminRepository {
    async fn approve_campaign(&self, campaign_id: &str, auth: &AuthContext) -> ServiceResult<()> {
        let path = format!("admin/campaigns/{}/approve", encode(campaign_id));
        let ack = self
            .api
            .post_json(&path, &CampaignReviewBody::default(), Some(auth.bearer_token()?))
            .await?;
        check_ack(ack)
    }

    async fn reject_campaign(&self, campaign_id: &str, reason: &str, auth: &AuthContext) -> ServiceResult<()> {
        let path = format!("admin/campaigns/{}/reject", encode(campaign_id));
        let body = CampaignReviewBody {
            reason: Some(reason.to_string()),
        };
        let ack = self.api.post_json(&path, &body, Some(auth.bearer_token()?)).await?;
        check_ack(ack)
    }

    async fn change_role(&self, user_id: &str, change: RoleChange, auth: &AuthContext) -> ServiceResult<()> {
        let path = format!("admin/users/{}/{}", encode(user_id), change.path_segment());
        let ack = self
            .api
            .post_json(&path, &serde_json::json!({}), Some(auth.bearer_token()?))
            .await?;
        check_ack(ack)
    }

    async fn set_verification(
        &self,
        user_id: &str,
        change: VerificationChange,
        auth: &AuthContext,
    ) -> ServiceResult<()> {
        let path = format!("admin/users/{}/{}", encode(user_id), change.path_segment());
        let ack = self
            .api
            .put_json(&path, &serde_json::json!({}), Some(auth.bearer_token()?))
            .await?;
        check_ack(ack)
    }

    async fn refund_donation(&self, donation_id: &str, reason: &str, auth: &AuthContext) -> ServiceResult<()> {
        let path = format!("donations/{}/refund", encode(donation_id));
        let body = DonationRefundBody {
            reason: reason.to_string(),
        };
        let ack = self.api.post_json(&path, &body, Some(auth.bearer_token()?)).await?;
        check_ack(ack)
    }
}

#[cfg(test)]
pub use mock::MockAdminRepository;

#[cfg(test)]
mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Fails calls for selected ids with a backend rejection
    pub struct MockAdminRepository {
        failing: Mutex<HashSet<String>>,
        calls: Mutex<Vec<(String, String)>>,
        reasons: Mutex<Vec<String>>,
    }

    impl MockAdminRepository {
        pub fn new() -> Self {
            Self {
                failing: Mutex::new(HashSet::new()),
                calls: Mutex::new(Vec::new()),
                reasons: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(ids: &[&str]) -> Self {
            let repo = Self::new();
            repo.failing.lock().unwrap().extend(ids.iter().map(|id| id.to_string()));
            repo
        }

        pub fn call_count(&self, operation: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|(op, _)| op == operation).count()
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn reasons(&self) -> Vec<String> {
            self.reasons.lock().unwrap().clone()
        }

        async fn record(&self, operation: &str, id: &str) -> ServiceResult<()> {
            self.calls.lock().unwrap().push((operation.to_string(), id.to_string()));
            if self.failing.lock().unwrap().contains(id) {
                return Err(ServiceError::BackendRejected {
                    status: 409,
                    message: format!("{} cannot be applied to {}", operation, id),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AdminRepository for MockAdminRepository {
        async fn approve_campaign(&self, campaign_id: &str, _auth: &AuthContext) -> ServiceResult<()> {
            self.record("approve_campaign", campaign_id).await
        }

        async fn reject_campaign(&self, campaign_id: &str, reason: &str, _auth: &AuthContext) -> ServiceResult<()> {
            self.reasons.lock().unwrap().push(reason.to_string());
            self.record("reject_campaign", campaign_id).await
        }

        async fn change_role(&self, user_id: &str, change: RoleChange, _auth: &AuthContext) -> ServiceResult<()> {
            self.record(change.path_segment(), user_id).await
        }

        async fn set_verification(
            &self,
            user_id: &str,
            change: VerificationChange,
            _auth: &AuthContext,
        ) -> ServiceResult<()> {
            self.record(change.path_segment(), user_id).await
        }

        async fn refund_donation(&self, donation_id: &str, reason: &str, _auth: &AuthContext) -> ServiceResult<()> {
            self.reasons.lock().unwrap().push(reason.to_string());
            self.record("refund_donation", donation_id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_ack_is_rejection() {
        let ack = ApiAck {
            success: Some(false),
            message: Some("Campaign already approved".to_string()),
        };
        let err = check_ack(Some(ack)).unwrap_err();
        assert_eq!(err.user_message(), "Campaign already approved");
    }

    #[test]
    fn test_missing_or_positive_ack_is_success() {
        assert!(check_ack(None).is_ok());
        assert!(check_ack(Some(ApiAck::default())).is_ok());
        assert!(check_ack(Some(ApiAck {
            success: Some(true),
            message: None
        })).is_ok());
    }
}
