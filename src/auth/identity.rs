use std::fmt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::auth::AuthContext;
use crate::errors::{ServiceError, ServiceResult};

/// A signed-in principal as reported by the identity provider
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_verified: bool,
    pub id_token: String,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("user_id", &self.user_id)
            .field("is_admin", &self.is_admin)
            .field("is_verified", &self.is_verified)
            .finish_non_exhaustive()
    }
}

/// The external identity service. Session wiring lives in the host.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// The currently signed-in principal, if any
    async fn current_principal(&self) -> ServiceResult<Option<Principal>>;
}

/// Identity service backed by a principal the host already resolved
pub struct StaticIdentity {
    principal: Option<Principal>,
}

impl StaticIdentity {
    pub fn new(principal: Option<Principal>) -> Self {
        Self { principal }
    }
}

#[async_trait]
impl IdentityService for StaticIdentity {
    async fn current_principal(&self) -> ServiceResult<Option<Principal>> {
        Ok(self.principal.clone())
    }
}

/// Resolve the auth context for the signed-in principal
pub async fn resolve_auth_context(identity: &dyn IdentityService) -> ServiceResult<AuthContext> {
    match identity.current_principal().await? {
        Some(principal) => Ok(AuthContext::from_principal(&principal)),
        None => Err(ServiceError::Authentication("No user is signed in".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signed_out_is_authentication_error() {
        let identity = StaticIdentity::new(None);
        let err = resolve_auth_context(&identity).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_principal_resolves_to_context() {
        let principal: Principal = serde_json::from_str(
            r#"{"userId":"u-9","isAdmin":true,"isVerified":true,"idToken":"tok"}"#,
        ).unwrap();
        let identity = StaticIdentity::new(Some(principal));
        let auth = resolve_auth_context(&identity).await.unwrap();
        assert!(auth.is_admin());
        assert_eq!(auth.bearer_token().unwrap(), "tok");
    }
}
