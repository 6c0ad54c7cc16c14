use std::fmt;
use crate::auth::identity::Principal;
use crate::types::{Permission, UserRole};
use crate::errors::ServiceError;

/// Represents the authentication context for the current operation
#[derive(Clone)]
pub struct AuthContext {
    /// The identity-provider ID of the signed-in principal
    pub user_id: String,

    /// The role derived from the identity provider's admin flag
    pub role: UserRole,

    /// Whether the identity provider reports the principal as verified
    pub verified: bool,

    bearer_token: Option<String>,
}

impl AuthContext {
    /// Create a new authentication context
    pub fn new(user_id: &str, role: UserRole, verified: bool, bearer_token: Option<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            role,
            verified,
            bearer_token,
        }
    }

    /// Build the context from the principal issued by the identity service
    pub fn from_principal(principal: &Principal) -> Self {
        let role = if principal.is_admin { UserRole::Admin } else { UserRole::User };
        Self::new(
            &principal.user_id,
            role,
            principal.is_verified,
            Some(principal.id_token.clone()).filter(|t| !t.trim().is_empty()),
        )
    }

    /// The bearer credential attached to authenticated backend calls
    pub fn bearer_token(&self) -> Result<&str, ServiceError> {
        self.bearer_token
            .as_deref()
            .ok_or_else(|| ServiceError::Authentication("No bearer credential for the signed-in user".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Check if user has a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// Authorize a specific permission, returning an error if not allowed
    pub fn authorize(&self, permission: Permission) -> Result<(), ServiceError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            log::warn!("User {} denied permission {}", self.user_id, permission.as_str());
            Err(ServiceError::PermissionDenied(format!(
                "User does not have permission: {}",
                permission.as_str()
            )))
        }
    }

    /// Verify user is an admin
    pub fn authorize_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            log::warn!("User {} attempted an administrator action", self.user_id);
            Err(ServiceError::PermissionDenied(
                "This action requires administrator privileges".to_string()
            ))
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("verified", &self.verified)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
