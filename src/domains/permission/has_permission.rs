use serde::{Deserialize, Serialize};

// --- User Role Definition ---

/// UserRole enum for authorization in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

// --- Permission Enum Definition ---

/// Permission enum representing individual permissions in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    // Donor permissions
    MakeDonation,

    // Moderation permissions
    ModerateCampaigns,
    ManageUsers,
    RefundDonations,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "USER" => Some(UserRole::User),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Check if the role has a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            UserRole::Admin => true, // Admin has all permissions
            UserRole::User => match permission {
                Permission::MakeDonation => true,
                Permission::ModerateCampaigns
                | Permission::ManageUsers
                | Permission::RefundDonations => false,
            },
        }
    }

    /// Check if the role has all of the specified permissions
    pub fn has_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::MakeDonation => "make_donation",
            Permission::ModerateCampaigns => "moderate_campaigns",
            Permission::ManageUsers => "manage_users",
            Permission::RefundDonations => "refund_donations",
        }
    }

    pub fn all() -> Vec<Permission> {
        vec![
            Permission::MakeDonation,
            Permission::ModerateCampaigns,
            Permission::ManageUsers,
            Permission::RefundDonations,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_every_permission() {
        assert!(UserRole::Admin.has_permissions(&Permission::all()));
    }

    #[test]
    fn test_user_cannot_moderate() {
        assert!(UserRole::User.has_permission(Permission::MakeDonation));
        assert!(!UserRole::User.has_permission(Permission::ModerateCampaigns));
        assert!(!UserRole::User.has_permission(Permission::ManageUsers));
        assert!(!UserRole::User.has_permission(Permission::RefundDonations));
    }

    #[test]
    fn test_role_round_trip_is_case_insensitive() {
        assert_eq!(UserRole::from_str("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_str("USER"), Some(UserRole::User));
        assert_eq!(UserRole::from_str("field"), None);
    }
}
