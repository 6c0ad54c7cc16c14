pub mod context;
pub mod identity;

// Re-export public items
pub use context::AuthContext;
pub use identity::{IdentityService, Principal, StaticIdentity, resolve_auth_context};
