use std::fmt;
use serde::Serialize;
use thiserror::Error;

/// Domain-level errors
#[derive(Debug, Error, Clone, Serialize)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Illegal transition: cannot {action} from {from}")]
    IllegalTransition {
        from: String,
        action: String,
    },

    #[error("Campaign unavailable: {0}")]
    CampaignUnavailable(String),

    #[error("Entity not found: {0} with ID {1}")]
    EntityNotFound(String, String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn illegal_transition(from: impl fmt::Display, action: &str) -> Self {
        Self::IllegalTransition {
            from: from.to_string(),
            action: action.to_string(),
        }
    }
}

/// Service-level errors (application specific)
#[derive(Debug, Error, Clone, Serialize)]
pub enum ServiceError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Payment rejected: {0}")]
    PaymentRejected(String),

    #[error("Invalid payment callback: {0}")]
    InvalidCallback(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Backend rejected the request ({status}): {message}")]
    BackendRejected {
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl ServiceError {
    /// The message shown to the donor or operator. Backend and gateway
    /// messages are passed through untouched.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Domain(DomainError::Validation(err)) => err.to_string(),
            ServiceError::Domain(DomainError::InvalidAmount(msg)) => msg.clone(),
            ServiceError::Domain(err) => err.to_string(),
            ServiceError::Authentication(msg)
            | ServiceError::PermissionDenied(msg)
            | ServiceError::GatewayUnavailable(msg)
            | ServiceError::PaymentRejected(msg)
            | ServiceError::InvalidCallback(msg)
            | ServiceError::Network(msg)
            | ServiceError::Configuration(msg)
            | ServiceError::ExternalService(msg)
            | ServiceError::Timeout(msg) => msg.clone(),
            ServiceError::BackendRejected { message, .. } => message.clone(),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Domain(DomainError::Validation(err))
    }
}

/// Validation errors
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required {
        field: String,
    },

    #[error("Field '{field}' cannot exceed {max} characters")]
    MaxLength {
        field: String,
        max: usize,
    },

    #[error("Field '{field}' contains invalid format: {reason}")]
    Format {
        field: String,
        reason: String,
    },

    #[error("Field '{field}' contains an invalid value: {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        Self::Required {
            field: field.to_string(),
        }
    }

    pub fn max_length(field: &str, max: usize) -> Self {
        Self::MaxLength {
            field: field.to_string(),
            max,
        }
    }

    pub fn format(field: &str, reason: &str) -> Self {
        Self::Format {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}
