use std::fmt;
use serde::{Deserialize, Serialize};
use crate::errors::{DomainError, ServiceError, ValidationError};

/// Error codes for FFI boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Success (no error)
    Success = 0,

    // General errors (1-99)
    Unknown = 1,
    InvalidArgument = 2,
    NullPointer = 3,
    InvalidUtf8 = 4,
    InvalidUuid = 5,
    InternalError = 6,
    NotInitialized = 7,

    // Domain errors (200-299)
    DomainGeneral = 200,
    EntityNotFound = 201,
    ValidationFailed = 204,
    InvalidAmount = 210,
    IllegalTransition = 211,
    CampaignUnavailable = 212,

    // Service errors (300-399)
    ServiceGeneral = 300,
    AuthenticationFailed = 303,
    PermissionDenied = 305,
    NetworkError = 308,
    ConfigurationError = 310,
    ExternalServiceError = 311,
    Timeout = 312,
    BackendRejected = 313,

    // Payment errors (400-499)
    GatewayUnavailable = 400,
    PaymentRejected = 401,
    InvalidCallback = 402,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Error type for FFI boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FFIError {
    /// Error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message, passed through from the backend or gateway
    pub message: String,

    /// Optional additional details (JSON string)
    pub details: Option<String>,
}

impl fmt::Display for FFIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for FFIError {}

pub type FFIResult<T> = Result<T, FFIError>;

impl FFIError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: &str, details: serde_json::Value) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn internal(message: String) -> Self {
        Self::new(ErrorCode::InternalError, &message)
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::with_details(
            ErrorCode::EntityNotFound,
            &format!("{} not found: {}", entity, id),
            serde_json::json!({ "entity": entity, "id": id }),
        )
    }
}

impl From<ValidationError> for FFIError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        let details = match &err {
            ValidationError::Required { field } => serde_json::json!({ "field": field, "type": "required" }),
            ValidationError::MaxLength { field, max } => {
                serde_json::json!({ "field": field, "type": "max_length", "max": max })
            }
            ValidationError::Format { field, reason } => {
                serde_json::json!({ "field": field, "type": "format", "reason": reason })
            }
            ValidationError::InvalidValue { field, reason } => {
                serde_json::json!({ "field": field, "type": "invalid_value", "reason": reason })
            }
        };
        Self::with_details(ErrorCode::ValidationFailed, &message, details)
    }
}

impl From<DomainError> for FFIError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(val_err) => val_err.into(),
            DomainError::InvalidAmount(msg) => Self::new(ErrorCode::InvalidAmount, &msg),
            DomainError::IllegalTransition { from, action } => Self::with_details(
                ErrorCode::IllegalTransition,
                &format!("Cannot {} from {}", action, from),
                serde_json::json!({ "from": from, "action": action }),
            ),
            DomainError::CampaignUnavailable(msg) => Self::new(ErrorCode::CampaignUnavailable, &msg),
            DomainError::EntityNotFound(entity, id) => Self::not_found(&entity, &id),
            DomainError::Internal(msg) => Self::new(ErrorCode::InternalError, &msg),
        }
    }
}

impl From<ServiceError> for FFIError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(domain_err) => domain_err.into(),
            ServiceError::Authentication(msg) => Self::new(ErrorCode::AuthenticationFailed, &msg),
            ServiceError::PermissionDenied(msg) => Self::new(ErrorCode::PermissionDenied, &msg),
            ServiceError::GatewayUnavailable(msg) => Self::new(ErrorCode::GatewayUnavailable, &msg),
            ServiceError::PaymentRejected(msg) => Self::new(ErrorCode::PaymentRejected, &msg),
            ServiceError::InvalidCallback(msg) => Self::new(ErrorCode::InvalidCallback, &msg),
            ServiceError::Timeout(msg) => Self::new(ErrorCode::Timeout, &msg),
            ServiceError::BackendRejected { status, message } => Self::with_details(
                ErrorCode::BackendRejected,
                &message,
                serde_json::json!({ "status": status }),
            ),
            ServiceError::Network(msg) => Self::new(ErrorCode::NetworkError, &msg),
            ServiceError::Configuration(msg) => Self::new(ErrorCode::ConfigurationError, &msg),
            ServiceError::ExternalService(msg) => Self::new(ErrorCode::ExternalServiceError, &msg),
        }
    }
}

impl From<std::ffi::NulError> for FFIError {
    fn from(_: std::ffi::NulError) -> Self {
        Self::new(ErrorCode::InvalidUtf8, "String contains null bytes, cannot create CString")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_survives_boundary() {
        let err: FFIError = ServiceError::BackendRejected {
            status: 422,
            message: "Refund amount exceeds donation amount".to_string(),
        }.into();
        assert_eq!(err.code, ErrorCode::BackendRejected);
        assert_eq!(err.message, "Refund amount exceeds donation amount");
        assert_eq!(err.details.as_deref(), Some(r#"{"status":422}"#));
    }

    #[test]
    fn test_denial_and_rejection_have_distinct_codes() {
        let denied: FFIError = ServiceError::PermissionDenied("admin only".to_string()).into();
        assert_eq!(denied.code as i32, 305);
        let invalid: FFIError = ServiceError::InvalidCallback("no reference".to_string()).into();
        assert_eq!(invalid.code as i32, 402);
    }

    #[test]
    fn test_validation_details_name_the_field() {
        let err: FFIError = ServiceError::from(ValidationError::required("donorEmail")).into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details: serde_json::Value = serde_json::from_str(err.details.as_deref().unwrap()).unwrap();
        assert_eq!(details["field"], "donorEmail");
    }
}
