use crate::errors::{ValidationError, DomainResult, DomainError};
use regex::Regex;
use std::sync::OnceLock;

/// A trait that entities should implement for validation.
pub trait Validate {
    /// Validates the entity and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

// Common regex patterns
fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
    })
}

fn currency_regex() -> &'static Regex {
    static CURRENCY_REGEX: OnceLock<Regex> = OnceLock::new();
    CURRENCY_REGEX.get_or_init(|| Regex::new(r"^[A-Z]{3}$").unwrap())
}

/// True if the string is a well-formed e-mail address
pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value.trim())
}

/// True if the string is an upper-case ISO 4217 style code
pub fn is_currency_code(value: &str) -> bool {
    currency_regex().is_match(value)
}

/// Struct for configuring validations in a fluent style
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            // Return the first error for simplicity
            Some(err) => Err(DomainError::Validation(err)),
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    /// Fails on a missing or whitespace-only value
    pub fn required(mut self) -> Self {
        let missing = self.value.as_ref().map_or(true, |v| v.trim().is_empty());
        if missing {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        if let Some(value) = &self.value {
            if value.chars().count() > max {
                self.errors.push(ValidationError::max_length(&self.field_name, max));
            }
        }
        self
    }

    pub fn matches_pattern(mut self, pattern: &Regex, message: &str) -> Self {
        if let Some(value) = &self.value {
            if !pattern.is_match(value.trim()) {
                self.errors.push(ValidationError::format(&self.field_name, message));
            }
        }
        self
    }

    pub fn email(self) -> Self {
        self.matches_pattern(email_regex(), "must be a valid email address")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("donor@example.com"));
        assert!(is_valid_email("first.last+tag@example.com.my"));
        assert!(!is_valid_email("donor@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("donor@example"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_currency_code() {
        assert!(is_currency_code("MYR"));
        assert!(!is_currency_code("myr"));
        assert!(!is_currency_code("RM"));
    }

    #[test]
    fn test_validation_builder() {
        let result = ValidationBuilder::new("donorName", Some("   ".to_string()))
            .required()
            .validate();
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::Required { .. }))
        ));

        let result = ValidationBuilder::new("message", Some("x".repeat(501)))
            .max_length(500)
            .validate();
        assert!(result.is_err());

        let result = ValidationBuilder::new("message", Some("é".repeat(500)))
            .max_length(500)
            .validate();
        assert!(result.is_ok());

        let result = ValidationBuilder::new("donorEmail", Some("invalid".to_string()))
            .required()
            .email()
            .validate();
        assert!(result.is_err());

        let value: Option<String> = None;
        let result = ValidationBuilder::new("donorEmail", value)
            .required()
            .validate();
        assert!(result.is_err());
    }
}
