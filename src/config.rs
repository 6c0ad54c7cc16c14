use std::time::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domains::fees::AmountLimits;
use crate::errors::ServiceError;
use crate::validation::is_currency_code;

pub const DEFAULT_CURRENCY: &str = "MYR";
pub const DEFAULT_SESSION_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the donation and moderation core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// Base URL of the backend API gateway, e.g. `https://api.example.org/api`
    pub api_base_url: String,
    /// Public URL of the web app; gateway callbacks are built from it
    pub app_base_url: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_donation: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_donation: Decimal,
    pub request_timeout_secs: u64,
    pub success_path: String,
    pub cancel_path: String,
    pub session_placeholder: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            app_base_url: "http://localhost:5173".to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            min_donation: Decimal::from(5),
            max_donation: Decimal::from(100_000),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            success_path: "/payment/success".to_string(),
            cancel_path: "/payment/cancel".to_string(),
            session_placeholder: DEFAULT_SESSION_PLACEHOLDER.to_string(),
        }
    }
}

impl CoreConfig {
    /// Load from `CROWDFUND_*` variables, reading `.env` first if present
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            api_base_url: env_or("CROWDFUND_API_BASE_URL", defaults.api_base_url),
            app_base_url: env_or("CROWDFUND_APP_BASE_URL", defaults.app_base_url),
            currency: env_or("CROWDFUND_CURRENCY", defaults.currency).to_uppercase(),
            min_donation: env_parse("CROWDFUND_MIN_DONATION", defaults.min_donation)?,
            max_donation: env_parse("CROWDFUND_MAX_DONATION", defaults.max_donation)?,
            request_timeout_secs: env_parse("CROWDFUND_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            success_path: env_or("CROWDFUND_SUCCESS_PATH", defaults.success_path),
            cancel_path: env_or("CROWDFUND_CANCEL_PATH", defaults.cancel_path),
            session_placeholder: defaults.session_placeholder,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ServiceError::Configuration("api_base_url is empty".to_string()));
        }
        if self.app_base_url.trim().is_empty() {
            return Err(ServiceError::Configuration("app_base_url is empty".to_string()));
        }
        if !is_currency_code(&self.currency) {
            return Err(ServiceError::Configuration(format!(
                "currency '{}' is not a three-letter code",
                self.currency
            )));
        }
        if self.min_donation <= Decimal::ZERO || self.min_donation > self.max_donation {
            return Err(ServiceError::Configuration(format!(
                "donation limits [{}, {}] are invalid",
                self.min_donation, self.max_donation
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ServiceError::Configuration("request timeout must be positive".to_string()));
        }
        if self.session_placeholder.is_empty() {
            return Err(ServiceError::Configuration("session placeholder is empty".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn limits(&self) -> AmountLimits {
        AmountLimits::new(self.min_donation, self.max_donation)
    }

    /// Success callback handed to the hosted checkout, still holding the placeholder
    pub fn success_url_template(&self) -> String {
        format!(
            "{}{}?session_id={}",
            self.app_base_url.trim_end_matches('/'),
            self.success_path,
            self.session_placeholder
        )
    }

    /// Cancel callback; it carries the session id as well as the cancelled marker
    pub fn cancel_url_template(&self) -> String {
        format!(
            "{}{}?status=cancelled&session_id={}",
            self.app_base_url.trim_end_matches('/'),
            self.cancel_path,
            self.session_placeholder
        )
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty()).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ServiceError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ServiceError::Configuration(format!("{} has an invalid value: {}", key, raw))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_are_valid() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.min_donation, dec!(5));
        assert_eq!(config.max_donation, dec!(100000));
    }

    #[test]
    fn test_inverted_limits_rejected() {
        let config = CoreConfig {
            min_donation: dec!(500),
            max_donation: dec!(10),
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServiceError::Configuration(_))));
    }

    #[test]
    fn test_callback_templates_carry_placeholder() {
        let config = CoreConfig {
            app_base_url: "https://give.example.org/".to_string(),
            ..CoreConfig::default()
        };
        assert_eq!(
            config.success_url_template(),
            "https://give.example.org/payment/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert!(config.cancel_url_template().contains("status=cancelled"));
        assert!(config.cancel_url_template().contains(DEFAULT_SESSION_PLACEHOLDER));
    }

    #[test]
    fn test_json_config_fills_defaults() {
        let config: CoreConfig =
            serde_json::from_str(r#"{"apiBaseUrl":"https://api.example.org","minDonation":10}"#).unwrap();
        assert_eq!(config.api_base_url, "https://api.example.org");
        assert_eq!(config.min_donation, dec!(10));
        assert_eq!(config.currency, "MYR");
    }
}
