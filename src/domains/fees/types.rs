use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inclusive bounds a donation amount must fall within
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountLimits {
    pub min: Decimal,
    pub max: Decimal,
}

impl AmountLimits {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }
}

/// Body of `POST /payment/calculate-fees`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

/// Fee figures as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    #[serde(with = "rust_decimal::serde::float")]
    pub processing_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub platform_fee_percentage: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
}

/// Fee breakdown for one candidate amount. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub donation_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub processing_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub platform_fee_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub currency: String,
}

impl FeeBreakdown {
    /// The total is always `donation_amount + processing_fee`, whatever the
    /// backend reported.
    pub fn from_quote(donation_amount: Decimal, currency: &str, quote: FeeQuote) -> Self {
        let total_amount = donation_amount + quote.processing_fee;
        if let Some(reported) = quote.total_amount {
            if reported != total_amount {
                log::warn!(
                    "Backend fee total {} differs from amount + processing fee {}",
                    reported,
                    total_amount
                );
            }
        }

        Self {
            donation_amount,
            processing_fee: quote.processing_fee,
            platform_fee_percentage: quote.platform_fee_percentage,
            total_amount,
            currency: currency.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_is_additive() {
        let quote = FeeQuote {
            processing_fee: dec!(2.45),
            platform_fee_percentage: dec!(5),
            total_amount: Some(dec!(999)),
        };
        let breakdown = FeeBreakdown::from_quote(dec!(50), "MYR", quote);
        assert_eq!(breakdown.total_amount, dec!(52.45));
        assert_eq!(breakdown.total_amount, breakdown.donation_amount + breakdown.processing_fee);
    }

    #[test]
    fn test_quote_parses_numbers() {
        let quote: FeeQuote =
            serde_json::from_str(r#"{"processingFee":3.2,"platformFeePercentage":5}"#).unwrap();
        assert_eq!(quote.processing_fee, dec!(3.2));
        assert_eq!(quote.total_amount, None);
    }
}
