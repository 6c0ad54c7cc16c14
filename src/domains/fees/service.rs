use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};
use crate::auth::AuthContext;
use crate::domains::core::with_timeout;
use crate::domains::fees::types::{AmountLimits, FeeBreakdown, FeeRequest};
use crate::domains::payment::repository::PaymentRepository;
use crate::errors::{DomainError, DomainResult, ServiceResult, ValidationError};

/// Check a candidate donation amount against the configured bounds
pub fn validate_amount(amount: Decimal, limits: &AmountLimits) -> DomainResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::InvalidAmount(
            "Donation amount must be greater than zero".to_string(),
        ));
    }
    if amount < limits.min || amount > limits.max {
        return Err(DomainError::InvalidAmount(format!(
            "Donation amount must be between {} and {}",
            limits.min.normalize(),
            limits.max.normalize()
        )));
    }
    Ok(amount)
}

/// Parse an amount typed by the donor
pub fn parse_amount(raw: &str) -> DomainResult<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidAmount("Donation amount is required".to_string()));
    }
    Decimal::from_str(trimmed)
        .map_err(|_| DomainError::InvalidAmount(format!("'{}' is not a valid amount", trimmed)))
}

/// Convert a host-side floating point amount, rejecting NaN and infinities
pub fn amount_from_f64(value: f64) -> DomainResult<Decimal> {
    if !value.is_finite() {
        return Err(DomainError::InvalidAmount("Donation amount must be a finite number".to_string()));
    }
    Decimal::try_from(value)
        .map_err(|_| DomainError::InvalidAmount(format!("{} cannot be represented as an amount", value)))
}

/// Two-decimal display with thousands separators, rounding half away from zero
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{} {}{}.{}", currency, sign, grouped, fraction)
}

/// Validates amounts and obtains fee breakdowns from the backend
pub struct FeeSchedule {
    repo: Arc<dyn PaymentRepository>,
    limits: AmountLimits,
    currency: String,
    timeout: Duration,
}

impl FeeSchedule {
    pub fn new(repo: Arc<dyn PaymentRepository>, limits: AmountLimits, currency: &str, timeout: Duration) -> Self {
        Self {
            repo,
            limits,
            currency: currency.to_string(),
            timeout,
        }
    }

    pub fn limits(&self) -> &AmountLimits {
        &self.limits
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn validate(&self, amount: Decimal) -> DomainResult<Decimal> {
        validate_amount(amount, &self.limits)
    }

    /// Side-effect free: the same (amount, currency) always yields the same
    /// breakdown for an unchanged backend configuration.
    pub async fn compute_fees(&self, amount: Decimal, currency: &str, auth: &AuthContext) -> ServiceResult<FeeBreakdown> {
        self.validate(amount)?;
        if currency != self.currency {
            return Err(ValidationError::invalid_value(
                "currency",
                &format!("only {} is supported", self.currency),
            ).into());
        }

        let request = FeeRequest {
            amount,
            currency: currency.to_string(),
        };
        let quote = with_timeout(
            self.timeout,
            "Fee calculation",
            self.repo.calculate_fees(&request, auth),
        ).await?;

        Ok(FeeBreakdown::from_quote(amount, currency, quote))
    }
}

/// Per-flow fee quoting: last write wins. A quote that returns after a newer
/// amount was requested is dropped. The cache holds the latest amount only.
pub struct FeeTracker {
    schedule: Arc<FeeSchedule>,
    generation: AtomicU64,
    requested: Mutex<Option<Decimal>>,
    latest: Mutex<Option<FeeBreakdown>>,
}

impl FeeTracker {
    pub fn new(schedule: Arc<FeeSchedule>) -> Self {
        Self {
            schedule,
            generation: AtomicU64::new(0),
            requested: Mutex::new(None),
            latest: Mutex::new(None),
        }
    }

    /// Quote fees for `amount`. `Ok(None)` means a newer request superseded
    /// this one and its result was discarded.
    pub async fn quote(&self, amount: Decimal, auth: &AuthContext) -> ServiceResult<Option<FeeBreakdown>> {
        if let Some(cached) = self.cached_for(amount) {
            return Ok(Some(cached));
        }

        let ticket = self.invalidate();
        *self.requested.lock().unwrap_or_else(|e| e.into_inner()) = Some(amount);
        let result = self
            .schedule
            .compute_fees(amount, self.schedule.currency(), auth)
            .await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!("Discarding stale fee quote for {}", amount);
            return Ok(None);
        }

        let breakdown = result?;
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(breakdown.clone());
        Ok(Some(breakdown))
    }

    /// The breakdown for the most recent amount, if it has arrived
    pub fn latest(&self) -> Option<FeeBreakdown> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drop the cached breakdown and any quote still in flight
    pub fn invalidate(&self) -> u64 {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.requested.lock().unwrap_or_else(|e| e.into_inner()) = None;
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = None;
        ticket
    }

    /// Keep only what belongs to `amount`: a cached breakdown or an
    /// in-flight quote for any other amount is dropped.
    pub fn align_to(&self, amount: Decimal) {
        let requested = *self.requested.lock().unwrap_or_else(|e| e.into_inner());
        if requested.is_some_and(|r| r != amount) {
            debug!("Fee quote for {:?} no longer matches amount {}", requested, amount);
            self.invalidate();
        }
    }

    fn cached_for(&self, amount: Decimal) -> Option<FeeBreakdown> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|b| b.donation_amount == amount)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::payment::repository::MockPaymentRepository;
    use crate::errors::ServiceError;
    use crate::types::UserRole;
    use rust_decimal_macros::dec;

    fn limits() -> AmountLimits {
        AmountLimits::new(dec!(5), dec!(100000))
    }

    fn donor() -> AuthContext {
        AuthContext::new("donor-1", UserRole::User, true, Some("token".to_string()))
    }

    fn schedule(repo: Arc<MockPaymentRepository>) -> Arc<FeeSchedule> {
        Arc::new(FeeSchedule::new(repo, limits(), "MYR", Duration::from_secs(5)))
    }

    #[test]
    fn test_amount_bounds() {
        assert!(validate_amount(dec!(5), &limits()).is_ok());
        assert!(validate_amount(dec!(4.99), &limits()).is_err());
        assert!(validate_amount(dec!(100000), &limits()).is_ok());
        assert!(validate_amount(dec!(100000.01), &limits()).is_err());
        assert!(validate_amount(dec!(0), &limits()).is_err());
        assert!(validate_amount(dec!(-10), &limits()).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 50.25 ").unwrap(), dec!(50.25));
        assert!(matches!(parse_amount("abc"), Err(DomainError::InvalidAmount(_))));
        assert!(matches!(parse_amount(""), Err(DomainError::InvalidAmount(_))));
    }

    #[test]
    fn test_non_finite_amounts_rejected() {
        assert!(amount_from_f64(f64::NAN).is_err());
        assert!(amount_from_f64(f64::INFINITY).is_err());
        assert_eq!(amount_from_f64(50.0).unwrap(), dec!(50));
    }

    #[test]
    fn test_format_rounds_instead_of_truncating() {
        assert_eq!(format_amount(dec!(1234.565), "MYR"), "MYR 1,234.57");
        assert_eq!(format_amount(dec!(10.004), "MYR"), "MYR 10.00");
        assert_eq!(format_amount(dec!(999999.999), "MYR"), "MYR 1,000,000.00");
        assert_eq!(format_amount(dec!(5), "MYR"), "MYR 5.00");
        assert_eq!(format_amount(dec!(100), "MYR"), "MYR 100.00");
    }

    #[tokio::test]
    async fn test_invalid_amount_never_reaches_backend() {
        let repo = Arc::new(MockPaymentRepository::new());
        let fees = schedule(repo.clone());
        let err = fees.compute_fees(dec!(3), "MYR", &donor()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidAmount(_))));
        assert_eq!(repo.call_count("calculate_fees"), 0);
    }

    #[tokio::test]
    async fn test_unsupported_currency_rejected_locally() {
        let repo = Arc::new(MockPaymentRepository::new());
        let fees = schedule(repo.clone());
        assert!(fees.compute_fees(dec!(100), "USD", &donor()).await.is_err());
        assert_eq!(repo.call_count("calculate_fees"), 0);
    }

    #[tokio::test]
    async fn test_fee_computation_is_idempotent() {
        let repo = Arc::new(MockPaymentRepository::new());
        let fees = schedule(repo);
        let first = fees.compute_fees(dec!(100), "MYR", &donor()).await.unwrap();
        let second = fees.compute_fees(dec!(100), "MYR", &donor()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total_amount, first.donation_amount + first.processing_fee);
    }

    #[tokio::test]
    async fn test_tracker_discards_stale_quote() {
        let repo = Arc::new(MockPaymentRepository::new());
        repo.delay_fees_for(dec!(50), Duration::from_millis(200));
        let tracker = FeeTracker::new(schedule(repo.clone()));
        let auth = donor();

        let slow = tracker.quote(dec!(50), &auth);
        let fast = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tracker.quote(dec!(80), &auth).await
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(slow.unwrap(), None);
        assert_eq!(fast.unwrap().unwrap().donation_amount, dec!(80));
        assert_eq!(tracker.latest().unwrap().donation_amount, dec!(80));
    }

    #[tokio::test]
    async fn test_tracker_reuses_cache_for_same_amount() {
        let repo = Arc::new(MockPaymentRepository::new());
        let tracker = FeeTracker::new(schedule(repo.clone()));
        let auth = donor();

        tracker.quote(dec!(100), &auth).await.unwrap();
        tracker.quote(dec!(100), &auth).await.unwrap();
        assert_eq!(repo.call_count("calculate_fees"), 1);

        tracker.quote(dec!(120), &auth).await.unwrap();
        assert_eq!(repo.call_count("calculate_fees"), 2);
    }

    #[tokio::test]
    async fn test_align_drops_breakdown_for_other_amount() {
        let repo = Arc::new(MockPaymentRepository::new());
        let tracker = FeeTracker::new(schedule(repo));
        let auth = donor();

        tracker.quote(dec!(50), &auth).await.unwrap();
        tracker.align_to(dec!(50));
        assert_eq!(tracker.latest().unwrap().donation_amount, dec!(50));

        tracker.align_to(dec!(60));
        assert!(tracker.latest().is_none());
    }

    #[tokio::test]
    async fn test_align_discards_quote_in_flight_for_other_amount() {
        let repo = Arc::new(MockPaymentRepository::new());
        repo.delay_fees_for(dec!(50), Duration::from_millis(100));
        let tracker = FeeTracker::new(schedule(repo));
        let auth = donor();

        let pending = tracker.quote(dec!(50), &auth);
        let change = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tracker.align_to(dec!(60));
        };
        let (pending, _) = tokio::join!(pending, change);

        assert_eq!(pending.unwrap(), None);
        assert!(tracker.latest().is_none());
    }
}
