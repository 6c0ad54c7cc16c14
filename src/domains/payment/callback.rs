use reqwest::Url;
use crate::domains::payment::types::PaymentReference;
use crate::errors::{ServiceError, ServiceResult};

const CALLBACK_BASE: &str = "app://payment-return/";

/// What the browser carried back from the hosted payment page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectCallback {
    /// The donor abandoned the hosted page
    Cancelled { session_id: Option<String> },
    /// The donor completed the hosted page; the outcome is still unknown
    Returned(PaymentReference),
}

impl RedirectCallback {
    /// Parse a full return URL or a bare query string (`?a=b` or `a=b`).
    ///
    /// `status=cancelled` wins over `session_id`, which wins over
    /// `payment_intent`. Empty values count as absent.
    pub fn parse(input: &str) -> ServiceResult<Self> {
        let url = parse_url(input.trim())?;

        let mut status = None;
        let mut session_id = None;
        let mut payment_intent = None;
        let mut payment_method = None;
        for (key, value) in url.query_pairs() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "status" => status = Some(value.to_string()),
                "session_id" => session_id = Some(value.to_string()),
                "payment_intent" => payment_intent = Some(value.to_string()),
                "payment_method" => payment_method = Some(value.to_string()),
                _ => {}
            }
        }

        if status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("cancelled")) {
            return Ok(RedirectCallback::Cancelled { session_id });
        }
        if let Some(id) = session_id {
            return Ok(RedirectCallback::Returned(PaymentReference::CheckoutSession(id)));
        }
        if let Some(intent_id) = payment_intent {
            return Ok(RedirectCallback::Returned(PaymentReference::PaymentIntent {
                intent_id,
                payment_method_id: payment_method,
            }));
        }

        Err(ServiceError::InvalidCallback(
            "Return URL carries no session_id, payment_intent or cancellation status".to_string(),
        ))
    }
}

fn parse_url(input: &str) -> ServiceResult<Url> {
    if input.contains("://") {
        return Url::parse(input)
            .map_err(|e| ServiceError::InvalidCallback(format!("Malformed return URL: {}", e)));
    }
    let query = input.trim_start_matches('?');
    Url::parse(&format!("{}?{}", CALLBACK_BASE, query))
        .map_err(|e| ServiceError::InvalidCallback(format!("Malformed return query: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_return() {
        let callback = RedirectCallback::parse("https://give.example.org/payment/success?session_id=cs_test_1").unwrap();
        assert_eq!(
            callback,
            RedirectCallback::Returned(PaymentReference::CheckoutSession("cs_test_1".to_string()))
        );
    }

    #[test]
    fn test_intent_return_from_bare_query() {
        let callback = RedirectCallback::parse("?payment_intent=pi_9&payment_method=pm_2").unwrap();
        assert_eq!(
            callback,
            RedirectCallback::Returned(PaymentReference::PaymentIntent {
                intent_id: "pi_9".to_string(),
                payment_method_id: Some("pm_2".to_string()),
            })
        );
    }

    #[test]
    fn test_cancel_wins_over_session() {
        let callback = RedirectCallback::parse("status=cancelled&session_id=cs_1").unwrap();
        assert_eq!(
            callback,
            RedirectCallback::Cancelled {
                session_id: Some("cs_1".to_string())
            }
        );
    }

    #[test]
    fn test_session_wins_over_intent() {
        let callback = RedirectCallback::parse("payment_intent=pi_1&session_id=cs_1").unwrap();
        assert!(matches!(
            callback,
            RedirectCallback::Returned(PaymentReference::CheckoutSession(ref id)) if id == "cs_1"
        ));
    }

    #[test]
    fn test_missing_reference_is_invalid() {
        for input in ["", "?", "https://give.example.org/payment/success", "session_id=&foo=bar", "status=paid"] {
            assert!(
                matches!(RedirectCallback::parse(input), Err(ServiceError::InvalidCallback(_))),
                "input {:?} should be rejected",
                input
            );
        }
    }
}
