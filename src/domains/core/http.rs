use std::time::Duration;
use log::debug;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use crate::errors::ServiceError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport-level failure, before it is given a domain meaning
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The remote host could not be reached
    Unreachable(String),
    /// The transport gave up waiting for a response
    TimedOut(String),
    /// The remote answered with a non-success status
    Status { status: u16, message: String },
    /// The response body did not match the expected shape
    Decode(String),
}

impl From<TransportError> for ServiceError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unreachable(msg) => ServiceError::Network(msg),
            TransportError::TimedOut(msg) => ServiceError::Timeout(msg),
            TransportError::Status { status, message } => ServiceError::BackendRejected { status, message },
            TransportError::Decode(msg) => ServiceError::ExternalService(msg),
        }
    }
}

/// JSON client for the backend API gateway
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
            .build()
            .map_err(|e| ServiceError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<R>(&self, path: &str, bearer: Option<&str>) -> Result<R, TransportError>
    where
        R: DeserializeOwned,
    {
        let request = self.request(Method::GET, path, bearer);
        self.send(request, path).await
    }

    pub async fn post_json<B, R>(&self, path: &str, body: &B, bearer: Option<&str>) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::POST, path, bearer).json(body);
        self.send(request, path).await
    }

    pub async fn put_json<B, R>(&self, path: &str, body: &B, bearer: Option<&str>) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path, bearer).json(body);
        self.send(request, path).await
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<R>(&self, request: RequestBuilder, path: &str) -> Result<R, TransportError>
    where
        R: DeserializeOwned,
    {
        debug!("Backend call: {}", path);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::TimedOut(format!("{} did not respond in time", path))
            } else {
                TransportError::Unreachable(format!("Failed to reach {}: {}", path, e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Decode(format!("Failed to read response from {}: {}", path, e)))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: extract_error_message(&body, status.as_u16()),
            });
        }

        decode_body(&body)
            .map_err(|e| TransportError::Decode(format!("Unexpected response from {}: {}", path, e)))
    }
}

/// Decode a JSON body; an empty body decodes as `null`
pub fn decode_body<R: DeserializeOwned>(body: &str) -> Result<R, serde_json::Error> {
    if body.trim().is_empty() {
        serde_json::from_str("null")
    } else {
        serde_json::from_str(body)
    }
}

/// Pull the backend's own error text out of an error body, verbatim
pub fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            value.get("message"),
            value.get("error").and_then(|e| e.get("message")),
            value.get("error"),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(text) = candidate.as_str() {
                if !text.trim().is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("Request failed with status {}", status)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiAck;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new("https://api.example.org/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/payment/config"), "https://api.example.org/api/payment/config");
        assert_eq!(client.url("admin/users/u1/promote"), "https://api.example.org/api/admin/users/u1/promote");
    }

    #[test]
    fn test_error_message_is_verbatim() {
        assert_eq!(
            extract_error_message(r#"{"message":"Campaign already approved"}"#, 409),
            "Campaign already approved"
        );
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"No such checkout session"}}"#, 404),
            "No such checkout session"
        );
        assert_eq!(extract_error_message(r#"{"error":"Forbidden"}"#, 403), "Forbidden");
        assert_eq!(extract_error_message("Bad Gateway", 502), "Bad Gateway");
        assert_eq!(extract_error_message("", 500), "Request failed with status 500");
    }

    #[test]
    fn test_empty_body_decodes_as_none() {
        let ack: Option<ApiAck> = decode_body("").unwrap();
        assert!(ack.is_none());
        let ack: Option<ApiAck> = decode_body(r#"{"success":true}"#).unwrap();
        assert_eq!(ack.and_then(|a| a.success), Some(true));
    }

    #[test]
    fn test_status_maps_to_backend_rejection() {
        let err: ServiceError = TransportError::Status { status: 400, message: "nope".to_string() }.into();
        assert!(matches!(err, ServiceError::BackendRejected { status: 400, .. }));
    }
}
