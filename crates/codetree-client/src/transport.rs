//! HTTP transport abstraction
//!
//! The API client only needs "GET this URL and give me status, headers and
//! body"; everything host-specific lives above this seam.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised before any HTTP status was received
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Could not build the underlying HTTP client
    #[error("Failed to build HTTP client: {0}")]
    Setup(String),

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Request(String),
}

/// A received HTTP response with its body read to a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Reason phrase, e.g. "Not Found"
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A `200 OK` response
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, "OK", body)
    }

    pub fn with_status(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Performs HTTP GET requests
///
/// Non-2xx statuses are returned as `Ok` responses; `Err` means no response
/// was received at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::ok("{}").with_header("X-RateLimit-Remaining", "0");
        assert_eq!(response.header("x-ratelimit-remaining"), Some("0"));
        assert_eq!(response.header("etag"), None);
    }

    #[test]
    fn test_is_success() {
        assert!(HttpResponse::ok("").is_success());
        assert!(HttpResponse::with_status(206, "Partial Content", "").is_success());
        assert!(!HttpResponse::with_status(404, "Not Found", "").is_success());
    }
}
