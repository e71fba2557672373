//! Classified API failures

use thiserror::Error;

use crate::transport::{HttpResponse, TransportError};

/// Why a host API call failed
///
/// Every variant maps to one user-facing message; see
/// [`ApiError::to_message`](crate::messages).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No response at all (network down, DNS, TLS, API outage)
    #[error("Cannot connect to the host API: {0}")]
    Connection(String),

    /// The tree listing was truncated by the host
    #[error("Repository is too large to be retrieved at once")]
    TooLarge,

    /// 401
    #[error("Access token is invalid")]
    InvalidToken,

    /// 409
    #[error("Repository is empty")]
    EmptyRepository,

    /// 404, which hosts also return for private repositories
    #[error("Repository is private or does not exist")]
    PrivateRepository,

    /// 403 with the rate-limit budget exhausted
    #[error("API rate limit exceeded")]
    RateLimited,

    /// Any other 403
    #[error("Access to the API is forbidden")]
    Forbidden,

    /// Any other status
    #[error("Request failed with status {status}: {status_text}")]
    Unclassified { status: u16, status_text: String },

    /// A 2xx response whose body could not be decoded
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Classify a failed HTTP response
    pub fn from_response(response: &HttpResponse) -> Self {
        let rate_limited = response
            .header("x-ratelimit-remaining")
            .is_some_and(|remaining| remaining.trim() == "0");

        match response.status {
            0 => ApiError::Connection(response.status_text.clone()),
            206 => ApiError::TooLarge,
            401 => ApiError::InvalidToken,
            404 => ApiError::PrivateRepository,
            409 => ApiError::EmptyRepository,
            403 if rate_limited => ApiError::RateLimited,
            403 => ApiError::Forbidden,
            status => ApiError::Unclassified {
                status,
                status_text: response.status_text.clone(),
            },
        }
    }

    /// Whether supplying an access token would plausibly fix the failure
    pub fn need_auth(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidToken
                | ApiError::PrivateRepository
                | ApiError::RateLimited
                | ApiError::Forbidden
        )
    }

    /// HTTP status the error stands for (0 when no response was received)
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Connection(_) => 0,
            ApiError::TooLarge => 206,
            ApiError::InvalidToken => 401,
            ApiError::EmptyRepository => 409,
            ApiError::PrivateRepository => 404,
            ApiError::RateLimited | ApiError::Forbidden => 403,
            ApiError::Unclassified { status, .. } => *status,
            ApiError::InvalidResponse(_) => 200,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Connection(err.to_string())
    }
}
