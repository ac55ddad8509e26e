//! API error types

use thiserror::Error;

/// Backend call error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn unauthorized() -> Self {
        Self::new(ApiErrorKind::Unauthorized, "Unauthorized").with_status(401)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message).with_status(404)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::ServerError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidRequest, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    /// Classify a non-success response. The body text, when present, is the
    /// message shown to the user.
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 401 {
            return Self::unauthorized();
        }
        let body = body.trim();
        let message = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            body.to_string()
        };
        let error = match status {
            404 => Self::not_found(message),
            400..=499 => Self::invalid_request(message),
            500..=599 => Self::server_error(message),
            _ => Self::new(ApiErrorKind::Unknown, message),
        };
        error.with_status(status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::decode(format!("Unexpected response: {e}"))
        } else if e.is_builder() {
            ApiError::invalid_request(e.to_string())
        } else {
            ApiError::network(e.to_string())
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection refused, reset, DNS
    Network,
    /// 401: the shared password is missing or wrong
    Unauthorized,
    /// 404
    NotFound,
    /// Other 4xx
    InvalidRequest,
    /// 5xx
    ServerError,
    /// Response body did not match the expected shape
    Decode,
    /// Unknown error
    Unknown,
}

impl ApiErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::ServerError)
    }
}
