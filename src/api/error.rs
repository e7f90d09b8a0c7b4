//! API Error Types
//!
//! Errors produced while talking to the clinic backend, and their
//! classification into the failure kinds pages react to.

use reqwest::Method;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the clinic backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend could not be reached (DNS, refused connection, ...)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The request did not complete before its deadline
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Transport-level failure not covered by the other variants
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status
    #[error("API error {status} on {method} {url}: {message}")]
    Status {
        status: u16,
        message: String,
        url: String,
        method: Method,
    },

    /// The response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// The caller asked for something the client refuses to send
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A transport failure tagged with the request it interrupted
    #[error("{method} {url}: {source}")]
    Transport {
        method: Method,
        url: String,
        source: Box<ApiError>,
    },
}

/// Failure classes a page distinguishes when reporting an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connectivity failure or unexpected server status
    Network,
    /// Rejected before reaching the network
    Validation,
    /// Business-rule rejection from the backend (4xx)
    Rejected,
    /// Explicit deadline elapsed
    Timeout,
}

impl ApiError {
    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Transport { source, .. } => source.kind(),
            ApiError::Timeout(_) => FailureKind::Timeout,
            ApiError::InvalidRequest(_) => FailureKind::Validation,
            ApiError::Status { status, .. } if (400..500).contains(status) => {
                FailureKind::Rejected
            }
            ApiError::Request(e) if e.is_timeout() => FailureKind::Timeout,
            _ => FailureKind::Network,
        }
    }

    /// HTTP status, if the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            ApiError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Message from the backend body, if it sent one
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }

    /// Whether this is a server-side failure (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(s) if s >= 500)
    }

    /// Method and URL of the failed request, when known
    pub fn endpoint(&self) -> Option<(&Method, &str)> {
        match self {
            ApiError::Status { method, url, .. } | ApiError::Transport { method, url, .. } => {
                Some((method, url.as_str()))
            }
            _ => None,
        }
    }

    /// Attach the request to a transport failure
    pub(crate) fn during(self, method: &Method, url: &str) -> Self {
        match self {
            ApiError::Timeout(_) | ApiError::Unavailable(_) | ApiError::Request(_) => {
                ApiError::Transport {
                    method: method.clone(),
                    url: url.to_string(),
                    source: Box::new(self),
                }
            }
            other => other,
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout_ms)
        } else if err.is_connect() {
            ApiError::Unavailable(err.to_string())
        } else {
            ApiError::Request(err)
        }
    }
}

/// Error body shapes the backend uses
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Pull a human message out of a raw error body
    pub(crate) fn extract(raw: &str) -> String {
        match serde_json::from_str::<ErrorBody>(raw) {
            Ok(body) => body
                .message
                .or(body.error)
                .unwrap_or_else(|| raw.trim().to_string()),
            Err(_) => raw.trim().to_string(),
        }
    }
}

/// Result type for backend calls
pub type ApiResult<T> = Result<T, ApiError>;
