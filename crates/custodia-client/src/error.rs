use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of API errors for consistent error handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Network or transport failure, no response received
    Transport,
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Failed to parse a response body
    Parse,
    /// Authentication exhausted: the refresh policy concluded in rejection
    AuthExpired,
    /// Rejected before any request was sent (e.g. missing recipient address)
    Validation,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::AuthExpired => write!(f, "auth_expired"),
            ApiErrorKind::Validation => write!(f, "validation"),
        }
    }
}

/// Structured error with kind and details.
///
/// Kept `Clone` (message strings only, no source chain) so a single failed
/// fetch can be fanned out to every caller sharing it through the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates a transport error from a reqwest failure.
    pub fn transport(err: &reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Transport, err.to_string())
    }

    /// Creates an HTTP status error, mining the backend-supplied message
    /// from an `error` or `message` field when the body carries one.
    pub fn http_status(status: u16, body: &str) -> Self {
        let fallback = format!("HTTP {status}");
        if body.is_empty() {
            return Self::new(ApiErrorKind::HttpStatus, fallback);
        }
        if let Ok(json) = serde_json::from_str::<Value>(body)
            && let Some(msg) = json
                .get("error")
                .or_else(|| json.get("message"))
                .and_then(|v| v.as_str())
        {
            return Self {
                kind: ApiErrorKind::HttpStatus,
                message: format!("HTTP {status}: {msg}"),
                details: Some(body.to_string()),
            };
        }
        Self {
            kind: ApiErrorKind::HttpStatus,
            message: fallback,
            details: Some(body.to_string()),
        }
    }

    /// Creates a transport-class error for a fetch abandoned mid-flight.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    /// Creates an authentication-exhausted error.
    pub fn auth_expired(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::AuthExpired, message)
    }

    /// Creates a pre-flight validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
