//! Error types for the M4300 client
//!
//! Every public API returns `Result<T, Error>`. Each variant belongs to exactly
//! one [`FailureKind`], which is what callers should match on when deciding how
//! to react (re-prompt for credentials, back off, give up).

use crate::types::Method;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Missing or malformed input, detected before any network call
    Validation,
    /// Login rejected by the device
    InvalidCredentials,
    /// Token went stale or the device answered 401 on an authenticated call
    TokenExpired,
    /// Timeout or connection failure
    Transport,
    /// HTTP 429 from the device
    RateLimit,
    /// Body was not the JSON envelope we expected
    MalformedResponse,
    /// Any other non-2xx status or `status: "failure"` envelope
    Api,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Validation => "validation",
            FailureKind::InvalidCredentials => "invalid-credentials",
            FailureKind::TokenExpired => "token-expired",
            FailureKind::Transport => "transport",
            FailureKind::RateLimit => "rate-limit",
            FailureKind::MalformedResponse => "malformed-response",
            FailureKind::Api => "api",
        };
        f.write_str(name)
    }
}

/// The main error type for the M4300 client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Validation / Configuration Errors
    // ============================================================================
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Login rejected: {message}")]
    InvalidCredentials {
        status: Option<u16>,
        message: String,
    },

    #[error("Authentication token expired on {method} {endpoint}")]
    TokenExpired { method: Method, endpoint: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("{method} {endpoint} timed out after {timeout_ms}ms")]
    Timeout {
        method: Method,
        endpoint: String,
        timeout_ms: u64,
    },

    #[error("Connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    #[error("{method} {endpoint} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        method: Method,
        endpoint: String,
        attempts: u32,
        status: Option<u16>,
        last_error: String,
        cause: FailureKind,
    },

    #[error("{method} {endpoint} rate limited by device, gave up after {attempts} attempts")]
    RateLimited {
        method: Method,
        endpoint: String,
        attempts: u32,
    },

    // ============================================================================
    // Response Errors
    // ============================================================================
    #[error("Malformed response from {endpoint}: {message}")]
    MalformedResponse {
        endpoint: String,
        message: String,
        body: Option<String>,
    },

    #[error("{method} {endpoint} failed{}: {message}", fmt_status(.status))]
    Api {
        method: Method,
        endpoint: String,
        status: Option<u16>,
        code: Option<i64>,
        message: String,
        body: Option<Value>,
    },

    // ============================================================================
    // Stateless Calls
    // ============================================================================
    /// Failure after the engine logged in again on the caller's behalf.
    /// The caller's old token is dead; `token` replaces it.
    #[error("{source}")]
    TokenRenewed {
        token: String,
        #[source]
        source: Box<Error>,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" with HTTP {s}")).unwrap_or_default()
}

impl Error {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        body: Option<String>,
    ) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            message: message.into(),
            body,
        }
    }

    /// Failure kind this error belongs to
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Validation { .. } | Error::Config { .. } | Error::YamlParse(_) | Error::Io(_) => {
                FailureKind::Validation
            }
            Error::InvalidCredentials { .. } => FailureKind::InvalidCredentials,
            Error::TokenExpired { .. } => FailureKind::TokenExpired,
            Error::Timeout { .. } | Error::Connection { .. } => FailureKind::Transport,
            Error::RetriesExhausted { cause, .. } => *cause,
            Error::RateLimited { .. } => FailureKind::RateLimit,
            Error::MalformedResponse { .. } => FailureKind::MalformedResponse,
            Error::Api { .. } => FailureKind::Api,
            Error::TokenRenewed { source, .. } => source.kind(),
        }
    }

    /// HTTP status associated with this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::InvalidCredentials { status, .. }
            | Error::RetriesExhausted { status, .. }
            | Error::Api { status, .. } => *status,
            Error::TokenExpired { .. } => Some(401),
            Error::RateLimited { .. } => Some(429),
            Error::TokenRenewed { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Server-supplied `respMsg`, or the message we built ourselves
    pub fn message(&self) -> String {
        match self {
            Error::Api { message, .. }
            | Error::InvalidCredentials { message, .. }
            | Error::MalformedResponse { message, .. } => message.clone(),
            Error::TokenRenewed { source, .. } => source.message(),
            other => other.to_string(),
        }
    }

    /// Check if the condition behind this error could clear up on a resend
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout { .. } | Error::Connection { .. } | Error::RateLimited { .. } => true,
            Error::Api {
                status: Some(status),
                ..
            } => is_retryable_status(*status),
            Error::TokenRenewed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Whether the retry budget was used up
    pub fn is_retries_exhausted(&self) -> bool {
        match self {
            Error::RetriesExhausted { .. } | Error::RateLimited { .. } => true,
            Error::TokenRenewed { source, .. } => source.is_retries_exhausted(),
            _ => false,
        }
    }

    /// Token obtained by a re-login during a call that still failed
    pub fn renewed_token(&self) -> Option<&str> {
        match self {
            Error::TokenRenewed { token, .. } => Some(token),
            _ => None,
        }
    }
}

/// HTTP statuses that are retried with backoff
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the M4300 client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Config {
                message: format!("{}: {}", message.into(), inner),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("host", "must not be empty");
        assert_eq!(err.to_string(), "Invalid value for 'host': must not be empty");

        let err = Error::Api {
            method: Method::GET,
            endpoint: "device_info".to_string(),
            status: Some(404),
            code: None,
            message: "Not found".to_string(),
            body: None,
        };
        assert_eq!(err.to_string(), "GET device_info failed with HTTP 404: Not found");

        let err = Error::Api {
            method: Method::POST,
            endpoint: "swcfg_vlan".to_string(),
            status: None,
            code: Some(400),
            message: "Invalid VLAN ID".to_string(),
            body: None,
        };
        assert_eq!(err.to_string(), "POST swcfg_vlan failed: Invalid VLAN ID");
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            Error::validation("port", "out of range").kind(),
            FailureKind::Validation
        );
        assert_eq!(
            Error::InvalidCredentials {
                status: Some(401),
                message: "bad".into()
            }
            .kind(),
            FailureKind::InvalidCredentials
        );
        assert_eq!(
            Error::TokenExpired {
                method: Method::GET,
                endpoint: "device_info".into()
            }
            .kind(),
            FailureKind::TokenExpired
        );
        assert_eq!(
            Error::RetriesExhausted {
                method: Method::GET,
                endpoint: "device_info".into(),
                attempts: 3,
                status: None,
                last_error: "timed out".into(),
                cause: FailureKind::Transport,
            }
            .kind(),
            FailureKind::Transport
        );
        assert_eq!(
            Error::malformed("login", "not JSON", None).kind(),
            FailureKind::MalformedResponse
        );
    }

    #[test]
    fn test_is_retryable() {
        let api = |status| Error::Api {
            method: Method::GET,
            endpoint: "x".into(),
            status: Some(status),
            code: None,
            message: String::new(),
            body: None,
        };
        assert!(api(408).is_retryable());
        assert!(api(429).is_retryable());
        assert!(api(503).is_retryable());

        assert!(!api(400).is_retryable());
        assert!(!api(401).is_retryable());
        assert!(!api(404).is_retryable());
        assert!(!Error::config("test").is_retryable());
        assert!(!Error::malformed("login", "bad", None).is_retryable());
    }

    #[test]
    fn test_status_helper() {
        let err = Error::RateLimited {
            method: Method::GET,
            endpoint: "device_info".into(),
            attempts: 3,
        };
        assert_eq!(err.status(), Some(429));
        assert!(err.is_retries_exhausted());
        assert_eq!(Error::validation("host", "empty").status(), None);
    }

    #[test]
    fn test_renewed_token_wraps_failure() {
        let inner = Error::Api {
            method: Method::GET,
            endpoint: "device_info".into(),
            status: Some(404),
            code: None,
            message: "Not Found".into(),
            body: None,
        };
        let shown = inner.to_string();
        let err = Error::TokenRenewed {
            token: "fresh".into(),
            source: Box::new(inner),
        };

        assert_eq!(err.to_string(), shown);
        assert_eq!(err.kind(), FailureKind::Api);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.message(), "Not Found");
        assert_eq!(err.renewed_token(), Some("fresh"));
        assert_eq!(Error::config("x").renewed_token(), None);
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
