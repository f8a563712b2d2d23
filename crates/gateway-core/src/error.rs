//! Error types for the gateway client.
//!
//! Every failure a caller can observe from `send` is one of these variants.
//! Each variant carries only the fields relevant to it, so call sites can
//! match exhaustively without probing an untyped details bag.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Errors produced by the gateway client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Client construction failed (missing API key, bad URL, bad header).
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// The request was rejected before any network activity.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message naming the offending field and its valid range.
        message: String,
        /// The field that failed validation, when one applies.
        field: Option<String>,
    },

    /// The connection never produced an HTTP response.
    #[error("Network error: {message}")]
    Network {
        /// Error message from the underlying transport.
        message: String,
    },

    /// A single attempt exceeded its deadline.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// The per-attempt deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The upstream API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the provider, or a generic substitute.
        message: String,
        /// Provider error type (the `error.type` field), if supplied.
        provider_type: Option<String>,
        /// Raw error body, if it was JSON.
        details: Option<Value>,
    },

    /// The upstream response did not have the expected shape.
    #[error("Response format error: {message}")]
    ResponseFormat {
        /// Error message describing the structural problem.
        message: String,
        /// The offending payload, when available.
        details: Option<Value>,
    },

    /// Anything that fits no other category.
    #[error("Unknown error: {message}")]
    Unknown {
        /// Error message.
        message: String,
    },
}

/// Discriminant of [`GatewayError`], for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`GatewayError::Config`].
    Config,
    /// See [`GatewayError::Validation`].
    Validation,
    /// See [`GatewayError::Network`].
    Network,
    /// See [`GatewayError::Timeout`].
    Timeout,
    /// See [`GatewayError::Api`].
    Api,
    /// See [`GatewayError::ResponseFormat`].
    ResponseFormat,
    /// See [`GatewayError::Unknown`].
    Unknown,
}

impl ErrorKind {
    /// Stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Api => "api",
            Self::ResponseFormat => "response_format",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GatewayError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error without a specific field.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error for a named field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    #[must_use]
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create an API error with no provider type or details.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            provider_type: None,
            details: None,
        }
    }

    /// Create a response format error.
    pub fn response_format(message: impl Into<String>) -> Self {
        Self::ResponseFormat {
            message: message.into(),
            details: None,
        }
    }

    /// Create a response format error carrying the offending payload.
    pub fn response_format_with(message: impl Into<String>, details: Value) -> Self {
        Self::ResponseFormat {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create an unknown error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Variant discriminant.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Api { .. } => ErrorKind::Api,
            Self::ResponseFormat { .. } => ErrorKind::ResponseFormat,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Check if the error is worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        crate::classify::is_retryable(self)
    }

    /// Get the HTTP status code if available.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the provider error type if available.
    #[must_use]
    pub fn provider_type(&self) -> Option<&str> {
        match self {
            Self::Api { provider_type, .. } => provider_type.as_deref(),
            _ => None,
        }
    }

    /// Get the field that failed validation, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Get the raw details payload, if any.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Api { details, .. } | Self::ResponseFormat { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}
