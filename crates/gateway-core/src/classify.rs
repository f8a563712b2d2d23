//! Failure classification.
//!
//! Transports report what went wrong as a [`TransportFailure`]; this module
//! turns that into a [`GatewayError`] and owns the one table deciding which
//! errors are worth another attempt.

use crate::error::GatewayError;
use serde_json::Value;
use std::time::Duration;

/// A raw failure raised by a single transport attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// The request never reached the server (DNS, refused, reset).
    Connect {
        /// Description from the HTTP stack.
        message: String,
    },
    /// The per-attempt deadline elapsed.
    DeadlineExceeded {
        /// The deadline that was exceeded.
        timeout: Duration,
    },
    /// The server answered with a non-2xx status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Provider message, or a generic substitute.
        message: String,
        /// Provider error type, if the body carried one.
        error_type: Option<String>,
        /// Raw body, if it was JSON.
        body: Option<Value>,
    },
    /// A 2xx body could not be decoded.
    Decode {
        /// Description of the decode failure.
        message: String,
    },
    /// Anything else the transport could not categorise.
    Other {
        /// Description of the failure.
        message: String,
    },
}

/// Normalise a raw transport failure into the gateway error taxonomy.
#[must_use]
pub fn classify(failure: TransportFailure) -> GatewayError {
    match failure {
        TransportFailure::Connect { message } => GatewayError::Network { message },
        TransportFailure::DeadlineExceeded { timeout } => GatewayError::timeout(timeout),
        TransportFailure::Status {
            status,
            message,
            error_type,
            body,
        } => GatewayError::Api {
            status,
            message,
            provider_type: error_type,
            details: body,
        },
        TransportFailure::Decode { message } => GatewayError::ResponseFormat {
            message,
            details: None,
        },
        TransportFailure::Other { message } => GatewayError::Unknown { message },
    }
}

/// Decide whether an error should trigger another attempt.
///
/// Retryable: network failures, HTTP 429, HTTP 5xx. Timeouts already spent
/// the full per-attempt budget and are surfaced as-is.
#[must_use]
pub fn is_retryable(error: &GatewayError) -> bool {
    match error {
        GatewayError::Network { .. } => true,
        GatewayError::Api { status, .. } => *status == 429 || *status >= 500,
        GatewayError::Config { .. }
        | GatewayError::Validation { .. }
        | GatewayError::Timeout { .. }
        | GatewayError::ResponseFormat { .. }
        | GatewayError::Unknown { .. } => false,
    }
}
