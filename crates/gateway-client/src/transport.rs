//! HTTP transport.
//!
//! One [`Transport::execute`] call is one attempt: no retries, no throttling.
//! Failures come back raw as [`TransportFailure`] and are classified by the
//! client.

use crate::response::WireErrorBody;
use async_trait::async_trait;
use gateway_core::TransportFailure;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A single prepared upstream call.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Endpoint URL.
    pub url: Url,
    /// JSON body.
    pub body: Value,
    /// Headers to send.
    pub headers: HeaderMap,
    /// Deadline for the attempt, covering connect, send and body read.
    pub timeout: Duration,
}

/// Executes one attempt against the upstream.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the decoded 2xx body.
    async fn execute(&self, request: &TransportRequest) -> Result<Value, TransportFailure>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport around an existing `reqwest` client.
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn send(&self, request: &TransportRequest) -> Result<Value, TransportFailure> {
        let response = self
            .http
            .post(request.url.clone())
            .headers(request.headers.clone())
            .json(&request.body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, request.timeout))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            body_read_failure(status.as_u16(), e.is_timeout(), &e.to_string(), request.timeout)
        })?;

        debug!(status = status.as_u16(), bytes = bytes.len(), "Upstream responded");

        if !status.is_success() {
            return Err(parse_error_body(status.as_u16(), &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportFailure::Decode {
            message: format!("Failed to parse response body: {e}"),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &TransportRequest) -> Result<Value, TransportFailure> {
        match tokio::time::timeout(request.timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportFailure::DeadlineExceeded {
                timeout: request.timeout,
            }),
        }
    }
}

fn map_reqwest_error(error: &reqwest::Error, timeout: Duration) -> TransportFailure {
    if error.is_timeout() {
        TransportFailure::DeadlineExceeded { timeout }
    } else if error.is_connect() || error.is_request() {
        TransportFailure::Connect {
            message: error.to_string(),
        }
    } else if error.is_decode() {
        TransportFailure::Decode {
            message: error.to_string(),
        }
    } else {
        TransportFailure::Other {
            message: error.to_string(),
        }
    }
}

/// Failure while reading the body after the status line arrived.
///
/// A non-2xx status is kept so the retry table sees it; a 2xx whose body
/// cannot be read is not retried.
fn body_read_failure(
    status: u16,
    timed_out: bool,
    message: &str,
    timeout: Duration,
) -> TransportFailure {
    if timed_out {
        TransportFailure::DeadlineExceeded { timeout }
    } else if (200..300).contains(&status) {
        TransportFailure::Other {
            message: format!("Failed to read response body: {message}"),
        }
    } else {
        parse_error_body(status, &[])
    }
}

/// Build a [`TransportFailure::Status`] from a non-2xx body.
///
/// Uses the provider's `error.message` and `error.type` when the body has
/// them, otherwise a generic message naming the status.
pub(crate) fn parse_error_body(status: u16, bytes: &[u8]) -> TransportFailure {
    let body: Option<Value> = serde_json::from_slice(bytes).ok();
    let parsed = body
        .as_ref()
        .and_then(|v| serde_json::from_value::<WireErrorBody>(v.clone()).ok());

    let (message, error_type) = match parsed {
        Some(WireErrorBody { error }) => {
            let code = error.code.map(|c| match c {
                Value::String(s) => s,
                other => other.to_string(),
            });
            (error.message, error.error_type.or(code))
        }
        None => (None, None),
    };

    TransportFailure::Status {
        status,
        message: message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("request failed with status {status}")),
        error_type,
        body,
    }
}
