//! The gateway client.

use crate::config::GatewayConfig;
use crate::request::to_wire;
use crate::response::from_wire;
use crate::transport::{HttpTransport, Transport, TransportRequest};
use gateway_core::{classify, validate, ChatRequest, ChatResponse, GatewayError, GatewayResult};
use gateway_resilience::{
    ConcurrencyThrottle, RetryConfig, RetryPolicy, ThrottleConfig, ThrottleStats,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Client for the upstream chat completions API.
///
/// Every call is validated, throttled to `max_concurrent` in-flight calls and
/// retried on transient failures. Cloning is cheap and clones share the same
/// throttle.
///
/// # Example
///
/// ```rust,no_run
/// use gateway_client::{ChatRequest, GatewayClient, GatewayConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), gateway_client::GatewayError> {
///     let config = GatewayConfig::builder().api_key("sk-or-...").build()?;
///     let client = GatewayClient::new(config)?;
///
///     let request = ChatRequest::builder()
///         .system("You rewrite recipes.")
///         .user("Make this lasagna vegan.")
///         .temperature(0.7)
///         .build();
///
///     let response = client.send(&request).await?;
///     println!("{}", response.content().unwrap_or_default());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: GatewayConfig,
    headers: HeaderMap,
    endpoint: url::Url,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    throttle: ConcurrencyThrottle,
}

impl GatewayClient {
    /// Create a client that talks HTTP through `reqwest`.
    ///
    /// # Errors
    /// Returns a configuration error if a header value is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to create HTTP client: {e}")))?;
        Self::with_transport(config, Arc::new(HttpTransport::new(http)))
    }

    /// Create a client over a custom transport.
    ///
    /// # Errors
    /// Returns a configuration error if a header value is invalid.
    pub fn with_transport(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
    ) -> GatewayResult<Self> {
        let headers = build_headers(&config)?;
        let endpoint = config.completions_url()?;

        let retry = RetryPolicy::new(RetryConfig {
            max_retries: config.max_retries(),
            base_delay: config.retry_delay(),
            max_jitter: config.retry_jitter(),
        });
        let throttle = ConcurrencyThrottle::new(ThrottleConfig {
            max_concurrent: config.max_concurrent(),
        });

        info!(
            endpoint = %endpoint,
            default_model = config.default_model(),
            max_concurrent = throttle.max_concurrent(),
            max_retries = config.max_retries(),
            "Gateway client created"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                headers,
                endpoint,
                transport,
                retry,
                throttle,
            }),
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Current throttle occupancy.
    pub fn throttle_stats(&self) -> ThrottleStats {
        self.inner.throttle.stats()
    }

    /// Send a chat completion request.
    ///
    /// Validation failures return before any slot is taken or any network
    /// call is made.
    ///
    /// # Errors
    /// Returns the first non-retryable error, the last error once retries are
    /// spent, or a response format error if the body cannot be understood.
    #[instrument(
        skip(self, request),
        fields(
            model = request.resolve_model(Some(self.inner.config.default_model())).unwrap_or(""),
            messages = request.messages.len(),
        )
    )]
    pub async fn send(&self, request: &ChatRequest) -> GatewayResult<ChatResponse> {
        let inner = &self.inner;
        validate(request, Some(inner.config.default_model()))?;

        let wire = to_wire(request, inner.config.default_model())?;
        let body = serde_json::to_value(&wire)
            .map_err(|e| GatewayError::unknown(format!("Failed to serialize request: {e}")))?;

        let call = TransportRequest {
            url: inner.endpoint.clone(),
            body,
            headers: inner.headers.clone(),
            timeout: inner.config.timeout(),
        };

        let raw = inner
            .throttle
            .with_slot(|| {
                inner.retry.execute(|| {
                    let transport = Arc::clone(&inner.transport);
                    let call = &call;
                    async move {
                        debug!("Dispatching attempt");
                        transport.execute(call).await.map_err(classify)
                    }
                })
            })
            .await?;

        from_wire(raw)
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("default_model", &self.inner.config.default_model())
            .field("throttle", &self.inner.throttle.stats())
            .finish_non_exhaustive()
    }
}

fn build_headers(config: &GatewayConfig) -> GatewayResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key_value()))
        .map_err(|e| GatewayError::config(format!("Invalid API key: {e}")))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    if let Some(site_url) = config.site_url() {
        headers.insert(
            HeaderName::from_static("http-referer"),
            HeaderValue::from_str(site_url)
                .map_err(|e| GatewayError::config(format!("Invalid site URL header: {e}")))?,
        );
    }

    if let Some(app_name) = config.app_name() {
        headers.insert(
            HeaderName::from_static("x-title"),
            HeaderValue::from_str(app_name)
                .map_err(|e| GatewayError::config(format!("Invalid app name header: {e}")))?,
        );
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig::builder()
            .api_key("sk-test")
            .app_name("Recipe Box")
            .site_url("https://recipes.example.com")
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_headers() {
        let headers = build_headers(&config()).unwrap();

        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers["http-referer"], "https://recipes.example.com");
        assert_eq!(headers["x-title"], "Recipe Box");
    }

    #[test]
    fn test_optional_headers_absent() {
        let config = GatewayConfig::builder().api_key("sk-test").build().unwrap();
        let headers = build_headers(&config).unwrap();
        assert!(!headers.contains_key("http-referer"));
        assert!(!headers.contains_key("x-title"));
    }

    #[test]
    fn test_invalid_header_value() {
        let config = GatewayConfig::builder()
            .api_key("sk-test")
            .app_name("Recipe\nBox")
            .build()
            .unwrap();
        let err = GatewayClient::new(config).unwrap_err();
        assert!(matches!(err, GatewayError::Config { .. }));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = GatewayClient::new(config()).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("chat/completions"));
        assert!(!debug.contains("sk-test"));
    }
}
