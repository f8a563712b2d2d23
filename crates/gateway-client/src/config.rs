//! Client configuration.
//!
//! Every default is resolved in [`GatewayConfigBuilder::build`]; nothing is
//! merged at call time.

use gateway_core::{GatewayError, GatewayResult};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Configuration for the gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API key for the upstream provider.
    pub(crate) api_key: Secret<String>,
    /// Base URL of the upstream API.
    pub(crate) base_url: Url,
    /// Model used when a request does not name one.
    pub(crate) default_model: String,
    /// Per-attempt deadline.
    pub(crate) timeout: Duration,
    /// Maximum number of retries after the first attempt.
    pub(crate) max_retries: u32,
    /// Base retry delay, doubled on each retry.
    pub(crate) retry_delay: Duration,
    /// Upper bound of the random jitter added to each retry delay.
    pub(crate) retry_jitter: Duration,
    /// Ceiling on concurrently in-flight calls.
    pub(crate) max_concurrent: usize,
    /// Application name sent as `X-Title`.
    pub(crate) app_name: Option<String>,
    /// Site URL sent as `HTTP-Referer`.
    pub(crate) site_url: Option<String>,
}

impl GatewayConfig {
    /// Default upstream base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://openrouter.ai/api/v1";
    /// Default chat model.
    pub const DEFAULT_MODEL: &'static str = "openai/gpt-4o-mini";
    /// Default per-attempt timeout (30 seconds).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
    /// Default maximum retries.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Default base retry delay (1 second).
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
    /// Default jitter bound (1 second).
    pub const DEFAULT_RETRY_JITTER: Duration = Duration::from_millis(1000);
    /// Default ceiling on in-flight calls.
    pub const DEFAULT_MAX_CONCURRENT: usize = 5;

    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }

    /// Load configuration from `OPENROUTER_*` environment variables.
    ///
    /// # Errors
    /// Returns a configuration error if the API key is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> GatewayResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> GatewayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let number = |name: &str| -> GatewayResult<Option<u64>> {
            var(name)
                .map(|v| {
                    v.trim().parse::<u64>().map_err(|e| {
                        GatewayError::config(format!("{name} must be a non-negative integer: {e}"))
                    })
                })
                .transpose()
        };

        let mut builder = Self::builder();
        if let Some(key) = var("OPENROUTER_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(url) = var("OPENROUTER_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Some(model) = var("OPENROUTER_DEFAULT_MODEL") {
            builder = builder.default_model(model);
        }
        if let Some(ms) = number("OPENROUTER_TIMEOUT_MS")? {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(n) = number("OPENROUTER_MAX_RETRIES")? {
            builder = builder.max_retries(u32::try_from(n).unwrap_or(u32::MAX));
        }
        if let Some(ms) = number("OPENROUTER_RETRY_DELAY_MS")? {
            builder = builder.retry_delay(Duration::from_millis(ms));
        }
        if let Some(n) = number("OPENROUTER_MAX_CONCURRENT")? {
            let n = usize::try_from(n).map_err(|_| {
                GatewayError::config(format!(
                    "OPENROUTER_MAX_CONCURRENT is out of range for max_concurrent: {n}"
                ))
            })?;
            builder = builder.max_concurrent(n);
        }
        if let Some(name) = var("OPENROUTER_APP_NAME") {
            builder = builder.app_name(name);
        }
        if let Some(site) = var("OPENROUTER_SITE_URL") {
            builder = builder.site_url(site);
        }
        builder.build()
    }

    /// Get the API key (exposed for use in requests).
    pub(crate) fn api_key_value(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of the chat completions endpoint.
    ///
    /// # Errors
    /// Returns a configuration error if the joined URL does not parse.
    pub fn completions_url(&self) -> GatewayResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/chat/completions"))
            .map_err(|e| GatewayError::config(format!("Invalid completions URL: {e}")))
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Get the per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the base retry delay.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Get the jitter bound.
    pub fn retry_jitter(&self) -> Duration {
        self.retry_jitter
    }

    /// Get the ceiling on in-flight calls.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Get the application name.
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    /// Get the site URL.
    pub fn site_url(&self) -> Option<&str> {
        self.site_url.as_deref()
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    api_key: Option<Secret<String>>,
    base_url: Option<String>,
    default_model: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_delay: Option<Duration>,
    retry_jitter: Option<Duration>,
    max_concurrent: Option<usize>,
    app_name: Option<String>,
    site_url: Option<String>,
}

impl GatewayConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(key.into()));
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the default model.
    #[must_use]
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the base retry delay.
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Set the jitter bound. `Duration::ZERO` disables jitter.
    #[must_use]
    pub fn retry_jitter(mut self, jitter: Duration) -> Self {
        self.retry_jitter = Some(jitter);
        self
    }

    /// Set the ceiling on in-flight calls.
    #[must_use]
    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = Some(max_concurrent);
        self
    }

    /// Set the application name sent as `X-Title`.
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the site URL sent as `HTTP-Referer`.
    #[must_use]
    pub fn site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    /// Returns a configuration error if the API key is missing or blank, or
    /// the base URL does not parse.
    pub fn build(self) -> GatewayResult<GatewayConfig> {
        let api_key = self
            .api_key
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or_else(|| GatewayError::config("API key is required"))?;

        let raw_url = self
            .base_url
            .unwrap_or_else(|| GatewayConfig::DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw_url)
            .map_err(|e| GatewayError::config(format!("Invalid base URL '{raw_url}': {e}")))?;

        let default_model = self
            .default_model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GatewayConfig::DEFAULT_MODEL.to_string());

        let max_concurrent = self
            .max_concurrent
            .unwrap_or(GatewayConfig::DEFAULT_MAX_CONCURRENT);
        if max_concurrent > Semaphore::MAX_PERMITS {
            return Err(GatewayError::config(format!(
                "max_concurrent must be at most {}, got {max_concurrent}",
                Semaphore::MAX_PERMITS
            )));
        }

        Ok(GatewayConfig {
            api_key,
            base_url,
            default_model,
            timeout: self.timeout.unwrap_or(GatewayConfig::DEFAULT_TIMEOUT),
            max_retries: self.max_retries.unwrap_or(GatewayConfig::DEFAULT_MAX_RETRIES),
            retry_delay: self.retry_delay.unwrap_or(GatewayConfig::DEFAULT_RETRY_DELAY),
            retry_jitter: self.retry_jitter.unwrap_or(GatewayConfig::DEFAULT_RETRY_JITTER),
            max_concurrent,
            app_name: self.app_name,
            site_url: self.site_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::builder().api_key("sk-test").build().unwrap();

        assert_eq!(config.base_url().as_str(), "https://openrouter.ai/api/v1");
        assert_eq!(config.default_model(), GatewayConfig::DEFAULT_MODEL);
        assert_eq!(config.timeout(), Duration::from_millis(30_000));
        assert_eq!(config.max_retries(), 3);
        assert_eq!(config.retry_delay(), Duration::from_millis(1000));
        assert_eq!(config.retry_jitter(), Duration::from_millis(1000));
        assert_eq!(config.max_concurrent(), 5);
        assert!(config.app_name().is_none());
        assert_eq!(config.api_key_value(), "sk-test");
    }

    #[test]
    fn test_missing_api_key() {
        let err = GatewayConfig::builder().build().unwrap_err();
        assert!(matches!(err, GatewayError::Config { .. }));

        let err = GatewayConfig::builder().api_key("   ").build().unwrap_err();
        assert!(matches!(err, GatewayError::Config { .. }));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = GatewayConfig::builder()
            .api_key("sk-test")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Invalid base URL"));
    }

    #[test]
    fn test_completions_url() {
        let config = GatewayConfig::builder().api_key("k").build().unwrap();
        assert_eq!(
            config.completions_url().unwrap().as_str(),
            "https://openrouter.ai/api/v1/chat/completions"
        );

        let config = GatewayConfig::builder()
            .api_key("k")
            .base_url("http://localhost:9000/v1/")
            .build()
            .unwrap();
        assert_eq!(
            config.completions_url().unwrap().as_str(),
            "http://localhost:9000/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GatewayConfig::builder().api_key("sk-secret-value").build().unwrap();
        assert!(!format!("{config:?}").contains("sk-secret-value"));
    }

    #[test]
    fn test_from_lookup() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-env"),
            ("OPENROUTER_DEFAULT_MODEL", "anthropic/claude-3.5-haiku"),
            ("OPENROUTER_TIMEOUT_MS", "5000"),
            ("OPENROUTER_MAX_RETRIES", "1"),
            ("OPENROUTER_MAX_CONCURRENT", "2"),
            ("OPENROUTER_APP_NAME", "Recipe Box"),
            ("OPENROUTER_SITE_URL", "https://recipes.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.default_model(), "anthropic/claude-3.5-haiku");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries(), 1);
        assert_eq!(config.max_concurrent(), 2);
        assert_eq!(config.app_name(), Some("Recipe Box"));
        assert_eq!(config.site_url(), Some("https://recipes.example.com"));
    }

    #[test]
    fn test_max_concurrent_upper_bound() {
        let err = GatewayConfig::builder()
            .api_key("sk-test")
            .max_concurrent(usize::MAX)
            .build()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Config { .. }));
        assert!(err.to_string().contains("max_concurrent"));

        let config = GatewayConfig::builder()
            .api_key("sk-test")
            .max_concurrent(Semaphore::MAX_PERMITS)
            .build()
            .unwrap();
        assert_eq!(config.max_concurrent(), Semaphore::MAX_PERMITS);

        let err = GatewayConfig::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-env"),
            ("OPENROUTER_MAX_CONCURRENT", "3000000000000000000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, GatewayError::Config { .. }));
        assert!(err.to_string().contains("max_concurrent"));
    }

    #[test]
    fn test_from_lookup_errors() {
        let err = GatewayConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("API key is required"));

        let err = GatewayConfig::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-env"),
            ("OPENROUTER_TIMEOUT_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENROUTER_TIMEOUT_MS"));
    }
}
