//! Switch connection configuration
//!
//! A [`SwitchConfig`] can be built in code, read from `M4300_*` environment
//! variables, or loaded from YAML:
//!
//! ```yaml
//! host: 192.168.1.10
//! username: admin
//! password: secret
//! port: 8443
//! verify_tls: false
//! timeout_seconds: 10
//! rate_limit: 10.0
//! token_refresh_margin: 300
//! max_retries: 3
//! ```

use crate::auth::{Credentials, DEFAULT_REFRESH_MARGIN_SECS};
use crate::error::{Error, Result, ResultExt};
use crate::http::{
    normalize_host, EndpointTarget, HttpClientConfig, RateLimiterConfig, RetryPolicy,
    DEFAULT_PORT, DEFAULT_REQUESTS_PER_SECOND, DEFAULT_TIMEOUT, DEFAULT_MAX_ATTEMPTS,
};
use crate::types::Scheme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the switch address
pub const ENV_HOST: &str = "M4300_HOST";
/// Environment variable holding the login name
pub const ENV_USERNAME: &str = "M4300_USERNAME";
/// Environment variable holding the password
pub const ENV_PASSWORD: &str = "M4300_PASSWORD";
/// Environment variable holding the HTTPS port
pub const ENV_PORT: &str = "M4300_PORT";
/// Environment variables toggling certificate verification, in lookup order
pub const ENV_VERIFY_TLS: &[&str] = &["M4300_VERIFY_SSL", "M4300_SSL_VERIFY"];
/// Environment variable holding the per-attempt timeout in seconds
pub const ENV_TIMEOUT: &str = "M4300_TIMEOUT";
/// Environment variable holding the request rate in requests per second
pub const ENV_RATE_LIMIT: &str = "M4300_RATE_LIMIT";
/// Environment variable holding the token refresh margin in seconds
pub const ENV_REFRESH_MARGIN: &str = "M4300_TOKEN_REFRESH_MARGIN";
/// Environment variable holding the attempt budget
pub const ENV_MAX_RETRIES: &str = "M4300_MAX_RETRIES";

// ============================================================================
// Switch Config
// ============================================================================

/// Everything needed to talk to one switch
#[derive(Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Switch address; an `http://` or `https://` prefix is stripped
    pub host: String,

    /// Login name
    pub username: String,

    /// Login password (never serialized)
    #[serde(default, skip_serializing)]
    pub password: String,

    /// HTTPS port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Verify the device certificate chain
    #[serde(default)]
    pub verify_tls: bool,

    /// Per-attempt timeout
    #[serde(
        rename = "timeout_seconds",
        default = "default_timeout",
        with = "duration_secs"
    )]
    pub timeout: Duration,

    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub rate_limit: f64,

    /// Seconds before expiry at which a token is refreshed
    #[serde(default = "default_refresh_margin")]
    pub token_refresh_margin: i64,

    /// Total attempts per call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit
    #[serde(skip, default = "default_backoff_base")]
    pub backoff_base: Duration,

    /// Backoff ceiling
    #[serde(skip, default = "default_backoff_cap")]
    pub backoff_cap: Duration,

    /// URL scheme; plain HTTP only via [`SwitchConfigBuilder::insecure_http`]
    #[serde(skip)]
    pub scheme: Scheme,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_rate_limit() -> f64 {
    DEFAULT_REQUESTS_PER_SECOND
}

fn default_refresh_margin() -> i64 {
    DEFAULT_REFRESH_MARGIN_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_base() -> Duration {
    RetryPolicy::default().backoff_base
}

fn default_backoff_cap() -> Duration {
    RetryPolicy::default().backoff_cap
}

impl SwitchConfig {
    /// Create a config with default settings
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            port: default_port(),
            verify_tls: false,
            timeout: default_timeout(),
            rate_limit: default_rate_limit(),
            token_refresh_margin: default_refresh_margin(),
            max_retries: default_max_retries(),
            backoff_base: default_backoff_base(),
            backoff_cap: default_backoff_cap(),
            scheme: Scheme::Https,
        }
    }

    /// Start a builder
    pub fn builder(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> SwitchConfigBuilder {
        SwitchConfigBuilder {
            config: Self::new(host, username, password),
        }
    }

    /// Read the config from `M4300_*` environment variables
    pub fn from_env() -> Result<Self> {
        let host = env_var(ENV_HOST).unwrap_or_default();
        let username = env_var(ENV_USERNAME).unwrap_or_default();
        let password = env_var(ENV_PASSWORD).unwrap_or_default();
        let mut config = Self::new(host, username, password);

        if let Some(port) = parse_env(ENV_PORT)? {
            config.port = port;
        }
        if let Some(verify) = ENV_VERIFY_TLS.iter().find_map(|name| env_var(name)) {
            config.verify_tls = parse_bool(ENV_VERIFY_TLS[0], &verify)?;
        }
        if let Some(secs) = parse_env::<f64>(ENV_TIMEOUT)? {
            config.timeout = secs_to_duration(ENV_TIMEOUT, secs)?;
        }
        if let Some(rate) = parse_env(ENV_RATE_LIMIT)? {
            config.rate_limit = rate;
        }
        if let Some(margin) = parse_env(ENV_REFRESH_MARGIN)? {
            config.token_refresh_margin = margin;
        }
        if let Some(max) = parse_env(ENV_MAX_RETRIES)? {
            config.max_retries = max;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Check every field before any network activity
    pub fn validate(&self) -> Result<()> {
        normalize_host(&self.host)?;
        self.credentials()?;

        if self.port == 0 {
            return Err(Error::validation("port", "port must be between 1 and 65535"));
        }
        if self.rate_limiter_config().min_interval().is_none() {
            return Err(Error::validation(
                "rate_limit",
                format!(
                    "rate limit must be positive with a representable spacing, got {}",
                    self.rate_limit
                ),
            ));
        }
        if self.token_refresh_margin < 0 {
            return Err(Error::validation(
                "token_refresh_margin",
                "token refresh margin must not be negative",
            ));
        }
        if self.max_retries == 0 {
            return Err(Error::validation(
                "max_retries",
                "at least one attempt is required",
            ));
        }
        if self.timeout.is_zero() {
            return Err(Error::validation("timeout", "timeout must be positive"));
        }
        Ok(())
    }

    /// Login credentials
    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    /// Device address
    pub fn target(&self) -> Result<EndpointTarget> {
        EndpointTarget::with_scheme(self.scheme, &self.host, self.port)
    }

    /// Transport settings
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .timeout(self.timeout)
            .verify_tls(self.verify_tls)
            .build()
    }

    /// Rate limiter settings
    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig::new(self.rate_limit)
    }

    /// Retry settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries).with_backoff(self.backoff_base, self.backoff_cap)
    }

    /// Refresh margin as a signed duration
    pub fn refresh_margin(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.token_refresh_margin)
            .unwrap_or_else(|| chrono::Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS))
    }
}

impl fmt::Debug for SwitchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .field("rate_limit", &self.rate_limit)
            .field("token_refresh_margin", &self.token_refresh_margin)
            .field("max_retries", &self.max_retries)
            .field("scheme", &self.scheme)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`SwitchConfig`]
#[derive(Debug, Clone)]
pub struct SwitchConfigBuilder {
    config: SwitchConfig,
}

impl SwitchConfigBuilder {
    /// Set the HTTPS port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable or disable certificate verification
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.config.verify_tls = verify;
        self
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set requests per second
    pub fn rate_limit(mut self, requests_per_second: f64) -> Self {
        self.config.rate_limit = requests_per_second;
        self
    }

    /// Set the token refresh margin in seconds
    pub fn token_refresh_margin(mut self, seconds: i64) -> Self {
        self.config.token_refresh_margin = seconds;
        self
    }

    /// Set the attempt budget
    pub fn max_retries(mut self, max: u32) -> Self {
        self.config.max_retries = max;
        self
    }

    /// Set the backoff curve
    pub fn backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.config.backoff_base = base;
        self.config.backoff_cap = cap;
        self
    }

    /// Talk plain HTTP instead of HTTPS
    ///
    /// Real switches only serve HTTPS; this exists for local mocks.
    pub fn insecure_http(mut self) -> Self {
        self.config.scheme = Scheme::Http;
        self
    }

    /// Validate and return the config
    pub fn build(self) -> Result<SwitchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::validation(name, format!("invalid value '{raw}'"))),
        None => Ok(None),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::validation(name, format!("invalid boolean '{raw}'"))),
    }
}

fn secs_to_duration(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| Error::validation(name, format!("invalid duration {secs}")))
}

/// Serde adapter for durations written as (fractional) seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
