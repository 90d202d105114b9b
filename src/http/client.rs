//! Underlying HTTP transport
//!
//! One `reqwest::Client` per engine. Certificate verification is a per-client
//! setting; nothing here touches process-wide TLS state.

use super::retry::AttemptFailure;
use crate::error::{Error, Result};
use std::time::Duration;

/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Verify the device certificate chain
    pub verify_tls: bool,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verify_tls: false,
            user_agent: format!("m4300-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Build the reqwest client described by this config
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(!self.verify_tls)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
    }
}

/// Builder for HTTP transport config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Enable or disable certificate verification
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.config.verify_tls = verify;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Classify a transport-level reqwest error for the retry controller
pub fn classify_transport_error(error: &reqwest::Error) -> AttemptFailure {
    if error.is_timeout() {
        AttemptFailure::Timeout
    } else {
        AttemptFailure::Connection
    }
}
