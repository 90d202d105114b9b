//! HTTP plumbing module
//!
//! Everything the request engine needs below the authentication layer.
//!
//! # Features
//!
//! - **Endpoint Targets**: Validated host/port and sanitized `/api/v1` URLs
//! - **Rate Limiting**: Minimum spacing between requests using governor
//! - **Retry Policy**: Classification of failed attempts and exponential backoff
//! - **Transport**: reqwest client with a per-client TLS verification flag

mod client;
mod endpoint;
mod rate_limit;
mod retry;

pub use client::{classify_transport_error, HttpClientConfig, HttpClientConfigBuilder, DEFAULT_TIMEOUT};
pub use endpoint::{
    build_endpoint_url, build_endpoint_url_with_port, normalize_host, sanitize_segment,
    EndpointTarget, API_PREFIX, DEFAULT_PORT,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig, DEFAULT_REQUESTS_PER_SECOND};
pub use retry::{AttemptFailure, RetryDecision, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
