//! Endpoint targets and URL construction
//!
//! Every device endpoint lives under a fixed `/api/v1` prefix. Segments are
//! checked against an allow-list before they ever reach the URL parser, and
//! `.`/`..` path components are refused, so a caller-supplied segment can
//! never smuggle in a different host or scheme or climb out of the prefix.

use crate::error::{Error, Result};
use crate::types::Scheme;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Path prefix shared by every device endpoint
pub const API_PREFIX: &str = "/api/v1";

/// Default HTTPS port of the device's management API
pub const DEFAULT_PORT: u16 = 8443;

static HOSTNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.-]+$").unwrap());

static SEGMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9/._?=&-]+$").unwrap());

static REPEATED_SLASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/{2,}").unwrap());

/// Immutable address of one device's API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTarget {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl EndpointTarget {
    /// Create an HTTPS target, validating host and port
    pub fn new(host: &str, port: u16) -> Result<Self> {
        Self::with_scheme(Scheme::Https, host, port)
    }

    /// Create a target with an explicit scheme
    pub fn with_scheme(scheme: Scheme, host: &str, port: u16) -> Result<Self> {
        let host = normalize_host(host)?;
        if port == 0 {
            return Err(Error::validation("port", "must be between 1 and 65535"));
        }
        Ok(Self { scheme, host, port })
    }

    /// Hostname without any scheme prefix
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// URL scheme
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// `scheme://host:port`
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }

    /// Full URL for an endpoint segment such as `device_info`
    pub fn url_for(&self, segment: &str) -> Result<Url> {
        let segment = sanitize_segment(segment)?;
        let raw = format!("{}{API_PREFIX}/{segment}", self.origin());
        Url::parse(&raw).map_err(|e| Error::validation("endpoint", format!("{raw}: {e}")))
    }
}

/// Validate a hostname, stripping any `http://` or `https://` prefix
pub fn normalize_host(host: &str) -> Result<String> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::validation("host", "hostname cannot be empty"));
    }

    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);

    if !HOSTNAME_REGEX.is_match(host) {
        return Err(Error::validation(
            "host",
            format!("invalid hostname format: '{host}'"),
        ));
    }
    Ok(host.to_string())
}

/// Normalize an endpoint segment
///
/// Leading and trailing slashes are stripped and runs of slashes collapse to
/// one, so `/status/`, `status` and `//status//` all yield `status`.
pub fn sanitize_segment(segment: &str) -> Result<String> {
    if segment.is_empty() {
        return Err(Error::validation("endpoint", "endpoint cannot be empty"));
    }
    if !SEGMENT_REGEX.is_match(segment) {
        return Err(Error::validation(
            "endpoint",
            format!("invalid endpoint format: '{segment}'"),
        ));
    }

    let path = segment.split_once('?').map_or(segment, |(path, _)| path);
    if path.split('/').any(|part| part == "." || part == "..") {
        return Err(Error::validation(
            "endpoint",
            format!("relative path components are not allowed: '{segment}'"),
        ));
    }

    let collapsed = REPEATED_SLASHES.replace_all(segment, "/");
    let trimmed = collapsed.trim_matches('/');
    if trimmed.is_empty() {
        return Err(Error::validation("endpoint", "endpoint cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Build the HTTPS URL of an endpoint on the default port
pub fn build_endpoint_url(host: &str, endpoint: &str) -> Result<String> {
    build_endpoint_url_with_port(host, endpoint, DEFAULT_PORT)
}

/// Build the HTTPS URL of an endpoint on a given port
pub fn build_endpoint_url_with_port(host: &str, endpoint: &str, port: u16) -> Result<String> {
    let target = EndpointTarget::new(host, port)?;
    Ok(target.url_for(endpoint)?.to_string())
}
