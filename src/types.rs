//! Common types used throughout the client
//!
//! This module contains shared type definitions and type aliases used
//! across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Query parameters appended to a request URL
pub type QueryParams = HashMap<String, String>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    /// Whether a JSON body is sent with this method
    pub fn allows_body(self) -> bool {
        !matches!(self, Method::GET)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Method {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "PATCH" => Ok(Method::PATCH),
            "DELETE" => Ok(Method::DELETE),
            other => Err(crate::error::Error::validation(
                "method",
                format!("unsupported HTTP method '{other}'"),
            )),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

/// URL scheme used to reach the device
///
/// The device only speaks HTTPS. `Http` exists for plain-HTTP test fixtures
/// and has to be selected explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Https,
    Http,
}

impl Scheme {
    /// Scheme as it appears in a URL
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_conversion() {
        let get: reqwest::Method = Method::GET.into();
        assert_eq!(reqwest::Method::GET, get);
        let delete: reqwest::Method = Method::DELETE.into();
        assert_eq!(reqwest::Method::DELETE, delete);
    }

    #[test]
    fn test_method_default() {
        assert_eq!(Method::default(), Method::GET);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::POST);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::DELETE);
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_body() {
        assert!(Method::POST.allows_body());
        assert!(Method::DELETE.allows_body());
        assert!(!Method::GET.allows_body());
    }

    #[test]
    fn test_scheme_default_is_https() {
        assert_eq!(Scheme::default(), Scheme::Https);
        assert_eq!(Scheme::Https.as_str(), "https");
    }
}
