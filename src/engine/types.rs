//! Engine types
//!
//! Description of a single API call handed to the request engine.

use crate::types::{JsonValue, Method, QueryParams};

/// One authenticated API call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Endpoint segment below `/api/v1`, e.g. `device_info`
    pub endpoint: String,
    /// JSON body (ignored for GET)
    pub body: Option<JsonValue>,
    /// Query parameters
    pub query: QueryParams,
    /// Raw key the device uses for this endpoint's payload
    pub data_key: Option<String>,
}

impl ApiRequest {
    /// Create a request
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// GET request
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    /// POST request
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    /// DELETE request
    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    /// Name the raw payload key the device uses for this endpoint
    #[must_use]
    pub fn data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = Some(key.into());
        self
    }
}
