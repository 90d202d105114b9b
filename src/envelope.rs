//! Response envelope
//!
//! The device wraps every payload as
//! `{"<data-key>": <payload>, "resp": {"status", "respCode", "respMsg"}}`,
//! where the data key differs per endpoint (`login`, `logout`, `deviceInfo`,
//! `switchConfigVlan`, ...). [`ApiEnvelope`] normalizes this to a single
//! `data` field so callers never see the raw key.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Key of the status container in raw device responses
pub const STATUS_KEY: &str = "resp";

/// Value of `resp.status` on success
pub const STATUS_SUCCESS: &str = "success";

/// Status metadata of an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStatus {
    /// `"success"` or `"failure"`
    pub status: String,
    /// Device response code (`respCode`)
    #[serde(default, alias = "respCode")]
    pub code: i64,
    /// Device response message (`respMsg`)
    #[serde(default, alias = "respMsg")]
    pub message: String,
}

impl ResponseStatus {
    /// Whether the device reported success
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Normalized response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiEnvelope {
    /// Endpoint payload (`Null` when the device sent none)
    pub data: JsonValue,
    /// Status metadata
    pub status: ResponseStatus,
}

impl ApiEnvelope {
    /// Parse a response body
    ///
    /// Only the structure is checked here; a well-formed failure envelope
    /// parses fine and is reported by [`ApiEnvelope::into_result`].
    pub fn parse(text: &str, endpoint: &str, data_key: Option<&str>) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(text)
            .map_err(|e| Error::malformed(endpoint, format!("invalid JSON response: {e}"), None))?;
        Self::from_value(value, endpoint, data_key)
    }

    /// Normalize an already-decoded JSON body
    pub fn from_value(value: JsonValue, endpoint: &str, data_key: Option<&str>) -> Result<Self> {
        let JsonValue::Object(mut map) = value else {
            return Err(Error::malformed(
                endpoint,
                "response body is not a JSON object",
                None,
            ));
        };

        let resp = map.remove(STATUS_KEY).ok_or_else(|| {
            Error::malformed(endpoint, "missing 'resp' status container", None)
        })?;
        if !resp.is_object() {
            return Err(Error::malformed(
                endpoint,
                "'resp' status container is not an object",
                None,
            ));
        }
        if !resp.get("status").is_some_and(JsonValue::is_string) {
            return Err(Error::malformed(endpoint, "missing 'resp.status'", None));
        }
        let status: ResponseStatus = serde_json::from_value(resp)
            .map_err(|e| Error::malformed(endpoint, format!("invalid 'resp' container: {e}"), None))?;

        let data = extract_data(map, data_key);
        Ok(Self { data, status })
    }

    /// Whether the device reported success
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a failure envelope into an [`Error::Api`]
    pub fn into_result(self, method: Method, endpoint: &str, http_status: Option<u16>) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = if self.status.message.is_empty() {
            "Unknown error".to_string()
        } else {
            self.status.message.clone()
        };
        Err(Error::Api {
            method,
            endpoint: endpoint.to_string(),
            status: http_status,
            code: Some(self.status.code),
            message,
            body: None,
        })
    }

    /// Deserialize the payload into a typed record
    pub fn data_as<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            Error::malformed(endpoint, format!("unexpected payload shape: {e}"), None)
        })
    }
}

/// Pick the payload out of the remaining top-level keys
///
/// Preference order: the caller's expected key, a literal `data` key, the
/// only remaining key. Several unknown keys are kept together as one object.
fn extract_data(mut map: JsonObject, data_key: Option<&str>) -> JsonValue {
    if let Some(value) = data_key.and_then(|key| map.remove(key)) {
        return value;
    }
    if let Some(value) = map.remove("data") {
        return value;
    }
    match map.len() {
        0 => JsonValue::Null,
        1 => map
            .into_iter()
            .next()
            .map_or(JsonValue::Null, |(_, value)| value),
        _ => JsonValue::Object(map),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn success_resp() -> JsonValue {
        json!({"status": "success", "respCode": 0, "respMsg": "Operation success"})
    }

    #[test]
    fn test_normalizes_named_data_key() {
        let body = json!({
            "deviceInfo": {"model": "M4300-52G"},
            "resp": success_resp(),
        });
        let env = ApiEnvelope::from_value(body, "device_info", Some("deviceInfo")).unwrap();
        assert!(env.is_success());
        assert_eq!(env.data, json!({"model": "M4300-52G"}));
        assert_eq!(env.status.code, 0);
        assert_eq!(env.status.message, "Operation success");
    }

    #[test]
    fn test_single_unknown_key_becomes_data() {
        let body = json!({"device_info": {"model": "x"}, "resp": success_resp()});
        let env = ApiEnvelope::from_value(body, "device_info", Some("deviceInfo")).unwrap();
        assert_eq!(env.data, json!({"model": "x"}));
    }

    #[test]
    fn test_literal_data_key() {
        let body = json!({"data": {"token": "abc"}, "resp": success_resp()});
        let env = ApiEnvelope::from_value(body, "login", None).unwrap();
        assert_eq!(env.data, json!({"token": "abc"}));
    }

    #[test]
    fn test_missing_payload_is_null() {
        let body = json!({"resp": {"status": "failure", "respCode": 500, "respMsg": "Internal error"}});
        let env = ApiEnvelope::from_value(body, "device_info", Some("deviceInfo")).unwrap();
        assert_eq!(env.data, JsonValue::Null);
        assert!(!env.is_success());
    }

    #[test]
    fn test_failure_envelope_into_api_error() {
        let body = json!({"resp": {"status": "failure", "respCode": 400, "respMsg": "Invalid VLAN ID"}});
        let env = ApiEnvelope::from_value(body, "swcfg_vlan", None).unwrap();
        let err = env.into_result(Method::POST, "swcfg_vlan", Some(200)).unwrap_err();
        match err {
            Error::Api {
                code,
                message,
                status,
                ..
            } => {
                assert_eq!(code, Some(400));
                assert_eq!(message, "Invalid VLAN ID");
                assert_eq!(status, Some(200));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_resp_is_malformed() {
        let err = ApiEnvelope::from_value(json!({"login": {}}), "login", None).unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_missing_status_is_malformed() {
        let body = json!({"resp": {"respCode": 0}});
        let err = ApiEnvelope::from_value(body, "logout", None).unwrap_err();
        assert!(err.to_string().contains("resp.status"));
    }

    #[test]
    fn test_non_object_resp_is_malformed() {
        let err = ApiEnvelope::from_value(json!({"resp": null}), "logout", None).unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err = ApiEnvelope::parse("<html>oops</html>", "device_info", None).unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_serializes_normalized_shape() {
        let body = json!({"logout": {}, "resp": success_resp()});
        let env = ApiEnvelope::from_value(body, "logout", Some("logout")).unwrap();
        let out = serde_json::to_value(&env).unwrap();
        assert_eq!(
            out,
            json!({
                "data": {},
                "status": {"status": "success", "code": 0, "message": "Operation success"}
            })
        );
    }
}
