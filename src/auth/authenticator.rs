//! Login procedure
//!
//! Exchanges credentials for a bearer token. The authenticator never stores
//! the token; the caller decides where it goes (a session's [`TokenState`],
//! or straight back to a stateless caller).
//!
//! [`TokenState`]: super::TokenState

use super::types::{redact_token, Credentials, LoginToken};
use crate::envelope::ApiEnvelope;
use crate::error::{Error, Result};
use crate::http::EndpointTarget;
use crate::types::{JsonValue, Method};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Endpoint segment of the login call
pub const LOGIN_ENDPOINT: &str = "login";

/// Data key of the login payload in raw responses
pub const LOGIN_DATA_KEY: &str = "login";

/// Plain-text bodies some firmware sends instead of a JSON failure envelope
const PLAIN_TEXT_REJECTIONS: &[&str] = &["Bad credentials", "Maximum of five login attempts"];

/// Performs the login exchange against one device
#[derive(Debug, Clone)]
pub struct Authenticator {
    http_client: Client,
    target: EndpointTarget,
    timeout: Duration,
}

impl Authenticator {
    /// Create an authenticator sharing the engine's HTTP client
    pub fn with_client(http_client: Client, target: EndpointTarget, timeout: Duration) -> Self {
        Self {
            http_client,
            target,
            timeout,
        }
    }

    /// Log in and return the new token
    ///
    /// A 401, a failure envelope, or a known plain-text rejection means the
    /// credentials were refused. Nothing here is retried.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginToken> {
        credentials.validate()?;
        let url = self.target.url_for(LOGIN_ENDPOINT)?;

        debug!(user = credentials.username(), "Logging in to {}", self.target.host());

        let body = LoginRequest {
            login: LoginBody {
                username: credentials.username(),
                password: credentials.password(),
            },
        };

        let response = self
            .http_client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if status.as_u16() == 401 {
            let message = failure_message(&text)
                .unwrap_or_else(|| "invalid username or password".to_string());
            return Err(Error::InvalidCredentials {
                status: Some(401),
                message,
            });
        }

        if !status.is_success() {
            let body = serde_json::from_str::<JsonValue>(&text).ok();
            let message = failure_message(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("login request failed")
                    .to_string()
            });
            return Err(Error::Api {
                method: Method::POST,
                endpoint: LOGIN_ENDPOINT.to_string(),
                status: Some(status.as_u16()),
                code: None,
                message,
                body,
            });
        }

        let token = parse_login_body(&text)?;
        info!(
            token = %redact_token(&token.token),
            expires_in = ?token.expires_in,
            "Logged in to {}",
            self.target.host()
        );
        Ok(token)
    }

    fn transport_error(&self, error: &reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                method: Method::POST,
                endpoint: LOGIN_ENDPOINT.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            Error::Connection {
                endpoint: LOGIN_ENDPOINT.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Interpret the body of a 2xx login response
pub fn parse_login_body(text: &str) -> Result<LoginToken> {
    let value: JsonValue = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Err(plain_text_failure(text)),
    };

    let envelope = ApiEnvelope::from_value(value, LOGIN_ENDPOINT, Some(LOGIN_DATA_KEY))?;
    if !envelope.is_success() {
        let message = if envelope.status.message.is_empty() {
            "Unknown error".to_string()
        } else {
            envelope.status.message.clone()
        };
        return Err(Error::InvalidCredentials {
            status: None,
            message,
        });
    }

    let payload: LoginPayload = envelope.data_as(LOGIN_ENDPOINT)?;
    if payload.token.is_empty() {
        return Err(Error::malformed(
            LOGIN_ENDPOINT,
            "login response is missing the token",
            None,
        ));
    }

    Ok(LoginToken {
        token: payload.token,
        expires_in: payload.expire.and_then(ExpireValue::seconds),
    })
}

/// Map a non-JSON login body to a malformed-response error
///
/// Known rejection texts keep the raw body so callers can show it.
fn plain_text_failure(text: &str) -> Error {
    let trimmed = text.trim();
    if PLAIN_TEXT_REJECTIONS.iter().any(|needle| trimmed.contains(needle)) {
        Error::malformed(
            LOGIN_ENDPOINT,
            format!("device rejected credentials: {trimmed}"),
            Some(trimmed.to_string()),
        )
    } else {
        Error::malformed(LOGIN_ENDPOINT, "invalid JSON response", None)
    }
}

/// `respMsg` of a JSON failure body, or the raw text when it is not JSON
fn failure_message(text: &str) -> Option<String> {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(value) => value
            .get("resp")
            .and_then(|resp| resp.get("respMsg"))
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        Err(_) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    login: LoginBody<'a>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    token: String,
    #[serde(default, alias = "expires")]
    expire: Option<ExpireValue>,
}

/// Expiry as sent by the device: `"86400"` on real firmware, a number elsewhere
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpireValue {
    Seconds(i64),
    Text(String),
}

impl ExpireValue {
    fn seconds(self) -> Option<i64> {
        match self {
            ExpireValue::Seconds(secs) => Some(secs),
            ExpireValue::Text(text) => text.trim().parse().ok(),
        }
    }
}
