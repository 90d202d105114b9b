//! Request engine module
//!
//! Orchestrates one authenticated call end to end:
//!
//! ```text
//! START -> CHECK_TOKEN -> [AUTHENTICATE] -> RATE_LIMIT_WAIT -> SEND
//!            SEND -> SUCCESS
//!            SEND -> RETRY (backoff) -> RATE_LIMIT_WAIT -> SEND
//!            SEND -> REAUTH -> RATE_LIMIT_WAIT -> SEND
//!            SEND -> FAIL
//! ```
//!
//! The engine holds no token of its own. Callers pass the [`TokenState`] to
//! use, which lets the session client keep one across calls while the
//! stateless helper builds a throwaway one per call. An engine is meant for
//! sequential use; run one engine per device session for concurrency.

mod types;

pub use types::ApiRequest;

use crate::auth::{redact_token, Authenticator, CredentialSource, TokenState};
use crate::config::SwitchConfig;
use crate::envelope::ApiEnvelope;
use crate::error::{Error, Result};
use crate::http::{
    classify_transport_error, sanitize_segment, AttemptFailure, EndpointTarget, RateLimiter,
    RetryDecision, RetryPolicy,
};
use crate::types::{JsonValue, Method};
use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Authenticated request engine for one device
pub struct RequestEngine {
    http_client: Client,
    target: EndpointTarget,
    authenticator: Authenticator,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
    timeout: Duration,
    refresh_margin: chrono::Duration,
}

/// A failed send, before the retry controller has looked at it
struct FailedAttempt {
    failure: AttemptFailure,
    detail: String,
    body: Option<String>,
}

impl RequestEngine {
    /// Create an engine from a validated configuration
    pub fn new(config: &SwitchConfig) -> Result<Self> {
        config.validate()?;
        let target = config.target()?;
        let http_client = config.http_client_config().build_client()?;
        let authenticator =
            Authenticator::with_client(http_client.clone(), target.clone(), config.timeout);

        Ok(Self {
            http_client,
            target,
            authenticator,
            rate_limiter: RateLimiter::new(&config.rate_limiter_config())?,
            retry: config.retry_policy(),
            timeout: config.timeout,
            refresh_margin: config.refresh_margin(),
        })
    }

    /// Device this engine talks to
    pub fn target(&self) -> &EndpointTarget {
        &self.target
    }

    /// Retry budget and backoff curve
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Refresh margin applied to token states created by this engine
    pub fn refresh_margin(&self) -> chrono::Duration {
        self.refresh_margin
    }

    /// Empty token state using this engine's refresh margin
    pub fn new_token_state(&self) -> TokenState {
        TokenState::new(self.refresh_margin)
    }

    /// Log in and store the new token in `tokens`
    pub async fn authenticate<C>(&self, source: &C, tokens: &mut TokenState) -> Result<()>
    where
        C: CredentialSource + ?Sized,
    {
        let credentials = source.credentials()?;
        let login = self.authenticator.login(&credentials).await?;
        tokens.apply(&login, Utc::now());
        Ok(())
    }

    /// Execute one authenticated call
    ///
    /// Logs in first when `tokens` is unset or inside its refresh margin. A
    /// 401 clears `tokens`, logs in again and resends without delay, as long
    /// as attempts remain. Timeouts, connection failures and statuses 408,
    /// 429, 500, 502, 503 and 504 are resent after `min(2^attempt, 10)` s.
    pub async fn execute<C>(
        &self,
        tokens: &mut TokenState,
        source: &C,
        request: &ApiRequest,
    ) -> Result<ApiEnvelope>
    where
        C: CredentialSource + ?Sized,
    {
        let method = request.method;
        let endpoint = sanitize_segment(&request.endpoint)?;
        let url = self.target.url_for(&endpoint)?;

        if !tokens.is_valid(Utc::now()) {
            if tokens.token().is_some() {
                debug!("Token for {} is stale, re-authenticating", self.target.host());
                tokens.clear();
            }
            self.authenticate(source, tokens).await?;
        }

        let max_attempts = self.retry.max_attempts;
        let mut attempt: u32 = 1;
        loop {
            let token = tokens
                .token()
                .map(str::to_string)
                .ok_or_else(|| Error::TokenExpired {
                    method,
                    endpoint: endpoint.clone(),
                })?;

            self.rate_limiter.wait_if_needed().await;

            let failed = match self.send_once(&url, request, &token).await {
                Ok((status, text)) if (200..300).contains(&status) => {
                    debug!("{method} {endpoint} -> {status}");
                    return ApiEnvelope::parse(&text, &endpoint, request.data_key.as_deref())?
                        .into_result(method, &endpoint, Some(status));
                }
                Ok((status, text)) => FailedAttempt {
                    failure: AttemptFailure::from_status(status),
                    detail: format!("HTTP {status}"),
                    body: Some(text),
                },
                Err(failed) => failed,
            };

            match self.retry.decide(attempt, failed.failure) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        "{} {} failed ({}), attempt {}/{}, retrying in {:?}",
                        method, endpoint, failed.failure, attempt, max_attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Reauthenticate => {
                    warn!(
                        "{} {} rejected token {}, attempt {}/{}, re-authenticating",
                        method,
                        endpoint,
                        redact_token(&token),
                        attempt,
                        max_attempts
                    );
                    tokens.clear();
                    self.authenticate(source, tokens).await?;
                }
                RetryDecision::GiveUp => {
                    return Err(fatal_error(method, &endpoint, failed));
                }
                RetryDecision::Exhausted => {
                    if failed.failure == AttemptFailure::Unauthorized {
                        tokens.clear();
                    }
                    return Err(exhausted_error(method, &endpoint, attempt, failed));
                }
            }
            attempt += 1;
        }
    }

    async fn send_once(
        &self,
        url: &Url,
        request: &ApiRequest,
        token: &str,
    ) -> std::result::Result<(u16, String), FailedAttempt> {
        let mut req = self
            .http_client
            .request(request.method.into(), url.clone())
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout);

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        if let Some(ref body) = request.body {
            if request.method.allows_body() {
                req = req.json(body);
            }
        }

        debug!("Sending {} {}", request.method, url.path());

        let response = req.send().await.map_err(transport_failure)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_failure)?;
        Ok((status, text))
    }
}

impl std::fmt::Debug for RequestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEngine")
            .field("target", &self.target)
            .field("retry", &self.retry)
            .field("rate_limiter", &self.rate_limiter)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn transport_failure(error: reqwest::Error) -> FailedAttempt {
    FailedAttempt {
        failure: classify_transport_error(&error),
        detail: error.to_string(),
        body: None,
    }
}

/// `respCode` and `respMsg` of a failure body, if it is an envelope
fn parse_failure_body(body: Option<&str>) -> (Option<JsonValue>, Option<i64>, Option<String>) {
    let Some(json) = body.and_then(|text| serde_json::from_str::<JsonValue>(text).ok()) else {
        return (None, None, None);
    };
    let resp = json.get("resp");
    let code = resp.and_then(|r| r.get("respCode")).and_then(JsonValue::as_i64);
    let message = resp
        .and_then(|r| r.get("respMsg"))
        .and_then(JsonValue::as_str)
        .map(str::to_string);
    (Some(json), code, message)
}

fn fatal_error(method: Method, endpoint: &str, failed: FailedAttempt) -> Error {
    let Some(status) = failed.failure.status() else {
        return Error::Connection {
            endpoint: endpoint.to_string(),
            message: failed.detail,
        };
    };

    let (body, code, message) = parse_failure_body(failed.body.as_deref());
    let message = message
        .or_else(|| {
            failed
                .body
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        })
        .or_else(|| {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "request failed".to_string());

    Error::Api {
        method,
        endpoint: endpoint.to_string(),
        status: Some(status),
        code,
        message,
        body,
    }
}

fn exhausted_error(method: Method, endpoint: &str, attempts: u32, failed: FailedAttempt) -> Error {
    match failed.failure {
        AttemptFailure::Status(429) => Error::RateLimited {
            method,
            endpoint: endpoint.to_string(),
            attempts,
        },
        AttemptFailure::Unauthorized => Error::TokenExpired {
            method,
            endpoint: endpoint.to_string(),
        },
        failure => {
            let (_, _, message) = parse_failure_body(failed.body.as_deref());
            let last_error = match message {
                Some(message) => format!("{}: {message}", failed.detail),
                None => failed.detail,
            };
            Error::RetriesExhausted {
                method,
                endpoint: endpoint.to_string(),
                attempts,
                status: failure.status(),
                last_error,
                cause: failure.kind(),
            }
        }
    }
}
