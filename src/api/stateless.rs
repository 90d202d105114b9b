//! Stateless call helper
//!
//! For callers that keep the token themselves (for example across process
//! restarts). The token goes in, and a replacement comes back out only when
//! the engine had to log in again. A call that fails after such a login
//! still hands the replacement back through [`Error::TokenRenewed`].

use super::models::{LOGOUT_DATA_KEY, LOGOUT_ENDPOINT};
use crate::auth::{CredentialSource, TokenState};
use crate::engine::{ApiRequest, RequestEngine};
use crate::envelope::ApiEnvelope;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, QueryParams};
use tracing::info;

/// Execute one call with a caller-held token
///
/// Returns the envelope and `Some(new_token)` if a re-authentication
/// happened during the call, `None` if `token` is still the one to use.
/// `credentials` is only consulted when a login is needed. If the call
/// fails after a re-login, the error is [`Error::TokenRenewed`] and
/// [`Error::renewed_token`] yields the replacement.
pub async fn call_with_token<C>(
    engine: &RequestEngine,
    method: Method,
    endpoint: &str,
    token: &str,
    credentials: &C,
    body: Option<JsonValue>,
    query: Option<QueryParams>,
) -> Result<(ApiEnvelope, Option<String>)>
where
    C: CredentialSource + ?Sized,
{
    let request = ApiRequest {
        body,
        query: query.unwrap_or_default(),
        ..ApiRequest::new(method, endpoint)
    };
    execute_with_token(engine, token, credentials, &request).await
}

/// Same as [`call_with_token`], for a prepared request
pub async fn execute_with_token<C>(
    engine: &RequestEngine,
    token: &str,
    credentials: &C,
    request: &ApiRequest,
) -> Result<(ApiEnvelope, Option<String>)>
where
    C: CredentialSource + ?Sized,
{
    if token.is_empty() {
        return Err(Error::validation("token", "token is required"));
    }

    let mut tokens = TokenState::with_token(token, engine.refresh_margin());
    let generation = tokens.generation();
    let result = engine.execute(&mut tokens, credentials, request).await;

    let refreshed = if tokens.generation() == generation {
        None
    } else {
        tokens.token().map(str::to_string)
    };
    match (result, refreshed) {
        (Ok(envelope), refreshed) => Ok((envelope, refreshed)),
        (Err(source), Some(token)) => Err(Error::TokenRenewed {
            token,
            source: Box::new(source),
        }),
        (Err(e), None) => Err(e),
    }
}

/// Invalidate a caller-held token on the device
///
/// A token the device already rejects is replaced by a fresh login first,
/// and that session is the one closed, so no session is left open either way.
pub async fn logout_with_token<C>(engine: &RequestEngine, token: &str, credentials: &C) -> Result<()>
where
    C: CredentialSource + ?Sized,
{
    let request = ApiRequest::post(LOGOUT_ENDPOINT).data_key(LOGOUT_DATA_KEY);
    execute_with_token(engine, token, credentials, &request).await?;
    info!("Logged out of {}", engine.target().host());
    Ok(())
}
