//! Credential and token types

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default window before expiry in which a token is already treated as stale
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 300;

/// Username/password pair for the login endpoint
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials, rejecting empty fields
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let creds = Self {
            username: username.into(),
            password: password.into(),
        };
        creds.validate()?;
        Ok(creds)
    }

    /// Check that neither field is empty
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() {
            return Err(Error::validation("username", "username is required"));
        }
        if self.password.is_empty() {
            return Err(Error::validation("password", "password is required"));
        }
        Ok(())
    }

    /// Login name
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of credentials for (re-)authentication
///
/// Implemented by [`Credentials`] itself and by any closure returning them,
/// so a caller can look credentials up lazily, only when a login is needed.
pub trait CredentialSource {
    /// Produce the credentials to log in with
    fn credentials(&self) -> Result<Credentials>;
}

impl CredentialSource for Credentials {
    fn credentials(&self) -> Result<Credentials> {
        Ok(self.clone())
    }
}

impl<F> CredentialSource for F
where
    F: Fn() -> Result<Credentials>,
{
    fn credentials(&self) -> Result<Credentials> {
        self()
    }
}

/// Token returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginToken {
    /// Opaque bearer token
    pub token: String,
    /// Lifetime in seconds, when the device reported one
    pub expires_in: Option<i64>,
}

/// Current authentication validity of one engine session
#[derive(Debug, Clone)]
pub struct TokenState {
    token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    refresh_margin: Duration,
    generation: u64,
}

impl Default for TokenState {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS))
    }
}

impl TokenState {
    /// Create an empty state
    pub fn new(refresh_margin: Duration) -> Self {
        Self {
            token: None,
            expires_at: None,
            refresh_margin,
            generation: 0,
        }
    }

    /// Create a state holding a token obtained elsewhere, with no known expiry
    pub fn with_token(token: impl Into<String>, refresh_margin: Duration) -> Self {
        Self {
            token: Some(token.into()),
            expires_at: None,
            refresh_margin,
            generation: 0,
        }
    }

    /// Whether the token can be used at `now`
    ///
    /// False without a token, or once `now >= expiry - refresh_margin`. A
    /// token without a known expiry stays valid until the device rejects it.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_none() {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => expires_at
                .checked_sub_signed(self.refresh_margin)
                .is_some_and(|stale_at| now < stale_at),
            None => true,
        }
    }

    /// Store a token expiring `ttl_seconds` after `now`
    pub fn set(&mut self, token: impl Into<String>, ttl_seconds: Option<i64>, now: DateTime<Utc>) {
        self.token = Some(token.into());
        self.generation += 1;
        self.expires_at = ttl_seconds
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl));
    }

    /// Store the result of a login
    pub fn apply(&mut self, login: &LoginToken, now: DateTime<Utc>) {
        self.set(login.token.clone(), login.expires_in, now);
    }

    /// Forget the token
    pub fn clear(&mut self) {
        self.token = None;
        self.expires_at = None;
    }

    /// Current token, valid or not
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Absolute expiry, if known
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Configured refresh margin
    pub fn refresh_margin(&self) -> Duration {
        self.refresh_margin
    }

    /// Number of tokens stored so far; bumps on every login
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Short, log-safe form of a token
pub fn redact_token(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod type_tests {
    use super::*;

    fn margin() -> Duration {
        Duration::seconds(300)
    }

    #[test]
    fn test_empty_state_is_invalid() {
        let state = TokenState::new(margin());
        assert!(!state.is_valid(Utc::now()));
        assert!(state.token().is_none());
    }

    #[test]
    fn test_fresh_token_is_valid() {
        let now = Utc::now();
        let mut state = TokenState::new(margin());
        state.set("abc", Some(3600), now);
        assert!(state.is_valid(now));
        assert_eq!(state.expires_at(), Some(now + Duration::seconds(3600)));
    }

    #[test]
    fn test_token_inside_refresh_margin_is_stale() {
        let now = Utc::now();
        let mut state = TokenState::new(margin());
        state.set("abc", Some(3600), now);

        // exactly at expiry - margin
        assert!(!state.is_valid(now + Duration::seconds(3300)));
        assert!(state.is_valid(now + Duration::seconds(3299)));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let now = Utc::now();
        let mut state = TokenState::new(margin());
        state.set("abc", Some(-100), now);
        assert!(!state.is_valid(now));
    }

    #[test]
    fn test_token_without_expiry_stays_valid() {
        let state = TokenState::with_token("external", margin());
        assert!(state.is_valid(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn test_clear() {
        let now = Utc::now();
        let mut state = TokenState::new(margin());
        state.set("abc", Some(3600), now);
        state.clear();
        assert!(!state.is_valid(now));
        assert!(state.expires_at().is_none());
    }

    #[test]
    fn test_generation_counts_logins() {
        let now = Utc::now();
        let mut state = TokenState::with_token("external", margin());
        assert_eq!(state.generation(), 0);
        state.set("abc", Some(3600), now);
        state.clear();
        state.set("abc", Some(3600), now);
        assert_eq!(state.generation(), 2);
    }

    #[test]
    fn test_credentials_reject_empty_fields() {
        assert!(Credentials::new("", "pw").is_err());
        assert!(Credentials::new("admin", "").is_err());
        assert!(Credentials::new("admin", "pw").is_ok());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::new("admin", "hunter2").unwrap();
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("admin"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn test_closure_credential_source() {
        let source = || Credentials::new("admin", "pw");
        assert_eq!(source.credentials().unwrap().username(), "admin");
    }

    #[test]
    fn test_redact_token() {
        assert_eq!(redact_token("8c523ad44e0a8f46"), "8c523a...");
        assert_eq!(redact_token("ab"), "ab...");
    }
}
