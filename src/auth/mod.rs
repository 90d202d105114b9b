//! Authentication module
//!
//! Credentials, token validity tracking, and the login exchange.
//!
//! The `Authenticator` only talks to the device; `TokenState` only keeps
//! time. The request engine wires the two together.

mod authenticator;
mod types;

pub use authenticator::{parse_login_body, Authenticator, LOGIN_DATA_KEY, LOGIN_ENDPOINT};
pub use types::{
    redact_token, CredentialSource, Credentials, LoginToken, TokenState,
    DEFAULT_REFRESH_MARGIN_SECS,
};

#[cfg(test)]
mod tests;
