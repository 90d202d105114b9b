// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # M4300 Client
//!
//! Authenticated access to the HTTPS admin API of NETGEAR M4300 switches.
//!
//! ## Features
//!
//! - **Token Lifecycle**: Lazy login, refresh before expiry, re-login on 401
//! - **Rate Limiting**: Minimum spacing between requests to one device
//! - **Retry with Backoff**: Timeouts, connection errors and 408/429/5xx
//! - **Envelope Normalization**: `{data, status}` regardless of the raw payload key
//! - **Two Front Ends**: A session client, and a stateless call for caller-held tokens
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use m4300_client::{SwitchClient, SwitchConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SwitchConfig::builder("192.168.1.10", "admin", "secret").build()?;
//!     let mut client = SwitchClient::new(&config)?;
//!
//!     let info = client.device_info().await?;
//!     println!("{} running {}", info.model, info.sw_ver);
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────┐
//! │        SwitchClient          │       call_with_token        │
//! │  (owns credentials + token)  │   (caller-held token)        │
//! └──────────────────────────────┴──────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴──────────────────────────────┐
//! │                       RequestEngine                         │
//! │  check token → rate limit → send → retry / re-auth → parse  │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────────┬──────────────┼──────────────┬───────────────┐
//! │     Auth      │  Endpoint    │  RateLimiter │  RetryPolicy  │
//! ├───────────────┼──────────────┼──────────────┼───────────────┤
//! │ Login         │ Host check   │ governor     │ Backoff       │
//! │ TokenState    │ /api/v1 URLs │ min spacing  │ Re-auth on 401│
//! └───────────────┴──────────────┴──────────────┴───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credentials, token state and login
pub mod auth;

/// Endpoints, rate limiting, retry policy and transport
pub mod http;

/// Response envelope normalization
pub mod envelope;

/// Authenticated request engine
pub mod engine;

/// Session and stateless front ends
pub mod api;

/// Switch connection configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, FailureKind, Result};
pub use types::*;

// Re-export commonly used types
pub use api::{call_with_token, DeviceInfo, SwitchClient, VlanConfig};
pub use auth::{CredentialSource, Credentials, TokenState};
pub use config::SwitchConfig;
pub use engine::{ApiRequest, RequestEngine};
pub use envelope::{ApiEnvelope, ResponseStatus};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
