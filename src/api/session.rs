//! Session client
//!
//! Owns one engine, one set of credentials and one token for a switch.

use super::models::{
    DeviceInfo, VlanConfig, DEVICE_INFO_DATA_KEY, DEVICE_INFO_ENDPOINT, LOGOUT_DATA_KEY,
    LOGOUT_ENDPOINT, VLAN_DATA_KEY, VLAN_ENDPOINT,
};
use crate::auth::{Credentials, TokenState};
use crate::config::SwitchConfig;
use crate::engine::{ApiRequest, RequestEngine};
use crate::envelope::ApiEnvelope;
use crate::error::Result;
use crate::types::{JsonValue, Method, QueryParams};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info};

/// Stateful client for one switch
///
/// Logs in lazily on the first call and keeps the token until it nears
/// expiry or the device rejects it. Calls take `&mut self`, so one client
/// serves one task at a time.
#[derive(Debug)]
pub struct SwitchClient {
    engine: RequestEngine,
    credentials: Credentials,
    tokens: TokenState,
}

impl SwitchClient {
    /// Create a client; no network traffic happens until the first call
    pub fn new(config: &SwitchConfig) -> Result<Self> {
        let engine = RequestEngine::new(config)?;
        let credentials = config.credentials()?;
        let tokens = engine.new_token_state();
        Ok(Self {
            engine,
            credentials,
            tokens,
        })
    }

    /// Create a client from `M4300_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(&SwitchConfig::from_env()?)
    }

    /// Underlying engine
    pub fn engine(&self) -> &RequestEngine {
        &self.engine
    }

    /// Current token, if logged in
    pub fn token(&self) -> Option<&str> {
        self.tokens.token()
    }

    /// Expiry of the current token, if known
    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.tokens.expires_at()
    }

    /// Whether the current token is usable without logging in again
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_valid(Utc::now())
    }

    /// Log in now, replacing any current token
    pub async fn authenticate(&mut self) -> Result<()> {
        self.tokens.clear();
        self.engine
            .authenticate(&self.credentials, &mut self.tokens)
            .await
    }

    /// Execute an arbitrary call
    pub async fn execute(&mut self, request: &ApiRequest) -> Result<ApiEnvelope> {
        self.engine
            .execute(&mut self.tokens, &self.credentials, request)
            .await
    }

    /// Execute a call described by its parts
    pub async fn request(
        &mut self,
        method: Method,
        endpoint: &str,
        body: Option<JsonValue>,
        query: Option<QueryParams>,
    ) -> Result<ApiEnvelope> {
        let request = ApiRequest {
            body,
            query: query.unwrap_or_default(),
            ..ApiRequest::new(method, endpoint)
        };
        self.execute(&request).await
    }

    /// GET an endpoint
    pub async fn get(&mut self, endpoint: &str) -> Result<ApiEnvelope> {
        self.execute(&ApiRequest::get(endpoint)).await
    }

    /// POST a JSON body to an endpoint
    pub async fn post(&mut self, endpoint: &str, body: JsonValue) -> Result<ApiEnvelope> {
        self.execute(&ApiRequest::post(endpoint).json(body)).await
    }

    /// DELETE an endpoint
    pub async fn delete(&mut self, endpoint: &str) -> Result<ApiEnvelope> {
        self.execute(&ApiRequest::delete(endpoint)).await
    }

    /// Hardware details, status and sensor readings
    pub async fn device_info(&mut self) -> Result<DeviceInfo> {
        let request = ApiRequest::get(DEVICE_INFO_ENDPOINT).data_key(DEVICE_INFO_DATA_KEY);
        self.execute(&request)
            .await?
            .data_as(DEVICE_INFO_ENDPOINT)
    }

    /// Read one VLAN
    pub async fn get_vlan(&mut self, vlan_id: u16) -> Result<VlanConfig> {
        let request = ApiRequest::get(VLAN_ENDPOINT)
            .query("vlanid", vlan_id)
            .data_key(VLAN_DATA_KEY);
        self.execute(&request).await?.data_as(VLAN_ENDPOINT)
    }

    /// Create or update a VLAN
    pub async fn set_vlan(&mut self, vlan: &VlanConfig) -> Result<ApiEnvelope> {
        let request = ApiRequest::post(VLAN_ENDPOINT)
            .json(json!({ VLAN_DATA_KEY: vlan }))
            .data_key(VLAN_DATA_KEY);
        self.execute(&request).await
    }

    /// Delete a VLAN
    pub async fn delete_vlan(&mut self, vlan_id: u16) -> Result<ApiEnvelope> {
        let request = ApiRequest::delete(VLAN_ENDPOINT)
            .query("vlanid", vlan_id)
            .data_key(VLAN_DATA_KEY);
        self.execute(&request).await
    }

    /// Invalidate the token on the device and forget it
    ///
    /// Without a usable token there is nothing to invalidate, so this only
    /// drops whatever stale token is held.
    pub async fn logout(&mut self) -> Result<()> {
        if !self.is_authenticated() {
            debug!("No active session on {}, skipping logout", self.engine.target().host());
            self.tokens.clear();
            return Ok(());
        }

        let request = ApiRequest::post(LOGOUT_ENDPOINT).data_key(LOGOUT_DATA_KEY);
        self.execute(&request).await?;
        self.tokens.clear();
        info!("Logged out of {}", self.engine.target().host());
        Ok(())
    }
}
