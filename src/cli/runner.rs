//! CLI runner - executes commands

use crate::api::{call_with_token, logout_with_token, SwitchClient, VlanConfig};
use crate::cli::commands::{Cli, Commands, OutputFormat, VlanAction};
use crate::config::SwitchConfig;
use crate::engine::RequestEngine;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method};
use serde::Serialize;
use serde_json::json;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        if self.cli.verbose {
            eprintln!("Using {config:?}");
        }

        match &self.cli.command {
            Commands::Login => self.login(&config).await,
            Commands::DeviceInfo => self.device_info(&config).await,
            Commands::Vlan { action } => self.vlan(&config, action).await,
            Commands::Request {
                method,
                endpoint,
                body,
                token,
            } => {
                self.request(&config, method, endpoint, body.as_deref(), token.as_deref())
                    .await
            }
            Commands::Logout { token } => self.logout(&config, token.as_deref()).await,
        }
    }

    /// Load config from `--config` or the environment
    fn load_config(&self) -> Result<SwitchConfig> {
        match self.cli.config {
            Some(ref path) => SwitchConfig::from_yaml_file(path),
            None => SwitchConfig::from_env(),
        }
    }

    async fn login(&self, config: &SwitchConfig) -> Result<()> {
        let mut client = SwitchClient::new(config)?;
        client.authenticate().await?;
        self.output(&json!({
            "token": client.token(),
            "expires_at": client.token_expires_at().map(|t| t.to_rfc3339()),
        }))
    }

    async fn device_info(&self, config: &SwitchConfig) -> Result<()> {
        let mut client = SwitchClient::new(config)?;
        let info = client.device_info().await?;
        self.output(&info)
    }

    async fn vlan(&self, config: &SwitchConfig, action: &VlanAction) -> Result<()> {
        let mut client = SwitchClient::new(config)?;
        match action {
            VlanAction::Get { id } => {
                let vlan = client.get_vlan(*id).await?;
                self.output(&vlan)
            }
            VlanAction::Set { id, name } => {
                let vlan = VlanConfig {
                    name: name.clone(),
                    ..VlanConfig::new(*id)
                };
                let envelope = client.set_vlan(&vlan).await?;
                self.output(&envelope)
            }
            VlanAction::Delete { id } => {
                let envelope = client.delete_vlan(*id).await?;
                self.output(&envelope)
            }
        }
    }

    async fn request(
        &self,
        config: &SwitchConfig,
        method: &str,
        endpoint: &str,
        body: Option<&str>,
        token: Option<&str>,
    ) -> Result<()> {
        let method: Method = method.parse()?;
        let body = body
            .map(serde_json::from_str::<JsonValue>)
            .transpose()
            .map_err(|e| Error::validation("body", format!("invalid JSON body: {e}")))?;

        let Some(token) = token else {
            let mut client = SwitchClient::new(config)?;
            let envelope = client.request(method, endpoint, body, None).await?;
            return self.output(&envelope);
        };

        let engine = RequestEngine::new(config)?;
        let credentials = config.credentials()?;
        let result =
            call_with_token(&engine, method, endpoint, token, &credentials, body, None).await;
        let (envelope, new_token) = result.inspect_err(report_renewed)?;
        if let Some(new_token) = new_token {
            eprintln!("Token renewed: {new_token}");
        }
        self.output(&envelope)
    }

    async fn logout(&self, config: &SwitchConfig, token: Option<&str>) -> Result<()> {
        match token {
            Some(token) => {
                let engine = RequestEngine::new(config)?;
                let credentials = config.credentials()?;
                logout_with_token(&engine, token, &credentials).await?;
            }
            // Without a token there is no existing session to close; this only
            // checks that login and logout both work against the device
            None => {
                let mut client = SwitchClient::new(config)?;
                client.authenticate().await?;
                client.logout().await?;
            }
        }
        self.output(&json!({"logged_out": true}))
    }

    /// Print a value in the selected format
    fn output<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value),
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
        }
        .map_err(|e| Error::config(format!("failed to render output: {e}")))?;
        println!("{rendered}");
        Ok(())
    }
}

fn report_renewed(error: &Error) {
    if let Some(token) = error.renewed_token() {
        eprintln!("Token renewed: {token}");
    }
}
