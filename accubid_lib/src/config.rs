//! Connector configuration loaded from TOML with environment overrides.
//!
//! ```toml
//! environment = "production"
//!
//! [api_client]
//! max_retries = 3
//! timeout_seconds = 30
//!
//! [auth]
//! client_id = "..."
//! client_secret = "..."
//! refresh_token = "..."
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use accubid_api::{
    ApiClient, ApiClientConfig, ClientAuthentication, Environment, OAuth2CodeFlow,
    OAuth2Settings, StaticToken, TokenProvider,
};
use serde::Deserialize;

use crate::error::ConnectorError;

pub const ENV_MAX_RETRIES: &str = "ACCUBID_MAX_RETRIES";
pub const ENV_TIMEOUT_SECONDS: &str = "ACCUBID_TIMEOUT_SECONDS";
pub const ENV_ENVIRONMENT: &str = "ACCUBID_ENVIRONMENT";
pub const ENV_ACCESS_TOKEN: &str = "ACCUBID_ACCESS_TOKEN";
pub const ENV_REFRESH_TOKEN: &str = "ACCUBID_REFRESH_TOKEN";
pub const ENV_CLIENT_ID: &str = "ACCUBID_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ACCUBID_CLIENT_SECRET";

/// Everything needed to build an [`ApiClient`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub api_client: ApiClientConfig,
    /// Required; there is no default deployment.
    pub environment: Option<Environment>,
    /// Overrides the environment's base URL, e.g. for a proxy.
    pub base_url: Option<String>,
    pub auth: AuthConfig,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_authentication: ClientAuthentication,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> Option<&'static str> {
            value.as_ref().map(|_| "[REDACTED]")
        }
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("client_authentication", &self.client_authentication)
            .finish()
    }
}

impl ConnectorConfig {
    /// Reads a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConnectorError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConnectorError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies `ACCUBID_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConnectorError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Empty values are ignored, as are
    /// numeric values that fail to parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConnectorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            match value.trim().parse::<u32>() {
                Ok(n) => self.api_client.max_retries = n,
                Err(_) => tracing::warn!("Ignoring invalid {}: {}", ENV_MAX_RETRIES, value),
            }
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECONDS) {
            match value.trim().parse::<u64>() {
                Ok(n) => self.api_client.timeout_seconds = n,
                Err(_) => tracing::warn!("Ignoring invalid {}: {}", ENV_TIMEOUT_SECONDS, value),
            }
        }
        if let Some(value) = lookup(ENV_ENVIRONMENT) {
            self.environment = Some(value.parse::<Environment>()?);
        }
        if let Some(value) = lookup(ENV_ACCESS_TOKEN) {
            self.auth.access_token = Some(value);
        }
        if let Some(value) = lookup(ENV_REFRESH_TOKEN) {
            self.auth.refresh_token = Some(value);
        }
        if let Some(value) = lookup(ENV_CLIENT_ID) {
            self.auth.client_id = Some(value);
        }
        if let Some(value) = lookup(ENV_CLIENT_SECRET) {
            self.auth.client_secret = Some(value);
        }
        Ok(())
    }

    pub fn environment(&self) -> Result<Environment, ConnectorError> {
        self.environment.ok_or_else(|| {
            ConnectorError::Config(format!(
                "No connection environment selected; set `environment` or {}",
                ENV_ENVIRONMENT
            ))
        })
    }

    /// Picks the token source from the configured credentials.
    ///
    /// Client credentials plus a refresh token select the OAuth2 code flow;
    /// a bare access token is used as-is.
    pub fn token_provider(&self) -> Result<Arc<dyn TokenProvider>, ConnectorError> {
        let auth = &self.auth;
        match (&auth.client_id, &auth.client_secret, &auth.refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                let mut settings = OAuth2Settings::accubid(client_id.clone(), client_secret.clone());
                settings.client_authentication = auth.client_authentication;
                let flow = OAuth2CodeFlow::new(settings)?.with_refresh_token(refresh_token.clone());
                tracing::debug!("Using OAuth2 refresh-token authentication");
                Ok(Arc::new(flow))
            }
            _ => match &auth.access_token {
                Some(token) => {
                    tracing::debug!("Using static access token authentication");
                    Ok(Arc::new(StaticToken::new(token.clone())))
                }
                None => Err(ConnectorError::Config(format!(
                    "No credentials configured; set {} or {}, {} and {}",
                    ENV_ACCESS_TOKEN, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_REFRESH_TOKEN
                ))),
            },
        }
    }

    pub fn build_client(&self) -> Result<ApiClient, ConnectorError> {
        let auth = self.token_provider()?;
        let client = match &self.base_url {
            Some(base_url) => ApiClient::with_base_url(base_url, &self.api_client, auth)?,
            None => ApiClient::new(&self.api_client, self.environment()?, auth)?,
        };
        tracing::info!("Using Accubid API at {}", client.base_url());
        Ok(client)
    }
}
