//! Bearer-token providers.
//!
//! The client asks its [`TokenProvider`] for a token once per logical call,
//! before the retry loop starts, so an auth failure never consumes a retry
//! attempt. [`OAuth2CodeFlow`] implements the Trimble Identity
//! authorization-code flow used by Accubid Anywhere, refreshing the access
//! token shortly before it expires.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::response::truncate_body;
use crate::Error;

pub const TRIMBLE_AUTHORIZATION_URL: &str = "https://id.trimble.com/oauth/authorize";
pub const TRIMBLE_TOKEN_URL: &str = "https://id.trimble.com/oauth/token";
pub const ACCUBID_SCOPE: &str = "openid accubid.api";

/// Request timeout for token endpoint calls.
const TOKEN_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Source of bearer tokens for outbound API requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a currently valid access token, refreshing it if needed.
    async fn bearer_token(&self, cancel: &CancellationToken) -> Result<String, Error>;
}

/// A fixed, externally managed access token.
pub struct StaticToken {
    token: SecretString,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self, _cancel: &CancellationToken) -> Result<String, Error> {
        let token = self.token.expose_secret();
        if token.is_empty() {
            return Err(Error::Auth("No access token configured".to_string()));
        }
        Ok(token.clone())
    }
}

/// How the client credentials are presented to the token endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthentication {
    /// HTTP Basic `Authorization` header.
    #[default]
    BasicAuthHeader,
    /// `client_id` / `client_secret` form fields.
    RequestBody,
}

/// Endpoints and credentials for the authorization-code flow.
#[derive(Debug)]
pub struct OAuth2Settings {
    pub authorization_url: String,
    pub token_url: String,
    pub refresh_url: String,
    pub scope: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub client_authentication: ClientAuthentication,
}

impl OAuth2Settings {
    /// Trimble Identity settings for Accubid Anywhere.
    pub fn accubid(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            authorization_url: TRIMBLE_AUTHORIZATION_URL.to_string(),
            token_url: TRIMBLE_TOKEN_URL.to_string(),
            refresh_url: TRIMBLE_TOKEN_URL.to_string(),
            scope: ACCUBID_SCOPE.to_string(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            client_authentication: ClientAuthentication::BasicAuthHeader,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[allow(dead_code)]
    #[serde(default)]
    token_type: Option<String>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Returns true if the token is expired or will expire within the grace period.
    fn is_expired(&self, grace_period: Duration) -> bool {
        Utc::now() + grace_period >= self.expires_at
    }
}

#[derive(Default)]
struct TokenState {
    access: Option<CachedToken>,
    refresh_token: Option<String>,
}

/// OAuth2 authorization-code flow with refresh-token renewal.
pub struct OAuth2CodeFlow {
    settings: OAuth2Settings,
    http: reqwest::Client,
    state: RwLock<TokenState>,
    /// Tokens expiring within this window are refreshed ahead of use.
    grace_period: Duration,
}

impl OAuth2CodeFlow {
    pub fn new(settings: OAuth2Settings) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            settings,
            http,
            state: RwLock::new(TokenState::default()),
            grace_period: Duration::minutes(5),
        })
    }

    /// Seeds the flow with a refresh token obtained in an earlier session.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.state.get_mut().refresh_token = Some(refresh_token.into());
        self
    }

    /// Seeds the flow with an access token and its expiry.
    pub fn with_access_token(
        mut self,
        access_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        self.state.get_mut().access = Some(CachedToken {
            access_token: access_token.into(),
            expires_at,
        });
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn settings(&self) -> &OAuth2Settings {
        &self.settings
    }

    /// Consent URL the user is sent to in order to start the flow.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url, Error> {
        let mut url = Url::parse(&self.settings.authorization_url)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.settings.scope)
            .append_pair("state", state);
        Ok(url)
    }

    /// Exchanges an authorization code for a token set and caches it.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let params = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", redirect_uri.to_string()),
        ];
        let response = self
            .request_token(&self.settings.token_url, params, cancel)
            .await?;
        let mut state = self.state.write().await;
        store_token(&mut state, response)?;
        tracing::debug!("Exchanged authorization code for access token");
        Ok(())
    }

    /// Current refresh token, for persisting between sessions.
    pub async fn refresh_token(&self) -> Option<String> {
        self.state.read().await.refresh_token.clone()
    }

    /// Drops the cached access token, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        self.state.write().await.access = None;
    }

    async fn refresh(&self, cancel: &CancellationToken) -> Result<String, Error> {
        let mut state = self.state.write().await;

        // another caller may have refreshed while we waited for the lock
        if let Some(token) = &state.access {
            if !token.is_expired(self.grace_period) {
                return Ok(token.access_token.clone());
            }
        }

        let refresh_token = state.refresh_token.clone().ok_or_else(|| {
            Error::Auth(
                "No refresh token available; complete the authorization code flow first"
                    .to_string(),
            )
        })?;

        tracing::debug!("Refreshing access token");
        let params = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token),
        ];
        let response = self
            .request_token(&self.settings.refresh_url, params, cancel)
            .await?;
        let access_token = response.access_token.clone();
        store_token(&mut state, response)?;
        Ok(access_token)
    }

    async fn request_token(
        &self,
        url: &str,
        mut params: Vec<(&'static str, String)>,
        cancel: &CancellationToken,
    ) -> Result<TokenResponse, Error> {
        params.push(("scope", self.settings.scope.clone()));
        let mut request = self.http.post(url);
        match self.settings.client_authentication {
            ClientAuthentication::BasicAuthHeader => {
                request = request.basic_auth(
                    &self.settings.client_id,
                    Some(self.settings.client_secret.expose_secret()),
                );
            }
            ClientAuthentication::RequestBody => {
                params.push(("client_id", self.settings.client_id.clone()));
                params.push((
                    "client_secret",
                    self.settings.client_secret.expose_secret().clone(),
                ));
            }
        }

        let exchange = async {
            let response = request
                .form(&params)
                .send()
                .await
                .map_err(|e| Error::Auth(format!("Token request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::error!("Token request failed with status {}", status);
                return Err(Error::Auth(format!(
                    "Token request failed with status {}: {}",
                    status,
                    truncate_body(&body)
                )));
            }

            response
                .json::<TokenResponse>()
                .await
                .map_err(|e| Error::Auth(format!("Failed to parse token response: {}", e)))
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = exchange => result,
        }
    }
}

fn store_token(state: &mut TokenState, response: TokenResponse) -> Result<(), Error> {
    let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    let expires_at = Duration::try_seconds(expires_in)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| Error::Auth(format!("Invalid expires_in in token response: {}", expires_in)))?;
    state.access = Some(CachedToken {
        access_token: response.access_token,
        expires_at,
    });
    // servers that rotate refresh tokens send a new one with every grant
    if let Some(refresh_token) = response.refresh_token {
        state.refresh_token = Some(refresh_token);
    }
    tracing::debug!(
        "Access token expires at {}",
        expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

#[async_trait]
impl TokenProvider for OAuth2CodeFlow {
    async fn bearer_token(&self, cancel: &CancellationToken) -> Result<String, Error> {
        {
            let state = self.state.read().await;
            if let Some(token) = &state.access {
                if !token.is_expired(self.grace_period) {
                    return Ok(token.access_token.clone());
                }
            }
        }
        self.refresh(cancel).await
    }
}
