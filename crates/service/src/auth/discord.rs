use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::domain::ProviderProfile;
use super::errors::AuthError;
use super::provider::IdentityProvider;

pub const DISCORD_API_BASE: &str = "https://discord.com/api";
pub const DISCORD_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
pub const DISCORD_SCOPES: &str = "identify guilds";

/// Discord OAuth2 application credentials.
#[derive(Clone, Debug)]
pub struct DiscordOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Authorization-code client for Discord: redirect, token exchange, `/users/@me`.
pub struct DiscordProvider {
    http: Client,
    cfg: DiscordOAuthConfig,
    api_base: String,
    authorize_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

#[derive(Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    discriminator: Option<String>,
}

impl From<DiscordUser> for ProviderProfile {
    fn from(u: DiscordUser) -> Self {
        ProviderProfile { id: u.id, username: u.username, avatar: u.avatar, discriminator: u.discriminator }
    }
}

impl DiscordProvider {
    pub fn new(http: Client, cfg: DiscordOAuthConfig) -> Self {
        Self { http, cfg, api_base: DISCORD_API_BASE.into(), authorize_url: DISCORD_AUTHORIZE_URL.into() }
    }

    /// Point the client at another API host and authorize page.
    pub fn with_endpoints(mut self, api_base: impl Into<String>, authorize_url: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.authorize_url = authorize_url.into();
        self
    }

    async fn fetch_token(&self, code: &str) -> Result<TokenResponse, AuthError> {
        let form = [
            ("client_id", self.cfg.client_id.as_str()),
            ("client_secret", self.cfg.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.cfg.redirect_uri.as_str()),
        ];
        let resp = self
            .http
            .post(format!("{}/oauth2/token", self.api_base))
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AuthError::Provider(format!("token exchange failed: {}", resp.status())));
        }
        resp.json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<DiscordUser, AuthError> {
        let resp = self
            .http
            .get(format!("{}/users/@me", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AuthError::Provider(format!("profile fetch failed: {}", resp.status())));
        }
        resp.json::<DiscordUser>()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for DiscordProvider {
    fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.cfg.client_id.as_str()),
                ("scope", DISCORD_SCOPES),
                ("redirect_uri", self.cfg.redirect_uri.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::Provider(e.to_string()))?;
        Ok(url.into())
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, AuthError> {
        let token = self.fetch_token(code).await?;
        debug!(token_type = token.token_type.as_deref().unwrap_or("Bearer"), "oauth code exchanged");
        let user = self.fetch_profile(&token.access_token).await?;
        Ok(user.into())
    }
}
