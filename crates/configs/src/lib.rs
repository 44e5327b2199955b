use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::warn;

pub const DEV_SESSION_SECRET: &str = "dev-session-secret-change-me";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub topup: TopupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 3000, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_users_path")]
    pub users_path: String,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
}

fn default_users_path() -> String { "data/users.json".into() }
fn default_upload_dir() -> String { "uploads".into() }
fn default_public_dir() -> String { "public".into() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { users_path: default_users_path(), upload_dir: default_upload_dir(), public_dir: default_public_dir() }
    }
}

impl StorageConfig {
    /// Directory holding the users file, if the path has one.
    pub fn data_dir(&self) -> String {
        std::path::Path::new(&self.users_path)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// OAuth application credentials plus the optional notification bot.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DiscordConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub callback_url: String,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub log_channel_id: Option<String>,
    /// Application public key (hex) used to verify slash-command requests.
    #[serde(default)]
    pub public_key: Option<String>,
}

impl DiscordConfig {
    /// Public key for the interactions endpoint, when slash commands are enabled.
    pub fn interactions_key(&self) -> Option<&str> {
        self.public_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Bot token and channel together, when notifications are enabled.
    pub fn notification_target(&self) -> Option<(String, String)> {
        match (&self.bot_token, &self.log_channel_id) {
            (Some(t), Some(c)) if !t.trim().is_empty() && !c.trim().is_empty() => Some((t.clone(), c.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_secret")]
    pub secret: String,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_session_secret() -> String { DEV_SESSION_SECRET.into() }
fn default_ttl_hours() -> i64 { 24 * 7 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self { secret: default_session_secret(), ttl_hours: default_ttl_hours(), secure_cookie: false }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopupConfig {
    #[serde(default = "default_gift_delay")]
    pub gift_delay_ms: u64,
    #[serde(default = "default_slip_delay")]
    pub slip_delay_ms: u64,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

fn default_gift_delay() -> u64 { 1500 }
fn default_slip_delay() -> u64 { 2000 }
fn default_max_upload() -> usize { 10 * 1024 * 1024 }

impl Default for TopupConfig {
    fn default() -> Self {
        Self { gift_delay_ms: default_gift_delay(), slip_delay_ms: default_slip_delay(), max_upload_bytes: default_max_upload() }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), fall back to defaults when the file
    /// is absent, then apply environment overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>().is_none() {
                    return Err(e);
                }
                AppConfig::default()
            }
        };
        cfg.apply_env();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|k| std::env::var(k).ok());
    }

    /// Overlay values from a key lookup; non-empty values win over the file.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SERVER_HOST") { self.server.host = v; }
        if let Some(p) = get("PORT").or_else(|| get("SERVER_PORT")).and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = p;
        }
        if let Some(v) = get("DISCORD_CLIENT_ID") { self.discord.client_id = v; }
        if let Some(v) = get("DISCORD_CLIENT_SECRET") { self.discord.client_secret = v; }
        if let Some(v) = get("DISCORD_CALLBACK_URL") { self.discord.callback_url = v; }
        if let Some(v) = get("DISCORD_TOKEN") { self.discord.bot_token = Some(v); }
        if let Some(v) = get("LOG_CHANNEL_ID") { self.discord.log_channel_id = Some(v); }
        if let Some(v) = get("DISCORD_PUBLIC_KEY") { self.discord.public_key = Some(v); }
        if let Some(v) = get("SESSION_SECRET") { self.session.secret = v; }
        if let Some(v) = get("DATA_PATH") { self.storage.users_path = v; }
        if let Some(v) = get("UPLOAD_DIR") { self.storage.upload_dir = v; }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.discord.validate()?;
        self.session.validate()?;
        if self.storage.users_path.trim().is_empty() {
            return Err(anyhow!("storage.users_path must not be empty"));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl DiscordConfig {
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(anyhow!("DISCORD_CLIENT_ID and DISCORD_CLIENT_SECRET are required"));
        }
        let lower = self.callback_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("DISCORD_CALLBACK_URL must be an http(s) URL"));
        }
        if let Some(key) = self.public_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(anyhow!("DISCORD_PUBLIC_KEY must be 64 hex characters"));
            }
        }
        Ok(())
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(anyhow!("session.secret must not be empty"));
        }
        if self.secret == DEV_SESSION_SECRET {
            warn!("SESSION_SECRET not set; using the development secret");
        }
        if self.ttl_hours <= 0 {
            return Err(anyhow!("session.ttl_hours must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.storage.users_path, "data/users.json");
        assert_eq!(cfg.storage.data_dir(), "data");
        assert_eq!(cfg.topup.gift_delay_ms, 1500);
        assert_eq!(cfg.topup.slip_delay_ms, 2000);
        assert!(cfg.discord.notification_target().is_none());
    }

    #[test]
    fn env_overrides_file_values() -> Result<()> {
        let mut cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [discord]
            client_id = "file-id"
            "#,
        )?;
        cfg.apply_env_with(lookup(&[
            ("PORT", "4000"),
            ("DISCORD_CLIENT_SECRET", "secret"),
            ("DISCORD_CALLBACK_URL", "http://localhost:4000/auth/discord/callback"),
            ("DISCORD_TOKEN", "bot"),
            ("LOG_CHANNEL_ID", "42"),
        ]));
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 4000);
        assert_eq!(cfg.discord.client_id, "file-id");
        assert_eq!(cfg.discord.notification_target(), Some(("bot".into(), "42".into())));
        Ok(())
    }

    #[test]
    fn public_key_must_be_hex() {
        let base = [
            ("DISCORD_CLIENT_ID", "id"),
            ("DISCORD_CLIENT_SECRET", "secret"),
            ("DISCORD_CALLBACK_URL", "http://localhost:3000/auth/discord/callback"),
        ];
        let mut cfg = AppConfig::default();
        cfg.apply_env_with(lookup(&base));
        cfg.normalize_and_validate().unwrap();
        assert!(cfg.discord.interactions_key().is_none());

        let key = "a".repeat(64);
        let mut with_key = base.to_vec();
        with_key.push(("DISCORD_PUBLIC_KEY", key.as_str()));
        let mut cfg = AppConfig::default();
        cfg.apply_env_with(lookup(&with_key));
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.discord.interactions_key(), Some(key.as_str()));

        let mut bad = base.to_vec();
        bad.push(("DISCORD_PUBLIC_KEY", "not-a-key"));
        let mut cfg = AppConfig::default();
        cfg.apply_env_with(lookup(&bad));
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn missing_oauth_credentials_rejected() {
        let mut cfg = AppConfig::default();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn callback_must_be_http() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_with(lookup(&[
            ("DISCORD_CLIENT_ID", "id"),
            ("DISCORD_CLIENT_SECRET", "secret"),
            ("DISCORD_CALLBACK_URL", "localhost/callback"),
        ]));
        assert!(cfg.normalize_and_validate().is_err());
    }
}
