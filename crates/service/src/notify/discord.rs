use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{Notifier, NotifyError, TopupEvent};

pub const DISCORD_BOT_API: &str = "https://discord.com/api/v10";
const EMBED_COLOR: u32 = 0x2ecc71;

/// Posts top-up events to a channel through the bot REST API.
pub struct DiscordNotifier {
    http: Client,
    token: String,
    channel_id: String,
    api_base: String,
}

#[derive(Deserialize)]
struct BotUser {
    username: String,
    #[serde(default)]
    discriminator: Option<String>,
}

impl DiscordNotifier {
    pub fn new(http: Client, token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self { http, token: token.into(), channel_id: channel_id.into(), api_base: DISCORD_BOT_API.into() }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Message body for a channel post: a mention plus one embed.
    pub fn message_body(event: &TopupEvent) -> Value {
        json!({
            "content": format!("<@{}>", event.user_id),
            "allowed_mentions": { "parse": [] },
            "embeds": [{
                "title": "Top-up",
                "description": event.message,
                "color": EMBED_COLOR,
                "fields": [
                    { "name": "User", "value": format!("{} ({})", event.username, event.user_id), "inline": true }
                ],
                "timestamp": event.at.to_rfc3339(),
            }]
        })
    }

    /// Check the token by asking who the bot is, and log it.
    pub async fn whoami(&self) -> Result<String, NotifyError> {
        let resp = self
            .http
            .get(format!("{}/users/@me", self.api_base))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(resp.status().as_u16()));
        }
        let bot = resp.json::<BotUser>().await.map_err(|e| NotifyError::Http(e.to_string()))?;
        let tag = match bot.discriminator.as_deref() {
            Some(d) if d != "0" => format!("{}#{}", bot.username, d),
            _ => bot.username,
        };
        info!(bot = %tag, channel_id = %self.channel_id, "notification bot logged in");
        Ok(tag)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, event: &TopupEvent) -> Result<(), NotifyError> {
        let resp = self
            .http
            .post(format!("{}/channels/{}/messages", self.api_base, self.channel_id))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&Self::message_body(event))
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(resp.status().as_u16()));
        }
        info!(user_id = %event.user_id, channel_id = %self.channel_id, "notification_sent");
        Ok(())
    }
}
