//! Slash commands delivered over HTTP.
//!
//! Every request carries an ed25519 signature over `timestamp || body`, made
//! with the application's key; unsigned or tampered requests are refused.

use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const PROFILE_COMMAND: &str = "profile";
pub const PROFILE_REPLY: &str = "ตรวจสอบผ่านหน้าเว็บได้เลยครับ!";
pub const UNKNOWN_COMMAND_REPLY: &str = "Unknown command";

/// Reply flag that shows the message to the invoking user only.
pub const EPHEMERAL: u64 = 1 << 6;

const PING: u8 = 1;
const APPLICATION_COMMAND: u8 = 2;
const PONG: u8 = 1;
const CHANNEL_MESSAGE: u8 = 4;

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("invalid public key: {0}")]
    InvalidKey(String),
    #[error("invalid request signature")]
    BadSignature,
    #[error("malformed interaction: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<CommandData>,
}

#[derive(Debug, Deserialize)]
pub struct CommandData {
    pub name: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ReplyData>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ReplyData {
    pub content: String,
    pub flags: u64,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self { kind: PONG, data: None }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self { kind: CHANNEL_MESSAGE, data: Some(ReplyData { content: content.into(), flags: EPHEMERAL }) }
    }
}

pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Build from the hex public key shown in the developer portal.
    pub fn from_hex(public_key: &str) -> Result<Self, InteractionError> {
        let bytes = hex::decode(public_key.trim()).map_err(|e| InteractionError::InvalidKey(e.to_string()))?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| InteractionError::InvalidKey("public key must be 32 bytes".into()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|e| InteractionError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> Result<(), InteractionError> {
        let raw = hex::decode(signature_hex.trim()).map_err(|_| InteractionError::BadSignature)?;
        let sig = Signature::from_slice(&raw).map_err(|_| InteractionError::BadSignature)?;
        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        self.key.verify(&message, &sig).map_err(|_| InteractionError::BadSignature)
    }
}

/// Answer a verified interaction.
pub fn respond(interaction: &Interaction) -> Result<InteractionResponse, InteractionError> {
    match interaction.kind {
        PING => Ok(InteractionResponse::pong()),
        APPLICATION_COMMAND => {
            let name = interaction
                .data
                .as_ref()
                .map(|d| d.name.as_str())
                .ok_or_else(|| InteractionError::Malformed("command without data".into()))?;
            info!(command = name, "slash command");
            Ok(match name {
                PROFILE_COMMAND => InteractionResponse::ephemeral(PROFILE_REPLY),
                _ => InteractionResponse::ephemeral(UNKNOWN_COMMAND_REPLY),
            })
        }
        other => Err(InteractionError::Malformed(format!("unsupported interaction type {other}"))),
    }
}
