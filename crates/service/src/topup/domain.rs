use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use super::errors::TopupError;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TopupMethod {
    GiftLink,
    Slip,
}

impl TopupMethod {
    /// Label used in channel notifications.
    pub fn label(&self) -> &'static str {
        match self {
            TopupMethod::GiftLink => "TrueMoney",
            TopupMethod::Slip => "Slip",
        }
    }
}

/// Outcome of a credited top-up.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopupReceipt {
    pub method: TopupMethod,
    pub amount: f64,
    pub balance: f64,
}

/// A slip file stashed in the upload directory until verification finishes.
#[derive(Debug, Clone)]
pub struct SlipUpload {
    pub path: PathBuf,
    pub original_name: Option<String>,
    pub size: usize,
}

impl SlipUpload {
    /// Write the uploaded bytes under a random name inside `dir`.
    pub async fn store(dir: &Path, original_name: Option<String>, bytes: &[u8]) -> Result<Self, TopupError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| TopupError::Upload(e.to_string()))?;
        let path = dir.join(Uuid::new_v4().simple().to_string());
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| TopupError::Upload(e.to_string()))?;
        Ok(Self { path, original_name, size: bytes.len() })
    }
}

/// Parse a client-supplied amount such as `"100"` or `" 99.50 "`.
pub fn parse_amount(raw: &str) -> Result<f64, TopupError> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| TopupError::InvalidAmount(raw.to_string()))?;
    models::user::validate_amount(amount).map_err(|_| TopupError::InvalidAmount(raw.to_string()))?;
    Ok(amount)
}
