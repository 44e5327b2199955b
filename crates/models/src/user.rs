use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Display name given to records created from a bare session id.
pub const PLACEHOLDER_USERNAME: &str = "User";

/// A portal user keyed by the identity provider's id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub credits: f64,
    #[serde(default = "Utc::now")]
    pub joined_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>, avatar: Option<String>, discriminator: Option<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            avatar,
            discriminator,
            credits: 0.0,
            joined_at: Utc::now(),
        }
    }

    pub fn placeholder(id: impl Into<String>) -> Self {
        Self::new(id, PLACEHOLDER_USERNAME, None, None)
    }

    /// Add `amount` to the balance and return the new balance. The balance is
    /// left untouched when the amount is unusable or the sum is not finite.
    pub fn credit(&mut self, amount: f64) -> Result<f64, ModelError> {
        validate_amount(amount)?;
        let next = self.credits + amount;
        if !next.is_finite() {
            return Err(ModelError::Validation(format!("balance overflow crediting {amount}")));
        }
        self.credits = next;
        Ok(next)
    }
}

/// Provider ids are numeric snowflakes; accept any non-empty ASCII alphanumeric.
pub fn validate_id(id: &str) -> Result<(), ModelError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ModelError::Validation(format!("invalid user id: {id:?}")));
    }
    Ok(())
}

pub fn validate_amount(amount: f64) -> Result<(), ModelError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ModelError::Validation(format!("amount must be a positive number, got {amount}")));
    }
    Ok(())
}
