use thiserror::Error;

use crate::errors::ServiceError;

/// Business errors for login and session workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("oauth state mismatch")]
    StateMismatch,
    #[error("identity provider error: {0}")]
    Provider(String),
    #[error("token error: {0}")]
    Token(String),
    #[error("not logged in")]
    Unauthorized,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::StateMismatch => 1001,
            AuthError::Provider(_) => 1002,
            AuthError::Unauthorized => 1004,
            AuthError::Token(_) => 1102,
            AuthError::Service(_) => 1200,
        }
    }
}
