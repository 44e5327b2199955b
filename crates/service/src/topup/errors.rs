use thiserror::Error;

use crate::errors::ServiceError;

#[derive(Debug, Error)]
pub enum TopupError {
    #[error("invalid gift link")]
    InvalidGiftLink,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("upload error: {0}")]
    Upload(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}
