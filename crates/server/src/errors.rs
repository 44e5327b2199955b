use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::{ErrorBody, MessageBody};
use service::auth::errors::AuthError;
use service::interactions::InteractionError;
use service::topup::TopupError;
use thiserror::Error;
use tracing::error;

/// Errors returned by handlers. Top-up endpoints answer in the
/// `{success, message}` shape, everything else in `{error}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    TopupRejected(String),
    #[error("{0}")]
    TopupBadRequest(String),
    #[error("File too large")]
    UploadTooLarge,
    #[error("invalid request signature")]
    InvalidSignature,
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotLoggedIn | ApiError::Unauthorized | ApiError::InvalidSignature => StatusCode::UNAUTHORIZED,
            // the frontend reads `success`; a rejected voucher is not a transport error
            ApiError::TopupRejected(_) => StatusCode::OK,
            ApiError::TopupBadRequest(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UploadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::NotLoggedIn | ApiError::InvalidSignature | ApiError::BadRequest(_) | ApiError::NotFound => {
                (status, Json(ErrorBody { error: self.to_string() })).into_response()
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                (status, Json(ErrorBody { error: "internal server error".into() })).into_response()
            }
            ApiError::Unauthorized
            | ApiError::TopupRejected(_)
            | ApiError::TopupBadRequest(_)
            | ApiError::UploadTooLarge => {
                (status, Json(MessageBody::failure(self.to_string()))).into_response()
            }
        }
    }
}

impl From<TopupError> for ApiError {
    fn from(e: TopupError) -> Self {
        match e {
            TopupError::InvalidGiftLink => ApiError::TopupRejected("Invalid gift link".into()),
            TopupError::InvalidAmount(_) => ApiError::TopupBadRequest("Invalid amount".into()),
            TopupError::Upload(msg) => ApiError::Internal(msg),
            TopupError::Service(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthorized | AuthError::StateMismatch => ApiError::NotLoggedIn,
            other => ApiError::Internal(format!("[{}] {}", other.code(), other)),
        }
    }
}

impl From<InteractionError> for ApiError {
    fn from(e: InteractionError) -> Self {
        match e {
            InteractionError::BadSignature => ApiError::InvalidSignature,
            InteractionError::Malformed(msg) => ApiError::BadRequest(msg),
            InteractionError::InvalidKey(msg) => ApiError::Internal(msg),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
}
