use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use service::interactions::{self, Interaction, InteractionResponse};
use tracing::warn;

use crate::errors::ApiError;
use crate::state::ServerState;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Slash-command webhook. The body is verified against the signature headers
/// before it is parsed.
#[utoipa::path(post, path = "/interactions", tag = "interactions", request_body = crate::openapi::InteractionDoc, responses(
    (status = 200, description = "PONG or an ephemeral reply", body = crate::openapi::InteractionResponseDoc),
    (status = 401, description = "Missing or invalid request signature"),
    (status = 404, description = "No application public key configured")
))]
pub async fn handle(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InteractionResponse>, ApiError> {
    let Some(verifier) = state.interactions.as_deref() else {
        return Err(ApiError::NotFound);
    };
    let (Some(signature), Some(timestamp)) = (header(&headers, SIGNATURE_HEADER), header(&headers, TIMESTAMP_HEADER)) else {
        return Err(ApiError::InvalidSignature);
    };
    if let Err(e) = verifier.verify(signature, timestamp, &body) {
        warn!(error = %e, "interaction refused");
        return Err(e.into());
    }
    let interaction: Interaction =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(format!("malformed interaction: {e}")))?;
    Ok(Json(interactions::respond(&interaction)?))
}
