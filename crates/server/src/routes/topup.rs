use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use service::topup::{SlipUpload, TopupError, TopupReceipt};

use crate::errors::ApiError;
use crate::metrics;
use crate::session::CurrentUser;
use crate::state::ServerState;

/// Multipart field holding the slip image.
pub const SLIP_FIELD: &str = "slip";
pub const AMOUNT_FIELD: &str = "amount";

#[derive(Debug, Deserialize)]
pub struct GiftLinkRequest {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopupResponse {
    pub success: bool,
    pub amount: f64,
    pub balance: f64,
}

impl From<TopupReceipt> for TopupResponse {
    fn from(r: TopupReceipt) -> Self {
        Self { success: true, amount: r.amount, balance: r.balance }
    }
}

fn upload_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        metrics::TOPUP_REJECTED_TOTAL.inc();
        return ApiError::UploadTooLarge;
    }
    ApiError::TopupBadRequest(format!("Malformed upload: {}", e.body_text()))
}

/// Count the outcome and shape the response. Internal failures are not
/// counted as rejections.
fn respond(result: Result<TopupReceipt, TopupError>) -> Result<Json<TopupResponse>, ApiError> {
    match result {
        Ok(receipt) => {
            metrics::TOPUPS_TOTAL.with_label_values(&[receipt.method.label()]).inc();
            Ok(Json(receipt.into()))
        }
        Err(e @ (TopupError::InvalidGiftLink | TopupError::InvalidAmount(_))) => {
            metrics::TOPUP_REJECTED_TOTAL.inc();
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(post, path = "/api/topup/truemoney", tag = "topup", request_body = crate::openapi::GiftLinkRequestDoc, responses(
    (status = 200, description = "`success` tells whether the link was credited", body = crate::openapi::TopupResponseDoc),
    (status = 401, description = "Unauthorized")
))]
pub async fn gift_link(
    State(state): State<ServerState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<GiftLinkRequest>,
) -> Result<Json<TopupResponse>, ApiError> {
    let result = state
        .topup
        .redeem_gift_link(&user, req.link.trim(), req.phone.as_deref())
        .await;
    respond(result)
}

#[utoipa::path(post, path = "/api/topup/slip", tag = "topup", request_body(content = crate::openapi::SlipUploadDoc, content_type = "multipart/form-data"), responses(
    (status = 200, description = "`success` tells whether the slip was credited", body = crate::openapi::TopupResponseDoc),
    (status = 400, description = "Amount missing or not a positive number"),
    (status = 413, description = "Slip larger than the upload limit"),
    (status = 401, description = "Unauthorized")
))]
pub async fn slip(
    State(state): State<ServerState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<TopupResponse>, ApiError> {
    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut amount = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some(SLIP_FIELD) => {
                let name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(upload_error)?;
                if name.is_some() || !bytes.is_empty() {
                    file = Some((name, bytes.to_vec()));
                }
            }
            Some(AMOUNT_FIELD) => {
                amount = field
                    .text()
                    .await
                    .map_err(upload_error)?;
            }
            _ => {}
        }
    }

    let Some((name, bytes)) = file else {
        metrics::TOPUP_REJECTED_TOTAL.inc();
        return Err(ApiError::TopupRejected("No file uploaded".into()));
    };

    let upload = SlipUpload::store(&state.upload_dir, name, &bytes).await?;
    respond(state.topup.verify_slip(&user, upload, &amount).await)
}
