use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct UserDoc {
    pub id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub discriminator: Option<String>,
    pub credits: f64,
    /// RFC 3339 timestamp
    pub joined_at: String,
}

#[derive(ToSchema)]
pub struct GiftLinkRequestDoc { pub link: String, pub phone: Option<String> }

#[derive(ToSchema)]
pub struct SlipUploadDoc {
    #[schema(value_type = String, format = Binary)]
    pub slip: Vec<u8>,
    pub amount: String,
}

#[derive(ToSchema)]
pub struct TopupResponseDoc {
    pub success: bool,
    pub amount: Option<f64>,
    pub balance: Option<f64>,
    /// Present when `success` is false
    pub message: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct InteractionDoc {
    /// 1 = PING, 2 = APPLICATION_COMMAND
    #[serde(rename = "type")]
    pub kind: u8,
    /// `{"name": "profile"}` for commands
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
pub struct InteractionResponseDoc {
    /// 1 = PONG, 4 = CHANNEL_MESSAGE_WITH_SOURCE
    #[serde(rename = "type")]
    pub kind: u8,
    /// `{"content": ..., "flags": 64}` for replies
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::callback,
        crate::routes::auth::logout,
        crate::routes::user::me,
        crate::routes::topup::gift_link,
        crate::routes::topup::slip,
        crate::routes::interactions::handle,
    ),
    components(
        schemas(
            HealthResponse,
            UserDoc,
            GiftLinkRequestDoc,
            SlipUploadDoc,
            TopupResponseDoc,
            InteractionDoc,
            InteractionResponseDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "user"),
        (name = "topup"),
        (name = "interactions")
    )
)]
pub struct ApiDoc;
