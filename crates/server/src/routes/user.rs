use axum::{Extension, Json};
use models::user::User;

use crate::session::CurrentUser;

/// Current user record. The session middleware answers 401 before this runs.
#[utoipa::path(get, path = "/api/user", tag = "user", responses(
    (status = 200, description = "Logged-in user", body = crate::openapi::UserDoc),
    (status = 401, description = "Not logged in")
))]
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<User> {
    Json(user)
}
