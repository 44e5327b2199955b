use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use models::user::User;
use service::auth::session::SESSION_COOKIE;

use crate::errors::ApiError;
use crate::state::ServerState;

/// The logged-in user, inserted into request extensions by the session middleware.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

async fn resolve(state: &ServerState, jar: &CookieJar) -> Result<User, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::NotLoggedIn)?;
    Ok(state.auth.current_user(&token).await?)
}

/// Middleware for `/api/user`: 401 `{"error": "Not logged in"}` without a valid session.
pub async fn require_session(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve(&state, &jar).await {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Middleware for top-up routes: same check, answered in the top-up body shape.
pub async fn require_session_topup(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve(&state, &jar).await {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Err(ApiError::NotLoggedIn) => ApiError::Unauthorized.into_response(),
        Err(e) => e.into_response(),
    }
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Short-lived cookie carrying the OAuth `state` between redirect and callback.
pub fn state_cookie(name: &'static str, state: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, state);
    cookie.set_path("/auth");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// A cookie matching `name`/`path`, for removal from the jar.
pub fn removal(name: &'static str, path: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::from(name);
    cookie.set_path(path);
    cookie
}
