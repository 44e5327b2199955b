use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use service::auth::session::{SESSION_COOKIE, STATE_COOKIE};
use tracing::warn;
use utoipa::IntoParams;

use crate::errors::ApiError;
use crate::metrics;
use crate::session::{removal, session_cookie, state_cookie};
use crate::state::ServerState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Start the OAuth login: remember a fresh state and redirect to the provider.
#[utoipa::path(get, path = "/auth/discord", tag = "auth", responses((status = 303, description = "Redirect to the identity provider")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar) -> Result<(CookieJar, Redirect), ApiError> {
    let redirect = state.auth.begin_login()?;
    let jar = jar.add(state_cookie(STATE_COOKIE, redirect.state, state.cookies.secure));
    Ok((jar, Redirect::to(&redirect.url)))
}

/// OAuth callback. Every failure lands back on `/` without a session.
#[utoipa::path(get, path = "/auth/discord/callback", tag = "auth", params(CallbackQuery), responses((status = 303, description = "Redirect to /")))]
pub async fn callback(
    State(state): State<ServerState>,
    jar: CookieJar,
    Query(q): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(removal(STATE_COOKIE, "/auth"));

    if let Some(err) = q.error.as_deref() {
        warn!(error = err, "provider denied authorization");
        metrics::LOGINS_TOTAL.with_label_values(&["denied"]).inc();
        return (jar, Redirect::to("/"));
    }
    let Some(code) = q.code.as_deref() else {
        metrics::LOGINS_TOTAL.with_label_values(&["failed"]).inc();
        return (jar, Redirect::to("/"));
    };

    match state.auth.complete_login(code, q.state.as_deref(), expected.as_deref()).await {
        Ok(session) => {
            metrics::LOGINS_TOTAL.with_label_values(&["ok"]).inc();
            let jar = jar.add(session_cookie(session.token, state.cookies.secure));
            (jar, Redirect::to("/"))
        }
        Err(e) => {
            warn!(error = %e, code = e.code(), "login failed");
            metrics::LOGINS_TOTAL.with_label_values(&["failed"]).inc();
            (jar, Redirect::to("/"))
        }
    }
}

#[utoipa::path(get, path = "/logout", tag = "auth", responses((status = 303, description = "Session cleared, redirect to /")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(removal(SESSION_COOKIE, "/"));
    (jar, Redirect::to("/"))
}
