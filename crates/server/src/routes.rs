pub mod auth;
pub mod interactions;
pub mod topup;
pub mod user;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::metrics;
use crate::openapi::ApiDoc;
use crate::session;
use crate::state::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: login flow, session-protected API,
/// slash-command webhook, docs, metrics, and static assets from `public_dir`
/// as the fallback.
pub fn build_router(state: ServerState, cors: CorsLayer, public_dir: &str) -> Router {
    let static_dir = ServeDir::new(public_dir)
        .fallback(ServeFile::new(format!("{public_dir}/index.html")));

    // Public routes
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/auth/discord", get(auth::login))
        .route("/auth/discord/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
        .route("/interactions", post(interactions::handle));

    // Session-protected user API
    let user_api = Router::new()
        .route("/api/user", get(user::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), session::require_session));

    // Session-protected top-ups
    let topup_api = Router::new()
        .route("/api/topup/truemoney", post(topup::gift_link))
        .route(
            "/api/topup/slip",
            post(topup::slip).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), session::require_session_topup));

    // Compose
    public
        .merge(user_api)
        .merge(topup_api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(static_dir)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
