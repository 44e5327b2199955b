#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use ed25519_dalek::SigningKey;
use server::routes;
use server::state::{CookieSettings, ServerState};
use service::auth::domain::ProviderProfile;
use service::auth::provider::mock::StaticProvider;
use service::auth::session::SessionTokens;
use service::auth::AuthService;
use service::file::user_store::JsonUserRepository;
use service::interactions::InteractionVerifier;
use service::notify::mock::RecordingNotifier;
use service::notify::TopupEvent;
use service::topup::{TopupService, TopupSettings};
use service::users::UserRepository;
use tower::ServiceExt;
use uuid::Uuid;

pub const GOOD_CODE: &str = "good-code";
pub const USER_ID: &str = "80351110224678912";
pub const DEFAULT_UPLOAD_LIMIT: usize = 1024 * 1024;

/// Application key the test router trusts for `/interactions`.
pub fn app_signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<JsonUserRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub tokens: SessionTokens,
    pub root: PathBuf,
}

impl TestApp {
    pub fn upload_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub async fn send(&self, req: Request<Body>) -> anyhow::Result<Response<Body>> {
        Ok(self.router.clone().oneshot(req).await?)
    }

    /// Wait for spawned notification tasks to record `n` events.
    pub async fn events(&self, n: usize) -> Vec<TopupEvent> {
        for _ in 0..100 {
            let events = self.notifier.events().await;
            if events.len() >= n {
                return events;
            }
            tokio::task::yield_now().await;
        }
        self.notifier.events().await
    }

    pub async fn cleanup(self) {
        let _ = tokio::fs::remove_dir_all(&self.root).await;
    }
}

pub async fn build_app() -> anyhow::Result<TestApp> {
    build_app_with_limit(DEFAULT_UPLOAD_LIMIT).await
}

pub async fn build_app_with_limit(max_upload_bytes: usize) -> anyhow::Result<TestApp> {
    let root = std::env::temp_dir().join(format!("portal_test_{}", Uuid::new_v4()));
    let public = root.join("public");
    tokio::fs::create_dir_all(&public).await?;
    tokio::fs::write(public.join("index.html"), "<h1>portal</h1>").await?;

    let users = JsonUserRepository::new(root.join("data/users.json")).await?;
    let repo: Arc<dyn UserRepository> = users.clone();
    let provider = StaticProvider::default().with_code(
        GOOD_CODE,
        ProviderProfile {
            id: USER_ID.into(),
            username: "nelly".into(),
            avatar: Some("8342729096ea3675442027381ff50dfe".into()),
            discriminator: Some("0".into()),
        },
    );
    let tokens = SessionTokens::new("test-secret", chrono::Duration::hours(1));
    let notifier = Arc::new(RecordingNotifier::default());

    let state = ServerState {
        auth: AuthService::new(Arc::new(provider), Arc::clone(&repo), tokens.clone()),
        topup: TopupService::new(repo, notifier.clone(), TopupSettings::immediate()),
        cookies: CookieSettings { secure: false },
        upload_dir: root.join("uploads"),
        max_upload_bytes,
        interactions: Some(Arc::new(InteractionVerifier::new(app_signing_key().verifying_key()))),
    };
    let router = routes::build_router(
        state,
        tower_http::cors::CorsLayer::very_permissive(),
        public.to_str().unwrap_or("public"),
    );
    Ok(TestApp { router, users, notifier, tokens, root })
}

impl TestApp {
    /// Reopen the users file from disk.
    pub async fn reload_users(&self) -> anyhow::Result<Arc<JsonUserRepository>> {
        Ok(JsonUserRepository::new(self.root.join("data/users.json")).await?)
    }
}

/// Value of a non-empty `Set-Cookie` named `name`.
pub fn set_cookie(resp: &Response<Body>, name: &str) -> Option<String> {
    resp.headers().get_all(header::SET_COOKIE).iter().find_map(|v| {
        let s = v.to_str().ok()?;
        let first = s.split(';').next()?.trim();
        let value = first.strip_prefix(name)?.strip_prefix('=')?;
        (!value.is_empty()).then(|| value.to_string())
    })
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn json_body(resp: Response<Body>) -> anyhow::Result<serde_json::Value> {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Walk the login redirect and callback, returning the session token.
pub async fn login(app: &TestApp) -> anyhow::Result<String> {
    let resp = app.send(Request::get("/auth/discord").body(Body::empty())?).await?;
    let state = set_cookie(&resp, "oauth_state").ok_or_else(|| anyhow::anyhow!("no state cookie"))?;

    let req = Request::get(format!("/auth/discord/callback?code={GOOD_CODE}&state={state}"))
        .header(header::COOKIE, format!("oauth_state={state}"))
        .body(Body::empty())?;
    let resp = app.send(req).await?;
    set_cookie(&resp, "session").ok_or_else(|| anyhow::anyhow!("no session cookie"))
}

pub fn multipart_body(boundary: &str, amount: Option<&str>, file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(a) = amount {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"amount\"\r\n\r\n{a}\r\n").as_bytes(),
        );
    }
    if let Some((name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"slip\"; filename=\"{name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
