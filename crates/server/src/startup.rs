use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::{CookieSettings, ServerState};
use service::{
    auth::{
        discord::{DiscordOAuthConfig, DiscordProvider},
        session::SessionTokens,
        AuthService,
    },
    file::user_store::JsonUserRepository,
    interactions::InteractionVerifier,
    notify::{DiscordNotifier, NoopNotifier, Notifier},
    runtime,
    topup::{TopupService, TopupSettings},
    users::UserRepository,
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Pick the channel notifier, or a no-op one when the bot is not configured.
fn build_notifier(cfg: &AppConfig, http: &reqwest::Client) -> Arc<dyn Notifier> {
    match cfg.discord.notification_target() {
        Some((token, channel)) => {
            let notifier = Arc::new(DiscordNotifier::new(http.clone(), token, channel));
            let bot = Arc::clone(&notifier);
            tokio::spawn(async move {
                if let Err(e) = bot.whoami().await {
                    warn!(error = %e, "notification bot token check failed");
                }
            });
            notifier
        }
        None => {
            info!("DISCORD_TOKEN or LOG_CHANNEL_ID not set; top-up notifications disabled");
            Arc::new(NoopNotifier)
        }
    }
}

/// Wire storage, provider, notifier and services into the router state.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    runtime::ensure_env(&cfg.storage.public_dir, &cfg.storage.data_dir(), &cfg.storage.upload_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let users: Arc<dyn UserRepository> = JsonUserRepository::new(&cfg.storage.users_path)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let provider = DiscordProvider::new(
        http.clone(),
        DiscordOAuthConfig {
            client_id: cfg.discord.client_id.clone(),
            client_secret: cfg.discord.client_secret.clone(),
            redirect_uri: cfg.discord.callback_url.clone(),
        },
    );
    let tokens = SessionTokens::new(&cfg.session.secret, chrono::Duration::hours(cfg.session.ttl_hours));
    let auth = AuthService::new(Arc::new(provider), Arc::clone(&users), tokens);

    let settings = TopupSettings {
        gift_delay: Duration::from_millis(cfg.topup.gift_delay_ms),
        slip_delay: Duration::from_millis(cfg.topup.slip_delay_ms),
    };
    let topup = TopupService::new(users, build_notifier(cfg, &http), settings);

    let interactions = match cfg.discord.interactions_key() {
        Some(key) => Some(Arc::new(
            InteractionVerifier::from_hex(key).map_err(|e| StartupError::InvalidConfig(e.to_string()))?,
        )),
        None => {
            info!("DISCORD_PUBLIC_KEY not set; /interactions disabled");
            None
        }
    };

    Ok(ServerState {
        auth,
        topup,
        cookies: CookieSettings { secure: cfg.session.secure_cookie },
        upload_dir: PathBuf::from(&cfg.storage.upload_dir),
        max_upload_bytes: cfg.topup.max_upload_bytes,
        interactions,
    })
}

/// Public entry: build the app and serve until Ctrl+C
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors(), &cfg.storage.public_dir);

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received Ctrl+C, shutting down");
        })
        .await?;
    Ok(())
}
