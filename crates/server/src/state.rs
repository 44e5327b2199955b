use std::path::PathBuf;
use std::sync::Arc;

use service::auth::AuthService;
use service::interactions::InteractionVerifier;
use service::topup::TopupService;

#[derive(Clone)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Clone)]
pub struct ServerState {
    pub auth: AuthService,
    pub topup: TopupService,
    pub cookies: CookieSettings,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// `None` when no application public key is configured.
    pub interactions: Option<Arc<InteractionVerifier>>,
}
