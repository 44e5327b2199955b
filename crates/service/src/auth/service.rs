use std::sync::Arc;

use models::user::User;
use tracing::{info, instrument, warn};

use super::domain::{AuthSession, LoginRedirect};
use super::errors::AuthError;
use super::provider::IdentityProvider;
use super::session::{new_state, SessionTokens};
use crate::users::UserRepository;

/// Login business service independent of web framework
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
    tokens: SessionTokens,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>, users: Arc<dyn UserRepository>, tokens: SessionTokens) -> Self {
        Self { provider, users, tokens }
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Start a login: a fresh state and the provider URL carrying it.
    pub fn begin_login(&self) -> Result<LoginRedirect, AuthError> {
        let state = new_state();
        let url = self.provider.authorize_url(&state)?;
        Ok(LoginRedirect { url, state })
    }

    /// Finish the OAuth round-trip and open a session.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, domain::ProviderProfile, provider::mock::StaticProvider, session::SessionTokens};
    /// use service::users::repository::mock::MockUserRepository;
    /// use std::sync::Arc;
    /// let provider = StaticProvider::default().with_code("c0de", ProviderProfile {
    ///     id: "1001".into(), username: "alice".into(), avatar: None, discriminator: None,
    /// });
    /// let svc = AuthService::new(Arc::new(provider), Arc::new(MockUserRepository::default()),
    ///     SessionTokens::new("secret", chrono::Duration::hours(1)));
    /// let session = tokio_test::block_on(svc.complete_login("c0de", Some("st"), Some("st"))).unwrap();
    /// assert_eq!(session.user.credits, 0.0);
    /// assert_eq!(svc.tokens().verify(&session.token).unwrap(), "1001");
    /// ```
    #[instrument(skip_all)]
    pub async fn complete_login(
        &self,
        code: &str,
        returned_state: Option<&str>,
        expected_state: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        match (returned_state, expected_state) {
            (Some(got), Some(want)) if !want.is_empty() && got == want => {}
            _ => {
                warn!("oauth callback state missing or mismatched");
                return Err(AuthError::StateMismatch);
            }
        }

        let profile = self.provider.exchange_code(code).await?;
        let user = self.users.upsert_profile(&profile).await?;
        let token = self.tokens.issue(&user.id)?;
        info!(user_id = %user.id, username = %user.username, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    /// Resolve a session token to its user, recreating a placeholder record
    /// when the id is no longer in the store.
    pub async fn current_user(&self, token: &str) -> Result<User, AuthError> {
        let id = self.tokens.verify(token)?;
        Ok(self.users.get_or_placeholder(&id).await?)
    }
}
