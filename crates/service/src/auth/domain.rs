use models::user::User;
use serde::{Deserialize, Serialize};

/// Identity returned by the OAuth provider after a successful code exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
}

impl ProviderProfile {
    pub fn to_user(&self) -> User {
        User::new(self.id.clone(), self.username.clone(), self.avatar.clone(), self.discriminator.clone())
    }

    /// Refresh profile fields on an existing record; balance and join time are kept.
    pub fn apply_to(&self, user: &mut User) {
        user.username = self.username.clone();
        user.avatar = self.avatar.clone();
        user.discriminator = self.discriminator.clone();
    }
}

/// Where to send the browser to start a login, plus the CSRF state to remember.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub url: String,
    pub state: String,
}

/// Login result (session)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}
