use async_trait::async_trait;
use models::user::User;

use crate::auth::domain::ProviderProfile;
use crate::errors::ServiceError;

/// Repository abstraction for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<User>, ServiceError>;

    /// Create the user from a provider profile with a zero balance, or refresh
    /// the profile fields of an existing user keeping balance and join time.
    async fn upsert_profile(&self, profile: &ProviderProfile) -> Result<User, ServiceError>;

    /// Return the stored user, creating a placeholder record if none exists.
    async fn get_or_placeholder(&self, id: &str) -> Result<User, ServiceError>;

    /// Add `amount` to the user's balance and return the updated record.
    async fn credit(&self, id: &str, amount: f64) -> Result<User, ServiceError>;
}

/// Simple in-memory repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct MockUserRepository {
        users: Mutex<HashMap<String, User>>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn find(&self, id: &str) -> Result<Option<User>, ServiceError> {
            Ok(self.users.lock().await.get(id).cloned())
        }

        async fn upsert_profile(&self, profile: &ProviderProfile) -> Result<User, ServiceError> {
            let mut users = self.users.lock().await;
            let user = users
                .entry(profile.id.clone())
                .and_modify(|u| profile.apply_to(u))
                .or_insert_with(|| profile.to_user());
            Ok(user.clone())
        }

        async fn get_or_placeholder(&self, id: &str) -> Result<User, ServiceError> {
            let mut users = self.users.lock().await;
            Ok(users.entry(id.to_string()).or_insert_with(|| User::placeholder(id)).clone())
        }

        async fn credit(&self, id: &str, amount: f64) -> Result<User, ServiceError> {
            let mut users = self.users.lock().await;
            let user = users.get_mut(id).ok_or_else(|| ServiceError::not_found("user"))?;
            user.credit(amount)?;
            Ok(user.clone())
        }
    }
}
