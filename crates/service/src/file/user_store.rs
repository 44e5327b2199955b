use std::sync::Arc;

use async_trait::async_trait;
use models::user::{validate_id, User};
use tracing::info;

use crate::auth::domain::ProviderProfile;
use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;
use crate::users::UserRepository;

/// File-backed user repository.
/// Keeps a map of `user id -> User` persisted as one JSON document.
#[derive(Clone)]
pub struct JsonUserRepository {
    store: Arc<JsonMapStore<String, User>>,
}

impl JsonUserRepository {
    /// Initialize the repository from the given file path. Creates the file if missing.
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, User>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    pub async fn list(&self) -> Vec<User> {
        self.store.list().await.into_iter().map(|(_, u)| u).collect()
    }
}

#[async_trait]
impl UserRepository for JsonUserRepository {
    async fn find(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.store.get(&id.to_string()).await)
    }

    async fn upsert_profile(&self, profile: &ProviderProfile) -> Result<User, ServiceError> {
        validate_id(&profile.id)?;
        let (user, created) = self
            .store
            .update_map(|m| {
                let created = !m.contains_key(&profile.id);
                let user = m
                    .entry(profile.id.clone())
                    .and_modify(|u| profile.apply_to(u))
                    .or_insert_with(|| profile.to_user());
                Ok((user.clone(), created))
            })
            .await?;
        if created {
            info!(user_id = %user.id, username = %user.username, "user_created");
        }
        Ok(user)
    }

    async fn get_or_placeholder(&self, id: &str) -> Result<User, ServiceError> {
        if let Some(user) = self.store.get(&id.to_string()).await {
            return Ok(user);
        }
        validate_id(id)?;
        self.store
            .update_map(|m| Ok(m.entry(id.to_string()).or_insert_with(|| User::placeholder(id)).clone()))
            .await
    }

    async fn credit(&self, id: &str, amount: f64) -> Result<User, ServiceError> {
        self.store
            .try_update(&id.to_string(), |u| {
                u.credit(amount)?;
                Ok(u.clone())
            })
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))
    }
}
