use async_trait::async_trait;

use super::domain::ProviderProfile;
use super::errors::AuthError;

/// OAuth2 authorization-code provider seen from the portal: where to send the
/// browser, and how to turn the returned code into a profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self, state: &str) -> Result<String, AuthError>;
    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, AuthError>;
}

/// Provider that maps fixed codes to profiles, for tests.
pub mod mock {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default, Clone)]
    pub struct StaticProvider {
        profiles: HashMap<String, ProviderProfile>,
    }

    impl StaticProvider {
        pub fn with_code(mut self, code: &str, profile: ProviderProfile) -> Self {
            self.profiles.insert(code.to_string(), profile);
            self
        }
    }

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
            Ok(format!("https://provider.test/authorize?state={state}"))
        }

        async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, AuthError> {
            self.profiles
                .get(code)
                .cloned()
                .ok_or_else(|| AuthError::Provider(format!("unknown code {code}")))
        }
    }
}
