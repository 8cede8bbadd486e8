use crate::cache::Cache;
use crate::config::AdminConfig;
use crate::services::files::{FileStorage, LocalFileStorage};
use crate::services::secrets::{SecretHasher, Sha256SecretHasher};
use crate::store::Store;
use crate::tokens::TokenManager;
use log::warn;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AdminConfig>,
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenManager>,
    pub hasher: Arc<dyn SecretHasher>,
    pub files: Arc<dyn FileStorage>,
}

impl AppState {
    /// Wires the collaborators of the admin service around an existing store and token cache
    pub fn new(config: &AdminConfig, store: Arc<dyn Store>, cache: Cache) -> Self {
        Self {
            config: Arc::new(config.clone()),
            store,
            tokens: Arc::new(TokenManager::new(
                cache,
                config.token.issuer.clone(),
                config.token.ttl,
            )),
            hasher: Arc::new(Sha256SecretHasher),
            files: Arc::new(LocalFileStorage::new(&config.files)),
        }
    }

    /// Reachability of the store and of the token store, in that order
    pub async fn component_health(&self) -> (bool, bool) {
        let store = self.store.health_check().await;
        if let Err(e) = &store {
            warn!("Store is not healthy: {e}");
        }
        let tokens = self.tokens.health_check().await;
        if let Err(e) = &tokens {
            warn!("Token store is not healthy: {e}");
        }
        (store.is_ok(), tokens.is_ok())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::memory::InMemoryCache;
    use crate::store::memory::MemoryStore;

    pub(crate) fn create_test_state(config: &AdminConfig) -> AppState {
        let cache = Cache::InMemory(
            InMemoryCache::new(config.token.ttl, 16).expect("Failed to create cache"),
        );
        AppState::new(config, Arc::new(MemoryStore::new()), cache)
    }

    #[tokio::test]
    async fn test_app_state_is_healthy() {
        let root = tempfile::tempdir().unwrap();
        let state = create_test_state(&AdminConfig::for_test(root.path()));
        assert_eq!(state.component_health().await, (true, true));
        assert_eq!(state.tokens.ttl(), 3600);
    }

    #[test]
    fn test_app_state_clone() {
        let root = tempfile::tempdir().unwrap();
        let state = create_test_state(&AdminConfig::for_test(root.path()));
        let state2 = state.clone();

        // After cloning, both instances should point to the same data
        assert_eq!(Arc::as_ptr(&state.config), Arc::as_ptr(&state2.config));
        assert!(Arc::ptr_eq(&state.tokens, &state2.tokens));
    }
}
