use crate::config::{AdminConfig, CacheStore};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod memory;
pub mod redis;

/// Errors that can occur during token store operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse value: {0}")]
    Deserialization(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Key/value store with a fixed time-to-live, used to keep issued tokens.
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    /// Store a value, expiring after the configured TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T)
        -> Result<(), CacheError>;

    /// Retrieve a value, `None` once it expired or was deleted
    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError>;

    /// Returns Ok(()) if the backend is reachable
    async fn health_check(&self) -> Result<(), String>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Token store selected at startup from `cache.store`
#[derive(Clone)]
pub enum Cache {
    InMemory(memory::InMemoryCache),
    Redis(redis::RedisCache),
}

#[async_trait::async_trait]
impl CacheBackend for Cache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        match self {
            Self::InMemory(cache) => cache.set(key, value).await,
            Self::Redis(cache) => cache.set(key, value).await,
        }
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        match self {
            Self::InMemory(cache) => cache.get(key).await,
            Self::Redis(cache) => cache.get(key).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(cache) => cache.health_check().await,
            Self::Redis(cache) => cache.health_check().await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Self::InMemory(cache) => cache.delete(key).await,
            Self::Redis(cache) => cache.delete(key).await,
        }
    }
}

/// Builds the token store configured in `cache.store`, expiring entries after `token.ttl`
pub async fn create_cache(config: &AdminConfig) -> Result<Cache, CacheError> {
    let ttl = config.token.ttl;
    match config.cache.store {
        CacheStore::InMemory => {
            let cache = memory::InMemoryCache::new(ttl, config.cache.memory.capacity)
                .map_err(CacheError::Config)?;
            Ok(Cache::InMemory(cache))
        }
        CacheStore::Redis => {
            if config.cache.redis.url.is_empty() {
                return Err(CacheError::Config(
                    "Redis URL is required for the redis token store".to_string(),
                ));
            }
            let cache = redis::RedisCache::new(&config.cache.redis.url, ttl)
                .await
                .map_err(CacheError::Config)?;
            Ok(Cache::Redis(cache))
        }
    }
}
