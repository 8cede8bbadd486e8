use super::{CacheBackend, CacheError};
use async_trait::async_trait;
use log::error;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};

/// Token store shared by every replica through Redis, entries written with `SET EX`
#[derive(Clone)]
pub struct RedisCache {
    conn_manager: ConnectionManager,
    ttl_secs: u64,
}

impl RedisCache {
    pub async fn new(redis_url: &str, ttl_secs: u64) -> Result<Self, String> {
        let client =
            Client::open(redis_url).map_err(|err| format!("Invalid Redis URL: {err}"))?;
        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(|err| format!("Failed to create Redis connection manager: {err}"))?;

        let mut conn = conn_manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|err| format!("Failed to ping Redis: {err}"))?;

        Ok(Self {
            conn_manager,
            ttl_secs,
        })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.conn_manager.clone();
        conn.set_ex::<_, _, ()>(key, serialized, self.ttl_secs)
            .await
            .map_err(|err| {
                error!("Redis error while setting a token entry: {err}");
                CacheError::Redis(err.to_string())
            })
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        let mut conn = self.conn_manager.clone();
        let value: Option<String> = conn.get(key).await.map_err(|err| {
            error!("Redis error while reading a token entry: {err}");
            CacheError::Redis(err.to_string())
        })?;

        value
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| CacheError::Deserialization(e.to_string()))
            })
            .transpose()
    }

    async fn health_check(&self) -> Result<(), String> {
        let mut conn = self.conn_manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| format!("Redis health check failed: {err}"))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();
        conn.del::<_, ()>(key).await.map_err(|err| {
            error!("Redis error while deleting a token entry: {err}");
            CacheError::Redis(err.to_string())
        })
    }
}
