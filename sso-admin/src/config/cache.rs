use serde::Deserialize;

/// Backend holding issued access tokens
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStore {
    #[default]
    InMemory,
    Redis,
}

/// Configuration for the token store
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CacheConfig {
    /// Store type: "in-memory" (default) or "redis"
    #[serde(default)]
    pub store: CacheStore,

    /// In-memory store specific configuration
    #[serde(default)]
    pub memory: InMemoryConfig,

    /// Redis store specific configuration
    #[serde(default)]
    pub redis: RedisConfig,
}

/// In-memory store configuration options
#[derive(Debug, Deserialize, Clone)]
pub struct InMemoryConfig {
    /// Maximum capacity in MiB (default: 128 MiB)
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    128
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Redis store configuration options
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    /// Redis connection string
    #[serde(default)]
    pub url: String,
}
