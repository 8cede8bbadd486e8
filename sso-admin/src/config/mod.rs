pub(crate) use crate::config::cache::{CacheConfig, CacheStore};
use crate::config::files::FilesConfig;
use crate::config::token::TokenConfig;
use config::{Config as ConfigCrate, ConfigError, Environment};
use serde::Deserialize;

pub mod cache;
pub mod files;
pub mod token;

const ENV_PREFIX: &str = "SSO";
const DEFAULT_AVATAR: &str = "https://github.githubassets.com/images/modules/logos_page/GitHub-Mark.png";

/// Main configuration structure for the admin server
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Service key the identity engine presents to request token issuance - mandatory
    #[serde(default)]
    pub api_key: String,

    /// The port the admin server will listen to (default: 7780)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seed an empty store with the default roles, admin user and api resource
    #[serde(default = "default_seed")]
    pub seed: bool,

    /// Avatar reference issued for users without one
    #[serde(default = "default_avatar")]
    pub default_avatar: String,

    #[serde(default)]
    pub token: TokenConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub files: FilesConfig,
}

fn default_port() -> u16 {
    7780
}

fn default_seed() -> bool {
    true
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            port: default_port(),
            seed: default_seed(),
            default_avatar: default_avatar(),
            token: TokenConfig::default(),
            cache: CacheConfig::default(),
            files: FilesConfig::default(),
        }
    }
}

impl AdminConfig {
    /// Creates a new Config instance from `SSO_*` environment variables.
    ///
    /// Nested sections use a double underscore, e.g. `SSO_CACHE__REDIS__URL`.
    pub fn new() -> Result<Self, String> {
        Self::from_environment(Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .convert_case(config::Case::Snake)
    }

    fn from_environment(environment: Environment) -> Result<Self, String> {
        let config: Self = ConfigCrate::builder()
            .add_source(environment)
            .build()
            .map_err(|e: ConfigError| e.to_string())?
            .try_deserialize()
            .map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err(format!("{ENV_PREFIX}_API_KEY is required"));
        }
        if self.token.ttl == 0 {
            return Err(format!("{ENV_PREFIX}_TOKEN__TTL must be positive"));
        }
        if self.cache.store == CacheStore::Redis && self.cache.redis.url.is_empty() {
            return Err(format!(
                "{ENV_PREFIX}_CACHE__REDIS__URL is required for the redis cache store"
            ));
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn for_test(files_root: &std::path::Path) -> Self {
        Self {
            api_key: "test_api_key".to_string(),
            port: 0, // Let the OS choose a port
            seed: true,
            files: FilesConfig {
                root: files_root.to_string_lossy().into_owned(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
