use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    /// Lifetime of issued access tokens in seconds (default: 1 hour)
    #[serde(default = "default_ttl")]
    pub ttl: u64,

    /// Issuer recorded on every issued token
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_ttl() -> u64 {
    3600
}

fn default_issuer() -> String {
    "sso-admin".to_string()
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            issuer: default_issuer(),
        }
    }
}
