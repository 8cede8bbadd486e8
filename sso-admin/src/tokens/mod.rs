//! Opaque bearer tokens for the administrative API.
//!
//! A token is 32 random bytes, URL-safe base64 encoded. Only its SHA-256 digest
//! is used as the store key, together with the claims computed at issuance.

use crate::cache::{Cache, CacheBackend, CacheError};
use crate::permissions::Claim;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use log::{debug, warn};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

const KEY_PREFIX: &str = "sso:access_token:";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token store error: {0}")]
    Cache(#[from] CacheError),
    #[error("Token not found or expired")]
    TokenNotFound,
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

/// What the store keeps for each issued token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub subject: String,
    pub issuer: String,
    pub claims: Vec<Claim>,
    pub issued_at: u64,
    pub expires_at: u64,
}

#[derive(Clone)]
pub struct TokenManager {
    cache: Cache,
    issuer: String,
    ttl: u64,
}

fn now_secs() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|e| TokenError::TokenGeneration(format!("System time error: {e}")))
}

fn cache_key(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("{KEY_PREFIX}{hex}")
}

impl TokenManager {
    pub fn new(cache: Cache, issuer: impl Into<String>, ttl: u64) -> Self {
        Self {
            cache,
            issuer: issuer.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Issues a new token carrying `claims` for `subject`
    pub async fn issue(
        &self,
        subject: &str,
        claims: Vec<Claim>,
    ) -> Result<(String, StoredToken), TokenError> {
        let token = generate_secure_token();
        let now = now_secs()?;
        let stored = StoredToken {
            subject: subject.to_string(),
            issuer: self.issuer.clone(),
            claims,
            issued_at: now,
            expires_at: now + self.ttl,
        };

        self.cache.set(&cache_key(&token), &stored).await?;
        debug!(
            "Issued token for '{}' with {} claims, expires in {}s",
            subject,
            stored.claims.len(),
            self.ttl
        );
        Ok((token, stored))
    }

    /// Looks up a presented token, rejecting unknown and expired ones
    pub async fn validate(&self, token: &str) -> Result<StoredToken, TokenError> {
        let key = cache_key(token);
        let stored: StoredToken = self
            .cache
            .get(&key)
            .await?
            .ok_or(TokenError::TokenNotFound)?;

        if now_secs()? >= stored.expires_at {
            if let Err(e) = self.cache.delete(&key).await {
                warn!("Failed to delete expired token: {e}");
            }
            return Err(TokenError::TokenNotFound);
        }
        Ok(stored)
    }

    pub async fn revoke(&self, token: &str) -> Result<(), TokenError> {
        self.cache.delete(&cache_key(token)).await?;
        debug!("Revoked a token");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), String> {
        self.cache.health_check().await
    }
}

fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
