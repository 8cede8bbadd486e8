use crate::errors::ServiceError;
use crate::models::Secret;
use crate::services::{parse_expiration, required};
use crate::store::{Change, ChangeSet, Owner, Store};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

pub const SHARED_SECRET: &str = "SharedSecret";

/// One-way hash applied to shared secrets before they are stored
pub trait SecretHasher: Send + Sync {
    fn hash(&self, value: &str) -> String;
}

/// Base64 of the SHA-256 digest, the format the identity engine compares against
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256SecretHasher;

impl SecretHasher for Sha256SecretHasher {
    fn hash(&self, value: &str) -> String {
        STANDARD.encode(Sha256::digest(value.as_bytes()))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRequest {
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    #[serde(default)]
    pub expiration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecretView {
    pub id: i64,
    #[serde(rename = "type")]
    pub secret_type: String,
    pub value: String,
    pub description: Option<String>,
    /// Expiration day as `YYYY-MM-DD`
    pub expiration: Option<String>,
}

impl From<Secret> for SecretView {
    fn from(secret: Secret) -> Self {
        Self {
            id: secret.id,
            secret_type: secret.secret_type,
            value: secret.value,
            description: secret.description,
            expiration: secret
                .expiration
                .map(|at| at.format("%Y-%m-%d").to_string()),
        }
    }
}

pub async fn list(store: &dyn Store, owner: Owner) -> Result<Vec<SecretView>, ServiceError> {
    let secrets = store.secrets(owner).await?;
    Ok(secrets.into_iter().map(SecretView::from).collect())
}

/// Hashes the requested secret and stages its insertion
pub async fn stage_add(
    store: &dyn Store,
    hasher: &dyn SecretHasher,
    owner: Owner,
    request: &SecretRequest,
    changes: &mut ChangeSet,
) -> Result<Secret, ServiceError> {
    let value = required(&request.value, "value")?;
    let expiration = parse_expiration(request.expiration.as_deref())?;
    let secret = Secret {
        id: store.next_id().await?,
        secret_type: SHARED_SECRET.to_string(),
        value: hasher.hash(value),
        description: request.description.clone(),
        expiration,
        created: Utc::now(),
    };
    changes.push(Change::InsertSecret {
        owner,
        secret: secret.clone(),
    });
    Ok(secret)
}

/// Stages the removal of a secret, which must belong to `owner`
pub async fn stage_remove(
    store: &dyn Store,
    owner: Owner,
    id: i64,
    changes: &mut ChangeSet,
) -> Result<(), ServiceError> {
    let owned = store
        .secrets(owner)
        .await?
        .iter()
        .any(|secret| secret.id == id);
    if !owned {
        return Err(ServiceError::not_found("secret", id));
    }
    changes.push(Change::DeleteSecret { owner, id });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::commit;
    use crate::store::memory::MemoryStore;

    fn request(value: &str, expiration: Option<&str>) -> SecretRequest {
        SecretRequest {
            value: value.to_string(),
            description: Some("ci".to_string()),
            expiration: expiration.map(str::to_string),
        }
    }

    #[test]
    fn test_hash_is_stable_and_hides_the_value() {
        let hasher = Sha256SecretHasher;
        assert_eq!(hasher.hash("secret"), hasher.hash("secret"));
        assert_ne!(hasher.hash("secret"), hasher.hash("Secret"));
        assert_eq!(
            hasher.hash("secret"),
            "K7gNU3sdo+OL0wNhqoVWhr3g6s1xYv72ol/pe/Unols="
        );
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let store = MemoryStore::new();
        let owner = Owner::api_resource(7);
        let mut changes = ChangeSet::new();
        let secret = stage_add(
            &store,
            &Sha256SecretHasher,
            owner,
            &request("secret", Some("2031-05-06")),
            &mut changes,
        )
        .await
        .unwrap();
        commit(&store, changes, "add secret").await.unwrap();

        let listed = list(&store, owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].secret_type, SHARED_SECRET);
        assert_eq!(listed[0].expiration.as_deref(), Some("2031-05-06"));
        assert_ne!(listed[0].value, "secret");

        let mut changes = ChangeSet::new();
        stage_remove(&store, owner, secret.id, &mut changes)
            .await
            .unwrap();
        commit(&store, changes, "remove secret").await.unwrap();
        assert!(list(&store, owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_secret_of_another_owner() {
        let store = MemoryStore::new();
        let mut changes = ChangeSet::new();
        let secret = stage_add(
            &store,
            &Sha256SecretHasher,
            Owner::client(1),
            &request("secret", None),
            &mut changes,
        )
        .await
        .unwrap();
        commit(&store, changes, "add secret").await.unwrap();

        let result = stage_remove(&store, Owner::client(2), secret.id, &mut ChangeSet::new()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_staging() {
        let store = MemoryStore::new();
        let mut changes = ChangeSet::new();
        for bad in [request(" ", None), request("secret", Some("tomorrow"))] {
            let result = stage_add(
                &store,
                &Sha256SecretHasher,
                Owner::client(1),
                &bad,
                &mut changes,
            )
            .await;
            assert!(matches!(result, Err(ServiceError::Validation(_))));
        }
        assert!(changes.is_empty());
    }
}
