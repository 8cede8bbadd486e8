use crate::errors::ServiceError;
use crate::models::Property;
use crate::services::required;
use crate::store::{Change, ChangeSet, Owner, Store};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PropertyRequest {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

pub async fn list(store: &dyn Store, owner: Owner) -> Result<Vec<Property>, ServiceError> {
    Ok(store.properties(owner).await?)
}

/// Stages a new property, keys being unique per owner
pub async fn stage_add(
    store: &dyn Store,
    owner: Owner,
    request: &PropertyRequest,
    changes: &mut ChangeSet,
) -> Result<Property, ServiceError> {
    let key = required(&request.key, "key")?;
    if store
        .properties(owner)
        .await?
        .iter()
        .any(|property| property.key == key)
    {
        return Err(ServiceError::conflict("property", key));
    }
    let property = Property {
        id: store.next_id().await?,
        key: key.to_string(),
        value: request.value.clone(),
    };
    changes.push(Change::InsertProperty {
        owner,
        property: property.clone(),
    });
    Ok(property)
}

pub async fn stage_remove(
    store: &dyn Store,
    owner: Owner,
    key: &str,
    changes: &mut ChangeSet,
) -> Result<(), ServiceError> {
    if !store
        .properties(owner)
        .await?
        .iter()
        .any(|property| property.key == key)
    {
        return Err(ServiceError::not_found("property", key));
    }
    changes.push(Change::DeleteProperty {
        owner,
        key: key.to_string(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::commit;
    use crate::store::memory::MemoryStore;

    fn request(key: &str, value: &str) -> PropertyRequest {
        PropertyRequest {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    async fn add(store: &MemoryStore, owner: Owner, key: &str) -> Result<Property, ServiceError> {
        let mut changes = ChangeSet::new();
        let property = stage_add(store, owner, &request(key, "v"), &mut changes).await?;
        commit(store, changes, "add property").await?;
        Ok(property)
    }

    #[tokio::test]
    async fn test_duplicate_key_conflicts_per_owner_only() {
        let store = MemoryStore::new();
        add(&store, Owner::client(1), "tenant").await.unwrap();
        assert!(matches!(
            add(&store, Owner::client(1), "tenant").await,
            Err(ServiceError::Conflict(_))
        ));
        add(&store, Owner::api_scope(1), "tenant").await.unwrap();
        assert_eq!(list(&store, Owner::client(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_by_key() {
        let store = MemoryStore::new();
        let owner = Owner::identity_resource(3);
        add(&store, owner, "tenant").await.unwrap();

        let mut changes = ChangeSet::new();
        stage_remove(&store, owner, "tenant", &mut changes)
            .await
            .unwrap();
        commit(&store, changes, "remove property").await.unwrap();
        assert!(list(&store, owner).await.unwrap().is_empty());

        let missing = stage_remove(&store, owner, "tenant", &mut ChangeSet::new()).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }
}
