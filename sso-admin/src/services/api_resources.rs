use crate::errors::ServiceError;
use crate::models::{ApiResource, ListQuery, Page, Property};
use crate::reconcile::reconcile;
use crate::services::properties::PropertyRequest;
use crate::services::secrets::{SecretHasher, SecretRequest, SecretView};
use crate::services::{commit, properties, required, secrets};
use crate::store::{Change, ChangeSet, ChildKind, Owner, Store};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceSummary {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// Api resource with its user claims and scopes, used for reads and writes alike
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceDetail {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default = "enabled_by_default")]
    pub show_in_discovery_document: bool,
    #[serde(default)]
    pub allowed_access_token_signing_algorithms: Option<String>,
    #[serde(default)]
    pub user_claims: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

async fn load(store: &dyn Store, name: &str) -> Result<ApiResource, ServiceError> {
    store
        .find_api_resource(name)
        .await?
        .ok_or_else(|| ServiceError::not_found("api resource", name))
}

fn stage_touch(mut resource: ApiResource, changes: &mut ChangeSet) {
    resource.touch();
    changes.push(Change::UpdateApiResource(resource));
}

/// Stages the user claim and scope collections of `resource`
async fn stage_children(
    store: &dyn Store,
    resource: i64,
    detail: &ApiResourceDetail,
    changes: &mut ChangeSet,
) -> Result<(), ServiceError> {
    reconcile(
        store,
        ChildKind::ApiResourceClaim,
        resource,
        &detail.user_claims,
        changes,
    )
    .await?;
    reconcile(
        store,
        ChildKind::ApiResourceScope,
        resource,
        &detail.scopes,
        changes,
    )
    .await?;
    Ok(())
}

pub async fn names(store: &dyn Store) -> Result<Vec<String>, ServiceError> {
    Ok(store.api_resource_names().await?)
}

pub async fn list(
    store: &dyn Store,
    query: &ListQuery,
) -> Result<Page<ApiResourceSummary>, ServiceError> {
    let page = query.page().map_err(ServiceError::Validation)?;
    let resources = store.list_api_resources(query.filter(), page).await?;
    Ok(resources.map(|resource| ApiResourceSummary {
        name: resource.name,
        display_name: resource.display_name,
        description: resource.description,
    }))
}

pub async fn get(store: &dyn Store, name: &str) -> Result<ApiResourceDetail, ServiceError> {
    let resource = load(store, name).await?;
    let user_claims = store
        .child_keys(ChildKind::ApiResourceClaim, resource.id)
        .await?;
    let scopes = store
        .child_keys(ChildKind::ApiResourceScope, resource.id)
        .await?;
    Ok(ApiResourceDetail {
        name: resource.name,
        display_name: resource.display_name,
        description: resource.description,
        enabled: resource.enabled,
        show_in_discovery_document: resource.show_in_discovery_document,
        allowed_access_token_signing_algorithms: resource.allowed_access_token_signing_algorithms,
        user_claims: user_claims.into_iter().collect(),
        scopes: scopes.into_iter().collect(),
    })
}

pub async fn create(store: &dyn Store, request: ApiResourceDetail) -> Result<(), ServiceError> {
    let name = required(&request.name, "name")?;
    if store.find_api_resource(name).await?.is_some() {
        return Err(ServiceError::conflict("api resource", name));
    }
    let resource = ApiResource {
        id: store.next_id().await?,
        name: name.to_string(),
        display_name: request.display_name.clone(),
        description: request.description.clone(),
        enabled: request.enabled,
        show_in_discovery_document: request.show_in_discovery_document,
        allowed_access_token_signing_algorithms: request
            .allowed_access_token_signing_algorithms
            .clone(),
        created: Utc::now(),
        updated: None,
    };
    let mut changes = ChangeSet::new();
    changes.push(Change::InsertApiResource(resource.clone()));
    stage_children(store, resource.id, &request, &mut changes).await?;
    commit(store, changes, "create api resource").await?;
    info!("Created api resource '{}'", resource.name);
    Ok(())
}

/// Replaces the resource's fields and collections. The name itself is immutable.
pub async fn update(
    store: &dyn Store,
    name: &str,
    request: ApiResourceDetail,
) -> Result<(), ServiceError> {
    if request.name != name {
        return Err(ServiceError::Validation(format!(
            "Api resource name '{}' does not match '{name}'",
            request.name
        )));
    }
    let mut resource = load(store, name).await?;
    let mut changes = ChangeSet::new();
    stage_children(store, resource.id, &request, &mut changes).await?;
    resource.display_name = request.display_name;
    resource.description = request.description;
    resource.enabled = request.enabled;
    resource.show_in_discovery_document = request.show_in_discovery_document;
    resource.allowed_access_token_signing_algorithms =
        request.allowed_access_token_signing_algorithms;
    stage_touch(resource, &mut changes);
    commit(store, changes, "update api resource").await
}

pub async fn delete(store: &dyn Store, name: &str) -> Result<(), ServiceError> {
    let resource = load(store, name).await?;
    commit(
        store,
        ChangeSet::from(vec![Change::DeleteApiResource(resource.id)]),
        "delete api resource",
    )
    .await?;
    info!("Deleted api resource '{name}'");
    Ok(())
}

pub async fn list_secrets(store: &dyn Store, name: &str) -> Result<Vec<SecretView>, ServiceError> {
    let resource = load(store, name).await?;
    secrets::list(store, Owner::api_resource(resource.id)).await
}

pub async fn add_secret(
    store: &dyn Store,
    hasher: &dyn SecretHasher,
    name: &str,
    request: SecretRequest,
) -> Result<SecretView, ServiceError> {
    let resource = load(store, name).await?;
    let mut changes = ChangeSet::new();
    let owner = Owner::api_resource(resource.id);
    let secret = secrets::stage_add(store, hasher, owner, &request, &mut changes).await?;
    stage_touch(resource, &mut changes);
    commit(store, changes, "add api resource secret").await?;
    Ok(secret.into())
}

pub async fn remove_secret(store: &dyn Store, name: &str, id: i64) -> Result<(), ServiceError> {
    let resource = load(store, name).await?;
    let mut changes = ChangeSet::new();
    secrets::stage_remove(store, Owner::api_resource(resource.id), id, &mut changes).await?;
    stage_touch(resource, &mut changes);
    commit(store, changes, "remove api resource secret").await
}

pub async fn list_properties(store: &dyn Store, name: &str) -> Result<Vec<Property>, ServiceError> {
    let resource = load(store, name).await?;
    properties::list(store, Owner::api_resource(resource.id)).await
}

pub async fn add_property(
    store: &dyn Store,
    name: &str,
    request: PropertyRequest,
) -> Result<Property, ServiceError> {
    let resource = load(store, name).await?;
    let mut changes = ChangeSet::new();
    let owner = Owner::api_resource(resource.id);
    let property = properties::stage_add(store, owner, &request, &mut changes).await?;
    stage_touch(resource, &mut changes);
    commit(store, changes, "add api resource property").await?;
    Ok(property)
}

pub async fn remove_property(store: &dyn Store, name: &str, key: &str) -> Result<(), ServiceError> {
    let resource = load(store, name).await?;
    let mut changes = ChangeSet::new();
    properties::stage_remove(store, Owner::api_resource(resource.id), key, &mut changes).await?;
    stage_touch(resource, &mut changes);
    commit(store, changes, "remove api resource property").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::secrets::Sha256SecretHasher;
    use crate::store::memory::MemoryStore;

    fn detail(name: &str, claims: &[&str], scopes: &[&str]) -> ApiResourceDetail {
        ApiResourceDetail {
            name: name.to_string(),
            display_name: Some(format!("{name} api")),
            description: None,
            enabled: true,
            show_in_discovery_document: true,
            allowed_access_token_signing_algorithms: None,
            user_claims: claims.iter().map(|c| c.to_string()).collect(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let store = MemoryStore::new();
        create(&store, detail("orders", &["email", "role"], &["orders.read"]))
            .await
            .unwrap();
        assert!(matches!(
            create(&store, detail("orders", &[], &[])).await,
            Err(ServiceError::Conflict(_))
        ));

        update(
            &store,
            "orders",
            detail("orders", &["role", "name"], &["orders.read", "orders.write"]),
        )
        .await
        .unwrap();
        let stored = get(&store, "orders").await.unwrap();
        assert_eq!(stored.user_claims, vec!["name", "role"]);
        assert_eq!(stored.scopes, vec!["orders.read", "orders.write"]);
        assert_eq!(names(&store).await.unwrap(), vec!["orders"]);
    }

    #[tokio::test]
    async fn test_rename_through_update_is_rejected() {
        let store = MemoryStore::new();
        create(&store, detail("orders", &[], &[])).await.unwrap();
        assert!(matches!(
            update(&store, "orders", detail("billing", &[], &[])).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_secret_changes_touch_the_resource() {
        let store = MemoryStore::new();
        create(&store, detail("orders", &[], &[])).await.unwrap();
        add_secret(
            &store,
            &Sha256SecretHasher,
            "orders",
            SecretRequest {
                value: "s3cr3t".to_string(),
                description: None,
                expiration: Some("2031-01-01".to_string()),
            },
        )
        .await
        .unwrap();
        let resource = store.find_api_resource("orders").await.unwrap().unwrap();
        assert!(resource.updated.is_some());
        assert_eq!(list_secrets(&store, "orders").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_filter_matches_display_name() {
        let store = MemoryStore::new();
        create(&store, detail("orders", &[], &[])).await.unwrap();
        create(&store, detail("billing", &[], &[])).await.unwrap();
        let query = ListQuery {
            filter: Some("billing api".to_string()),
            ..Default::default()
        };
        let page = list(&store, &query).await.unwrap();
        assert_eq!(page.total_records, 1);
        assert_eq!(page.items[0].name, "billing");
    }
}
