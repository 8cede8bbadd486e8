use crate::errors::ServiceError;
use crate::models::{ApiScope, ListQuery, Page, Property};
use crate::reconcile::reconcile;
use crate::services::properties::PropertyRequest;
use crate::services::{commit, properties, required};
use crate::store::{Change, ChangeSet, ChildKind, Owner, Store};
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiScopeSummary {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiScopeDetail {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub emphasize: bool,
    #[serde(default = "enabled_by_default")]
    pub show_in_discovery_document: bool,
    #[serde(default)]
    pub user_claims: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

async fn load(store: &dyn Store, name: &str) -> Result<ApiScope, ServiceError> {
    store
        .find_api_scope(name)
        .await?
        .ok_or_else(|| ServiceError::not_found("api scope", name))
}

pub async fn list(store: &dyn Store, query: &ListQuery) -> Result<Page<ApiScopeSummary>, ServiceError> {
    let page = query.page().map_err(ServiceError::Validation)?;
    let scopes = store.list_api_scopes(query.filter(), page).await?;
    Ok(scopes.map(|scope| ApiScopeSummary {
        name: scope.name,
        display_name: scope.display_name,
        description: scope.description,
    }))
}

pub async fn get(store: &dyn Store, name: &str) -> Result<ApiScopeDetail, ServiceError> {
    let scope = load(store, name).await?;
    let user_claims = store.child_keys(ChildKind::ApiScopeClaim, scope.id).await?;
    Ok(ApiScopeDetail {
        name: scope.name,
        display_name: scope.display_name,
        description: scope.description,
        enabled: scope.enabled,
        required: scope.required,
        emphasize: scope.emphasize,
        show_in_discovery_document: scope.show_in_discovery_document,
        user_claims: user_claims.into_iter().collect(),
    })
}

pub async fn create(store: &dyn Store, request: ApiScopeDetail) -> Result<(), ServiceError> {
    let name = required(&request.name, "name")?;
    if store.find_api_scope(name).await?.is_some() {
        return Err(ServiceError::conflict("api scope", name));
    }
    let scope = ApiScope {
        id: store.next_id().await?,
        name: name.to_string(),
        display_name: request.display_name.clone(),
        description: request.description.clone(),
        enabled: request.enabled,
        required: request.required,
        emphasize: request.emphasize,
        show_in_discovery_document: request.show_in_discovery_document,
    };
    let mut changes = ChangeSet::new();
    changes.push(Change::InsertApiScope(scope.clone()));
    reconcile(
        store,
        ChildKind::ApiScopeClaim,
        scope.id,
        &request.user_claims,
        &mut changes,
    )
    .await?;
    commit(store, changes, "create api scope").await?;
    info!("Created api scope '{}'", scope.name);
    Ok(())
}

pub async fn update(store: &dyn Store, name: &str, request: ApiScopeDetail) -> Result<(), ServiceError> {
    if request.name != name {
        return Err(ServiceError::Validation(format!(
            "Api scope name '{}' does not match '{name}'",
            request.name
        )));
    }
    let mut scope = load(store, name).await?;
    let mut changes = ChangeSet::new();
    reconcile(
        store,
        ChildKind::ApiScopeClaim,
        scope.id,
        &request.user_claims,
        &mut changes,
    )
    .await?;
    scope.display_name = request.display_name;
    scope.description = request.description;
    scope.enabled = request.enabled;
    scope.required = request.required;
    scope.emphasize = request.emphasize;
    scope.show_in_discovery_document = request.show_in_discovery_document;
    changes.push(Change::UpdateApiScope(scope));
    commit(store, changes, "update api scope").await
}

pub async fn delete(store: &dyn Store, name: &str) -> Result<(), ServiceError> {
    let scope = load(store, name).await?;
    commit(
        store,
        ChangeSet::from(vec![Change::DeleteApiScope(scope.id)]),
        "delete api scope",
    )
    .await?;
    info!("Deleted api scope '{name}'");
    Ok(())
}

pub async fn list_properties(store: &dyn Store, name: &str) -> Result<Vec<Property>, ServiceError> {
    let scope = load(store, name).await?;
    properties::list(store, Owner::api_scope(scope.id)).await
}

pub async fn add_property(
    store: &dyn Store,
    name: &str,
    request: PropertyRequest,
) -> Result<Property, ServiceError> {
    let scope = load(store, name).await?;
    let mut changes = ChangeSet::new();
    let property =
        properties::stage_add(store, Owner::api_scope(scope.id), &request, &mut changes).await?;
    commit(store, changes, "add api scope property").await?;
    Ok(property)
}

pub async fn remove_property(store: &dyn Store, name: &str, key: &str) -> Result<(), ServiceError> {
    let scope = load(store, name).await?;
    let mut changes = ChangeSet::new();
    properties::stage_remove(store, Owner::api_scope(scope.id), key, &mut changes).await?;
    commit(store, changes, "remove api scope property").await
}
