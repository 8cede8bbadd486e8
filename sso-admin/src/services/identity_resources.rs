use crate::errors::ServiceError;
use crate::models::{IdentityResource, ListQuery, Page, Property};
use crate::reconcile::reconcile;
use crate::services::properties::PropertyRequest;
use crate::services::{commit, properties, required};
use crate::store::{Change, ChangeSet, ChildKind, Owner, Store};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResourceSummary {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// An identity resource (`openid`, `profile`, ...) and the user claims it releases
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResourceDetail {
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

async fn load(store: &dyn Store, name: &str) -> Result<IdentityResource, ServiceError> {
    store
        .find_identity_resource(name)
        .await?
        .ok_or_else(|| ServiceError::not_found("identity resource", name))
}

fn stage_touch(mut resource: IdentityResource, changes: &mut ChangeSet) {
    resource.touch();
    changes.push(Change::UpdateIdentityResource(resource));
}

pub async fn list(
    store: &dyn Store,
    query: &ListQuery,
) -> Result<Page<IdentityResourceSummary>, ServiceError> {
    let page = query.page().map_err(ServiceError::Validation)?;
    let resources = store.list_identity_resources(query.filter(), page).await?;
    Ok(resources.map(|resource| IdentityResourceSummary {
        name: resource.name,
        display_name: resource.display_name,
        description: resource.description,
    }))
}

pub async fn get(store: &dyn Store, name: &str) -> Result<IdentityResourceDetail, ServiceError> {
    let resource = load(store, name).await?;
    let user_claims = store
        .child_keys(ChildKind::IdentityResourceClaim, resource.id)
        .await?;
    Ok(IdentityResourceDetail {
        name: resource.name,
        display_name: resource.display_name,
        description: resource.description,
        enabled: resource.enabled,
        required: resource.required,
        emphasize: resource.emphasize,
        show_in_discovery_document: resource.show_in_discovery_document,
        user_claims: user_claims.into_iter().collect(),
    })
}

pub async fn create(store: &dyn Store, request: IdentityResourceDetail) -> Result<(), ServiceError> {
    let name = required(&request.name, "name")?;
    if store.find_identity_resource(name).await?.is_some() {
        return Err(ServiceError::conflict("identity resource", name));
    }
    let resource = IdentityResource {
        id: store.next_id().await?,
        name: name.to_string(),
        display_name: request.display_name.clone(),
        description: request.description.clone(),
        enabled: request.enabled,
        required: request.required,
        emphasize: request.emphasize,
        show_in_discovery_document: request.show_in_discovery_document,
        created: Utc::now(),
        updated: None,
    };
    let mut changes = ChangeSet::new();
    changes.push(Change::InsertIdentityResource(resource.clone()));
    reconcile(
        store,
        ChildKind::IdentityResourceClaim,
        resource.id,
        &request.user_claims,
        &mut changes,
    )
    .await?;
    commit(store, changes, "create identity resource").await?;
    info!("Created identity resource '{}'", resource.name);
    Ok(())
}

pub async fn update(
    store: &dyn Store,
    name: &str,
    request: IdentityResourceDetail,
) -> Result<(), ServiceError> {
    if request.name != name {
        return Err(ServiceError::Validation(format!(
            "Identity resource name '{}' does not match '{name}'",
            request.name
        )));
    }
    let mut resource = load(store, name).await?;
    let mut changes = ChangeSet::new();
    reconcile(
        store,
        ChildKind::IdentityResourceClaim,
        resource.id,
        &request.user_claims,
        &mut changes,
    )
    .await?;
    resource.display_name = request.display_name;
    resource.description = request.description;
    resource.enabled = request.enabled;
    resource.required = request.required;
    resource.emphasize = request.emphasize;
    resource.show_in_discovery_document = request.show_in_discovery_document;
    stage_touch(resource, &mut changes);
    commit(store, changes, "update identity resource").await
}

pub async fn delete(store: &dyn Store, name: &str) -> Result<(), ServiceError> {
    let resource = load(store, name).await?;
    commit(
        store,
        ChangeSet::from(vec![Change::DeleteIdentityResource(resource.id)]),
        "delete identity resource",
    )
    .await?;
    info!("Deleted identity resource '{name}'");
    Ok(())
}

pub async fn list_properties(store: &dyn Store, name: &str) -> Result<Vec<Property>, ServiceError> {
    let resource = load(store, name).await?;
    properties::list(store, Owner::identity_resource(resource.id)).await
}

pub async fn add_property(
    store: &dyn Store,
    name: &str,
    request: PropertyRequest,
) -> Result<Property, ServiceError> {
    let resource = load(store, name).await?;
    let mut changes = ChangeSet::new();
    let owner = Owner::identity_resource(resource.id);
    let property = properties::stage_add(store, owner, &request, &mut changes).await?;
    stage_touch(resource, &mut changes);
    commit(store, changes, "add identity resource property").await?;
    Ok(property)
}

pub async fn remove_property(store: &dyn Store, name: &str, key: &str) -> Result<(), ServiceError> {
    let resource = load(store, name).await?;
    let mut changes = ChangeSet::new();
    properties::stage_remove(store, Owner::identity_resource(resource.id), key, &mut changes)
        .await?;
    stage_touch(resource, &mut changes);
    commit(store, changes, "remove identity resource property").await
}
