use crate::errors::ServiceError;
use crate::models::{matches_filter, ListQuery, Page, Role, RoleClaim};
use crate::permissions::assignment::{enablement_changes, is_client_enabled, permission_changes};
use crate::permissions::{ActionMatrix, Claim, ResourceTag};
use crate::services::{commit, required};
use crate::store::{Change, ChangeSet, Store};
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleView {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
}

impl From<Role> for RoleView {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            normalized_name: role.normalized_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RoleRequest {
    /// Required on update, generated on create when absent
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// One row of the permission matrix: a resource and the role's grants on it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RolePermission {
    #[serde(rename = "type")]
    pub resource: String,
    #[serde(flatten)]
    pub actions: ActionMatrix,
}

/// Whether a role enables a client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct RoleClientAccess {
    #[serde(rename = "type")]
    pub client_name: String,
    pub enable: bool,
}

async fn load(store: &dyn Store, role_id: &str) -> Result<Role, ServiceError> {
    store
        .find_role(role_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("role", role_id))
}

async fn claims_of(store: &dyn Store, role_id: &str) -> Result<Vec<Claim>, ServiceError> {
    let claims = store.role_claims(role_id).await?;
    Ok(claims.iter().map(Claim::from).collect())
}

pub async fn get(store: &dyn Store, role_id: &str) -> Result<RoleView, ServiceError> {
    Ok(load(store, role_id).await?.into())
}

pub async fn list(store: &dyn Store, query: &ListQuery) -> Result<Page<RoleView>, ServiceError> {
    let page = query.page().map_err(ServiceError::Validation)?;
    let roles = store.list_roles(query.filter(), page).await?;
    Ok(roles.map(RoleView::from))
}

pub async fn create(store: &dyn Store, request: RoleRequest) -> Result<RoleView, ServiceError> {
    let name = required(&request.name, "name")?;
    if store.find_role_by_name(name).await?.is_some() {
        return Err(ServiceError::conflict("role", name));
    }
    let id = match request.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    };
    if store.find_role(&id).await?.is_some() {
        return Err(ServiceError::conflict("role", &id));
    }
    let role = Role {
        id,
        name: name.to_string(),
        normalized_name: name.to_uppercase(),
    };
    commit(
        store,
        ChangeSet::from(vec![Change::InsertRole(role.clone())]),
        "create role",
    )
    .await?;
    info!("Created role '{}'", role.name);
    Ok(role.into())
}

pub async fn update(store: &dyn Store, role_id: &str, request: RoleRequest) -> Result<(), ServiceError> {
    if request.id.as_deref() != Some(role_id) {
        return Err(ServiceError::Validation("Role id not match".to_string()));
    }
    let name = required(&request.name, "name")?;
    let mut role = load(store, role_id).await?;
    if let Some(other) = store.find_role_by_name(name).await? {
        if other.id != role.id {
            return Err(ServiceError::conflict("role", name));
        }
    }
    role.name = name.to_string();
    role.normalized_name = name.to_uppercase();
    commit(
        store,
        ChangeSet::from(vec![Change::UpdateRole(role)]),
        "update role",
    )
    .await
}

pub async fn delete(store: &dyn Store, role_id: &str) -> Result<(), ServiceError> {
    let role = load(store, role_id).await?;
    commit(
        store,
        ChangeSet::from(vec![Change::DeleteRole(role.id.clone())]),
        "delete role",
    )
    .await?;
    info!("Deleted role '{}'", role.name);
    Ok(())
}

/// The role's grants on every api resource, filtered on the resource name
pub async fn permissions(
    store: &dyn Store,
    role_id: &str,
    query: &ListQuery,
) -> Result<Page<RolePermission>, ServiceError> {
    let page = query.page().map_err(ServiceError::Validation)?;
    let role = load(store, role_id).await?;
    let claims: Vec<RoleClaim> = store.role_claims(&role.id).await?;
    let rows = store
        .api_resource_names()
        .await?
        .into_iter()
        .filter(|name| matches_filter(query.filter(), [Some(name.as_str())]))
        .map(|name| RolePermission {
            actions: ActionMatrix::from_claims(&name, &claims),
            resource: name,
        });
    Ok(Page::slice(rows, page))
}

/// Brings the role's grants on one resource in line with the requested matrix
pub async fn set_permissions(
    store: &dyn Store,
    role_id: &str,
    request: RolePermission,
) -> Result<Vec<Claim>, ServiceError> {
    let role = load(store, role_id).await?;
    let resource = required(&request.resource, "type")?;
    resource
        .parse::<ResourceTag>()
        .map_err(|e| ServiceError::Validation(e.to_string()))?;
    if !store
        .api_resource_names()
        .await?
        .iter()
        .any(|name| name == resource)
    {
        return Err(ServiceError::Validation(format!(
            "'{resource}' is not an api resource"
        )));
    }

    let current = store.role_claims(&role.id).await?;
    let changes = permission_changes(&role.id, resource, request.actions, &current);
    commit(store, changes.into(), "update role permissions").await?;
    info!(
        "Role '{}' now holds {:?} on {}",
        role.name, request.actions, resource
    );
    claims_of(store, &role.id).await
}

/// Whether the role enables each client, filtered on the client name
pub async fn client_access(
    store: &dyn Store,
    role_id: &str,
    query: &ListQuery,
) -> Result<Page<RoleClientAccess>, ServiceError> {
    let page = query.page().map_err(ServiceError::Validation)?;
    let role = load(store, role_id).await?;
    let claims = store.role_claims(&role.id).await?;
    let rows = store
        .client_names()
        .await?
        .into_iter()
        .filter(|name| matches_filter(query.filter(), [Some(name.as_str())]))
        .map(|name| RoleClientAccess {
            enable: is_client_enabled(&name, &claims),
            client_name: name,
        });
    Ok(Page::slice(rows, page))
}

pub async fn set_client_access(
    store: &dyn Store,
    role_id: &str,
    request: RoleClientAccess,
) -> Result<Vec<Claim>, ServiceError> {
    let role = load(store, role_id).await?;
    let client_name = required(&request.client_name, "type")?;
    if store.find_client_by_name(client_name).await?.is_none() {
        return Err(ServiceError::Validation(format!(
            "'{client_name}' is not a client"
        )));
    }

    let current = store.role_claims(&role.id).await?;
    let changes = enablement_changes(&role.id, client_name, request.enable, &current);
    commit(store, changes.into(), "update role client access").await?;
    claims_of(store, &role.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiResource;
    use crate::permissions::claims::EffectivePermissionSet;
    use crate::services::clients::{self, CreateClientRequest};
    use crate::store::memory::MemoryStore;
    use chrono::Utc;

    async fn store_with_resources(names: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        let mut changes = ChangeSet::new();
        for name in names {
            changes.push(Change::InsertApiResource(ApiResource {
                id: store.next_id().await.unwrap(),
                name: name.to_string(),
                display_name: None,
                description: None,
                enabled: true,
                show_in_discovery_document: true,
                allowed_access_token_signing_algorithms: None,
                created: Utc::now(),
                updated: None,
            }));
        }
        store.commit(changes).await.unwrap();
        store
    }

    async fn role(store: &MemoryStore, name: &str) -> RoleView {
        create(
            store,
            RoleRequest {
                id: None,
                name: name.to_string(),
            },
        )
        .await
        .unwrap()
    }

    fn matrix(view: bool, create: bool, update: bool, delete: bool) -> ActionMatrix {
        ActionMatrix {
            view,
            create,
            update,
            delete,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let admin = role(&store, "Admin").await;
        assert_eq!(admin.normalized_name, "ADMIN");
        let duplicate = create(
            &store,
            RoleRequest {
                id: None,
                name: "admin".to_string(),
            },
        )
        .await;
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_with_mismatched_id() {
        let store = MemoryStore::new();
        let admin = role(&store, "Admin").await;
        let result = update(
            &store,
            &admin.id,
            RoleRequest {
                id: Some("other".to_string()),
                name: "Owner".to_string(),
            },
        )
        .await;
        assert_eq!(
            result,
            Err(ServiceError::Validation("Role id not match".to_string()))
        );

        update(
            &store,
            &admin.id,
            RoleRequest {
                id: Some(admin.id.clone()),
                name: "Owner".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(get(&store, &admin.id).await.unwrap().normalized_name, "OWNER");
    }

    #[tokio::test]
    async fn test_clearing_view_removes_the_grant() {
        let store = store_with_resources(&["SSO_SERVER"]).await;
        let admin = role(&store, "Admin").await;
        let request = |actions| RolePermission {
            resource: "SSO_SERVER".to_string(),
            actions,
        };

        let claims = set_permissions(&store, &admin.id, request(matrix(true, true, false, false)))
            .await
            .unwrap();
        assert_eq!(claims.len(), 2);

        let claims = set_permissions(&store, &admin.id, request(matrix(false, true, false, false)))
            .await
            .unwrap();
        let decoded = EffectivePermissionSet::from_claims(&claims);
        assert!(!decoded.contains_token("SSO_SERVER_VIEW"));
        assert!(decoded.contains_token("SSO_SERVER_CREATE"));
    }

    #[tokio::test]
    async fn test_repeating_a_matrix_is_a_no_op() {
        let store = store_with_resources(&["SSO_SERVER"]).await;
        let admin = role(&store, "Admin").await;
        let request = RolePermission {
            resource: "SSO_SERVER".to_string(),
            actions: ActionMatrix::FULL,
        };
        let first = set_permissions(&store, &admin.id, request.clone())
            .await
            .unwrap();
        let second = set_permissions(&store, &admin.id, request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_resource_types_are_rejected() {
        let store = store_with_resources(&["SSO_SERVER", "ORDERS"]).await;
        let admin = role(&store, "Admin").await;
        for resource in ["ORDERS", "MISSING"] {
            let result = set_permissions(
                &store,
                &admin.id,
                RolePermission {
                    resource: resource.to_string(),
                    actions: ActionMatrix::FULL,
                },
            )
            .await;
            assert!(matches!(result, Err(ServiceError::Validation(_))), "{resource}");
        }
        assert!(store.role_claims(&admin.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permission_rows_cover_every_resource() {
        let store = store_with_resources(&["SSO_SERVER", "ORDERS", "BILLING"]).await;
        let admin = role(&store, "Admin").await;
        set_permissions(
            &store,
            &admin.id,
            RolePermission {
                resource: "SSO_SERVER".to_string(),
                actions: matrix(true, false, false, false),
            },
        )
        .await
        .unwrap();

        let page = permissions(&store, &admin.id, &ListQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total_records, 3);
        let sso = page
            .items
            .iter()
            .find(|row| row.resource == "SSO_SERVER")
            .unwrap();
        assert_eq!(sso.actions, matrix(true, false, false, false));

        let filtered = ListQuery {
            filter: Some("ORD".to_string()),
            ..Default::default()
        };
        let page = permissions(&store, &admin.id, &filtered).await.unwrap();
        assert_eq!(page.total_records, 1);
        assert_eq!(page.items[0].actions, ActionMatrix::default());
    }

    #[tokio::test]
    async fn test_client_access_toggles() {
        let store = MemoryStore::new();
        clients::create(
            &store,
            CreateClientRequest {
                client_name: "portal".to_string(),
                basics: Default::default(),
                client_type: "spa".to_string(),
            },
        )
        .await
        .unwrap();
        let admin = role(&store, "Admin").await;
        let toggle = |enable| RoleClientAccess {
            client_name: "portal".to_string(),
            enable,
        };

        let claims = set_client_access(&store, &admin.id, toggle(true)).await.unwrap();
        assert_eq!(claims, vec![Claim::new("portal", "true")]);
        let page = client_access(&store, &admin.id, &ListQuery::default())
            .await
            .unwrap();
        assert!(page.items[0].enable);

        let claims = set_client_access(&store, &admin.id, toggle(false)).await.unwrap();
        assert_eq!(claims, vec![Claim::new("portal", "false")]);

        let unknown = set_client_access(
            &store,
            &admin.id,
            RoleClientAccess {
                client_name: "missing".to_string(),
                enable: true,
            },
        )
        .await;
        assert!(matches!(unknown, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_role_drops_its_claims() {
        let store = store_with_resources(&["SSO_SERVER"]).await;
        let admin = role(&store, "Admin").await;
        set_permissions(
            &store,
            &admin.id,
            RolePermission {
                resource: "SSO_SERVER".to_string(),
                actions: ActionMatrix::FULL,
            },
        )
        .await
        .unwrap();
        delete(&store, &admin.id).await.unwrap();
        assert!(store.role_claims(&admin.id).await.unwrap().is_empty());
        assert!(matches!(
            get(&store, &admin.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
