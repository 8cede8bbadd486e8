use super::{Change, ChangeSet, ChildKind, Owner, ParentKind, Store, StoreError};
use crate::models::{
    matches_filter, ApiResource, ApiScope, Client, ClientClaim, IdentityResource, Page,
    PageRequest, Property, Role, RoleClaim, Secret, User,
};
use async_trait::async_trait;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct Tables {
    clients: BTreeMap<i64, Client>,
    api_resources: BTreeMap<i64, ApiResource>,
    api_scopes: BTreeMap<i64, ApiScope>,
    identity_resources: BTreeMap<i64, IdentityResource>,
    roles: BTreeMap<String, Role>,
    users: BTreeMap<String, User>,
    children: BTreeMap<(ChildKind, i64), BTreeSet<String>>,
    secrets: BTreeMap<i64, (Owner, Secret)>,
    properties: BTreeMap<i64, (Owner, Property)>,
    client_claims: BTreeMap<i64, (i64, ClientClaim)>,
    role_claims: BTreeSet<RoleClaim>,
    /// (user id, role id)
    user_roles: BTreeSet<(String, String)>,
}

fn insert_row<K: Ord, V>(
    table: &mut BTreeMap<K, V>,
    key: K,
    value: V,
    entity: &'static str,
    label: impl ToString,
) -> Result<usize, StoreError> {
    if table.contains_key(&key) {
        return Err(StoreError::UniqueViolation {
            entity,
            key: label.to_string(),
        });
    }
    table.insert(key, value);
    Ok(1)
}

fn update_row<K: Ord, V>(
    table: &mut BTreeMap<K, V>,
    key: K,
    value: V,
    entity: &'static str,
    label: impl ToString,
) -> Result<usize, StoreError> {
    match table.get_mut(&key) {
        Some(row) => {
            *row = value;
            Ok(1)
        }
        None => Err(StoreError::Missing {
            entity,
            key: label.to_string(),
        }),
    }
}

fn delete_row<K: Ord, V>(
    table: &mut BTreeMap<K, V>,
    key: &K,
    entity: &'static str,
    label: impl ToString,
) -> Result<usize, StoreError> {
    table
        .remove(key)
        .map(|_| 1)
        .ok_or_else(|| StoreError::Missing {
            entity,
            key: label.to_string(),
        })
}

fn ensure_unique<I>(entity: &'static str, keys: I) -> Result<(), StoreError>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key.clone()) {
            return Err(StoreError::UniqueViolation { entity, key });
        }
    }
    Ok(())
}

impl Tables {
    fn apply(&mut self, change: Change) -> Result<usize, StoreError> {
        match change {
            Change::InsertClient(client) => {
                insert_row(&mut self.clients, client.id, client.clone(), "client", &client.client_id)
            }
            Change::UpdateClient(client) => {
                update_row(&mut self.clients, client.id, client.clone(), "client", &client.client_id)
            }
            Change::DeleteClient(id) => {
                let rows = delete_row(&mut self.clients, &id, "client", id)?;
                self.remove_owned(Owner::client(id));
                Ok(rows)
            }
            Change::InsertApiResource(resource) => insert_row(
                &mut self.api_resources,
                resource.id,
                resource.clone(),
                "api resource",
                &resource.name,
            ),
            Change::UpdateApiResource(resource) => update_row(
                &mut self.api_resources,
                resource.id,
                resource.clone(),
                "api resource",
                &resource.name,
            ),
            Change::DeleteApiResource(id) => {
                let rows = delete_row(&mut self.api_resources, &id, "api resource", id)?;
                self.remove_owned(Owner::api_resource(id));
                Ok(rows)
            }
            Change::InsertApiScope(scope) => {
                insert_row(&mut self.api_scopes, scope.id, scope.clone(), "api scope", &scope.name)
            }
            Change::UpdateApiScope(scope) => {
                update_row(&mut self.api_scopes, scope.id, scope.clone(), "api scope", &scope.name)
            }
            Change::DeleteApiScope(id) => {
                let rows = delete_row(&mut self.api_scopes, &id, "api scope", id)?;
                self.remove_owned(Owner::api_scope(id));
                Ok(rows)
            }
            Change::InsertIdentityResource(resource) => insert_row(
                &mut self.identity_resources,
                resource.id,
                resource.clone(),
                "identity resource",
                &resource.name,
            ),
            Change::UpdateIdentityResource(resource) => update_row(
                &mut self.identity_resources,
                resource.id,
                resource.clone(),
                "identity resource",
                &resource.name,
            ),
            Change::DeleteIdentityResource(id) => {
                let rows = delete_row(&mut self.identity_resources, &id, "identity resource", id)?;
                self.remove_owned(Owner::identity_resource(id));
                Ok(rows)
            }
            Change::InsertRole(role) => {
                insert_row(&mut self.roles, role.id.clone(), role.clone(), "role", &role.name)
            }
            Change::UpdateRole(role) => {
                update_row(&mut self.roles, role.id.clone(), role.clone(), "role", &role.name)
            }
            Change::DeleteRole(id) => {
                let rows = delete_row(&mut self.roles, &id, "role", &id)?;
                self.role_claims.retain(|claim| claim.role_id != id);
                self.user_roles.retain(|(_, role_id)| *role_id != id);
                Ok(rows)
            }
            Change::InsertUser(user) => {
                insert_row(&mut self.users, user.id.clone(), user.clone(), "user", &user.user_name)
            }
            Change::UpdateUser(user) => {
                update_row(&mut self.users, user.id.clone(), user.clone(), "user", &user.user_name)
            }
            Change::DeleteUser(id) => {
                let rows = delete_row(&mut self.users, &id, "user", &id)?;
                self.user_roles.retain(|(user_id, _)| *user_id != id);
                Ok(rows)
            }
            Change::AddChild { kind, parent, key } => {
                let inserted = self.children.entry((kind, parent)).or_default().insert(key);
                Ok(usize::from(inserted))
            }
            Change::RemoveChild { kind, parent, key } => {
                let removed = self
                    .children
                    .get_mut(&(kind, parent))
                    .is_some_and(|keys| keys.remove(&key));
                Ok(usize::from(removed))
            }
            Change::InsertSecret { owner, secret } => {
                insert_row(&mut self.secrets, secret.id, (owner, secret.clone()), "secret", secret.id)
            }
            Change::DeleteSecret { owner, id } => {
                let owned = self
                    .secrets
                    .get(&id)
                    .is_some_and(|(secret_owner, _)| *secret_owner == owner);
                if owned {
                    self.secrets.remove(&id);
                }
                Ok(usize::from(owned))
            }
            Change::InsertProperty { owner, property } => insert_row(
                &mut self.properties,
                property.id,
                (owner, property.clone()),
                "property",
                &property.key,
            ),
            Change::DeleteProperty { owner, key } => {
                let before = self.properties.len();
                self.properties
                    .retain(|_, (property_owner, property)| !(*property_owner == owner && property.key == key));
                Ok(before - self.properties.len())
            }
            Change::InsertClientClaim { client, claim } => insert_row(
                &mut self.client_claims,
                claim.id,
                (client, claim.clone()),
                "client claim",
                &claim.claim_type,
            ),
            Change::DeleteClientClaim { client, claim_type } => {
                let before = self.client_claims.len();
                self.client_claims
                    .retain(|_, (owner, claim)| !(*owner == client && claim.claim_type == claim_type));
                Ok(before - self.client_claims.len())
            }
            Change::AddRoleClaim(claim) => Ok(usize::from(self.role_claims.insert(claim))),
            Change::RemoveRoleClaim(claim) => Ok(usize::from(self.role_claims.remove(&claim))),
            Change::AddUserRole { user_id, role_id } => {
                Ok(usize::from(self.user_roles.insert((user_id, role_id))))
            }
            Change::RemoveUserRole { user_id, role_id } => {
                Ok(usize::from(self.user_roles.remove(&(user_id, role_id))))
            }
        }
    }

    /// Cascades the deletion of a parent to every row it owns
    fn remove_owned(&mut self, owner: Owner) {
        self.children
            .retain(|(kind, parent), _| !(kind.parent() == owner.kind && *parent == owner.id));
        self.secrets.retain(|_, (secret_owner, _)| *secret_owner != owner);
        self.properties.retain(|_, (property_owner, _)| *property_owner != owner);
        if owner.kind == ParentKind::Client {
            self.client_claims.retain(|_, (client, _)| *client != owner.id);
        }
    }

    /// Table-level constraints checked before a commit becomes visible
    fn validate(&self) -> Result<(), StoreError> {
        ensure_unique("client", self.clients.values().map(|c| c.client_id.clone()))?;
        ensure_unique("client name", self.clients.values().map(|c| c.client_name.clone()))?;
        ensure_unique("api resource", self.api_resources.values().map(|r| r.name.clone()))?;
        ensure_unique("api scope", self.api_scopes.values().map(|s| s.name.clone()))?;
        ensure_unique(
            "identity resource",
            self.identity_resources.values().map(|r| r.name.clone()),
        )?;
        ensure_unique("role", self.roles.values().map(|r| r.normalized_name.clone()))?;
        ensure_unique("user", self.users.values().map(|u| u.user_name.clone()))?;

        for kind in ChildKind::ALL.into_iter().filter(ChildKind::is_globally_unique) {
            let keys = self
                .children
                .iter()
                .filter(|((child_kind, _), _)| *child_kind == kind)
                .flat_map(|(_, keys)| keys.iter().cloned());
            ensure_unique(kind.label(), keys)?;
        }

        let mut seen = HashSet::new();
        for (owner, property) in self.properties.values() {
            if !seen.insert((*owner, property.key.as_str())) {
                return Err(StoreError::UniqueViolation {
                    entity: "property",
                    key: property.key.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for (client, claim) in self.client_claims.values() {
            if !seen.insert((*client, claim.claim_type.as_str())) {
                return Err(StoreError::UniqueViolation {
                    entity: "client claim",
                    key: claim.claim_type.clone(),
                });
            }
        }
        Ok(())
    }
}

/// In-process [`Store`] holding every table behind one lock
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_client(&self, client_id: &str) -> Result<Option<Client>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .clients
            .values()
            .find(|client| client.client_id == client_id)
            .cloned())
    }

    async fn find_client_by_name(&self, client_name: &str) -> Result<Option<Client>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .clients
            .values()
            .find(|client| client.client_name == client_name)
            .cloned())
    }

    async fn list_clients(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Client>, StoreError> {
        let tables = self.tables.read().await;
        let matching = tables
            .clients
            .values()
            .filter(|c| matches_filter(filter, [Some(c.client_id.as_str()), Some(c.client_name.as_str())]))
            .cloned();
        Ok(Page::slice(matching, page))
    }

    async fn client_names(&self) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.clients.values().map(|c| c.client_name.clone()).collect())
    }

    async fn client_claims(&self, client: i64) -> Result<Vec<ClientClaim>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .client_claims
            .values()
            .filter(|(owner, _)| *owner == client)
            .map(|(_, claim)| claim.clone())
            .collect())
    }

    async fn child_keys(&self, kind: ChildKind, parent: i64) -> Result<BTreeSet<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .children
            .get(&(kind, parent))
            .cloned()
            .unwrap_or_default())
    }

    async fn child_keys_owned_elsewhere(
        &self,
        kind: ChildKind,
        parent: i64,
        keys: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .children
            .iter()
            .filter(|((child_kind, owner), _)| *child_kind == kind && *owner != parent)
            .flat_map(|(_, owned)| owned.intersection(keys).cloned())
            .collect())
    }

    async fn secrets(&self, owner: Owner) -> Result<Vec<Secret>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .secrets
            .values()
            .filter(|(secret_owner, _)| *secret_owner == owner)
            .map(|(_, secret)| secret.clone())
            .collect())
    }

    async fn properties(&self, owner: Owner) -> Result<Vec<Property>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .properties
            .values()
            .filter(|(property_owner, _)| *property_owner == owner)
            .map(|(_, property)| property.clone())
            .collect())
    }

    async fn find_api_resource(&self, name: &str) -> Result<Option<ApiResource>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.api_resources.values().find(|r| r.name == name).cloned())
    }

    async fn list_api_resources(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<ApiResource>, StoreError> {
        let tables = self.tables.read().await;
        let matching = tables
            .api_resources
            .values()
            .filter(|r| matches_filter(filter, [Some(r.name.as_str()), r.display_name.as_deref()]))
            .cloned();
        Ok(Page::slice(matching, page))
    }

    async fn api_resource_names(&self) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.api_resources.values().map(|r| r.name.clone()).collect())
    }

    async fn find_api_scope(&self, name: &str) -> Result<Option<ApiScope>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.api_scopes.values().find(|s| s.name == name).cloned())
    }

    async fn list_api_scopes(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<ApiScope>, StoreError> {
        let tables = self.tables.read().await;
        let matching = tables
            .api_scopes
            .values()
            .filter(|s| matches_filter(filter, [Some(s.name.as_str()), s.display_name.as_deref()]))
            .cloned();
        Ok(Page::slice(matching, page))
    }

    async fn api_scope_names(&self) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.api_scopes.values().map(|s| s.name.clone()).collect())
    }

    async fn find_identity_resource(
        &self,
        name: &str,
    ) -> Result<Option<IdentityResource>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .identity_resources
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn list_identity_resources(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<IdentityResource>, StoreError> {
        let tables = self.tables.read().await;
        let matching = tables
            .identity_resources
            .values()
            .filter(|r| matches_filter(filter, [Some(r.name.as_str()), r.display_name.as_deref()]))
            .cloned();
        Ok(Page::slice(matching, page))
    }

    async fn identity_resource_names(&self) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .identity_resources
            .values()
            .map(|r| r.name.clone())
            .collect())
    }

    async fn find_role(&self, id: &str) -> Result<Option<Role>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.get(id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let normalized = name.to_uppercase();
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .values()
            .find(|role| role.normalized_name == normalized)
            .cloned())
    }

    async fn list_roles(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Role>, StoreError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Role> = tables
            .roles
            .values()
            .filter(|role| matches_filter(filter, [Some(role.name.as_str())]))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Page::slice(matching, page))
    }

    async fn roles(&self) -> Result<Vec<Role>, StoreError> {
        let tables = self.tables.read().await;
        let mut roles: Vec<Role> = tables.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn role_claims(&self, role_id: &str) -> Result<Vec<RoleClaim>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .role_claims
            .iter()
            .filter(|claim| claim.role_id == role_id)
            .cloned()
            .collect())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(id).cloned())
    }

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.user_name == user_name)
            .cloned())
    }

    async fn list_users(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>, StoreError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<User> = tables
            .users
            .values()
            .filter(|u| {
                matches_filter(
                    filter,
                    [
                        Some(u.email.as_str()),
                        Some(u.user_name.as_str()),
                        u.phone_number.as_deref(),
                        Some(u.first_name.as_str()),
                        Some(u.last_name.as_str()),
                    ],
                )
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.user_name.cmp(&b.user_name));
        Ok(Page::slice(matching, page))
    }

    async fn user_roles(&self, user_id: &str) -> Result<Vec<Role>, StoreError> {
        let tables = self.tables.read().await;
        let mut roles: Vec<Role> = tables
            .user_roles
            .iter()
            .filter(|(user, _)| user == user_id)
            .filter_map(|(_, role_id)| tables.roles.get(role_id).cloned())
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn next_id(&self) -> Result<i64, StoreError> {
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn commit(&self, changes: ChangeSet) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        let count = changes.len();
        let mut rows = 0;
        for change in changes {
            rows += staged.apply(change)?;
        }
        staged.validate()?;
        *tables = staged;
        debug!("Committed {count} changes, {rows} rows affected");
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}
