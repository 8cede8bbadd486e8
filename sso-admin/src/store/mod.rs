use crate::models::{
    ApiResource, ApiScope, Client, ClientClaim, IdentityResource, Page, PageRequest, Property,
    Role, RoleClaim, Secret, User,
};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub mod memory;
pub mod seed;

/// Errors reported by the persistence collaborator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{entity} '{key}' already exists")]
    UniqueViolation { entity: &'static str, key: String },
    #[error("{entity} '{key}' does not exist")]
    Missing { entity: &'static str, key: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Kind of entity owning a child collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParentKind {
    Client,
    ApiResource,
    ApiScope,
    IdentityResource,
}

impl fmt::Display for ParentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParentKind::Client => "client",
            ParentKind::ApiResource => "api resource",
            ParentKind::ApiScope => "api scope",
            ParentKind::IdentityResource => "identity resource",
        };
        f.write_str(name)
    }
}

/// Owner of a secret or a property row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Owner {
    pub kind: ParentKind,
    pub id: i64,
}

impl Owner {
    pub fn client(id: i64) -> Self {
        Self {
            kind: ParentKind::Client,
            id,
        }
    }

    pub fn api_resource(id: i64) -> Self {
        Self {
            kind: ParentKind::ApiResource,
            id,
        }
    }

    pub fn api_scope(id: i64) -> Self {
        Self {
            kind: ParentKind::ApiScope,
            id,
        }
    }

    pub fn identity_resource(id: i64) -> Self {
        Self {
            kind: ParentKind::IdentityResource,
            id,
        }
    }
}

/// One-to-many string collections maintained through whole-set replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChildKind {
    ClientCorsOrigin,
    ClientRedirectUri,
    ClientPostLogoutRedirectUri,
    ClientScope,
    ClientGrantType,
    ApiResourceClaim,
    ApiResourceScope,
    ApiScopeClaim,
    IdentityResourceClaim,
}

impl ChildKind {
    pub const ALL: [ChildKind; 9] = [
        ChildKind::ClientCorsOrigin,
        ChildKind::ClientRedirectUri,
        ChildKind::ClientPostLogoutRedirectUri,
        ChildKind::ClientScope,
        ChildKind::ClientGrantType,
        ChildKind::ApiResourceClaim,
        ChildKind::ApiResourceScope,
        ChildKind::ApiScopeClaim,
        ChildKind::IdentityResourceClaim,
    ];

    pub fn parent(&self) -> ParentKind {
        match self {
            ChildKind::ClientCorsOrigin
            | ChildKind::ClientRedirectUri
            | ChildKind::ClientPostLogoutRedirectUri
            | ChildKind::ClientScope
            | ChildKind::ClientGrantType => ParentKind::Client,
            ChildKind::ApiResourceClaim | ChildKind::ApiResourceScope => ParentKind::ApiResource,
            ChildKind::ApiScopeClaim => ParentKind::ApiScope,
            ChildKind::IdentityResourceClaim => ParentKind::IdentityResource,
        }
    }

    /// Whether a key may belong to at most one parent across the whole table
    pub fn is_globally_unique(&self) -> bool {
        matches!(
            self,
            ChildKind::ClientCorsOrigin
                | ChildKind::ClientRedirectUri
                | ChildKind::ClientPostLogoutRedirectUri
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChildKind::ClientCorsOrigin => "cors origin",
            ChildKind::ClientRedirectUri => "redirect uri",
            ChildKind::ClientPostLogoutRedirectUri => "post logout redirect uri",
            ChildKind::ClientScope => "allowed scope",
            ChildKind::ClientGrantType => "grant type",
            ChildKind::ApiResourceClaim | ChildKind::ApiScopeClaim | ChildKind::IdentityResourceClaim => {
                "user claim"
            }
            ChildKind::ApiResourceScope => "api resource scope",
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single write applied by [`Store::commit`]
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    InsertClient(Client),
    UpdateClient(Client),
    DeleteClient(i64),
    InsertApiResource(ApiResource),
    UpdateApiResource(ApiResource),
    DeleteApiResource(i64),
    InsertApiScope(ApiScope),
    UpdateApiScope(ApiScope),
    DeleteApiScope(i64),
    InsertIdentityResource(IdentityResource),
    UpdateIdentityResource(IdentityResource),
    DeleteIdentityResource(i64),
    InsertRole(Role),
    UpdateRole(Role),
    DeleteRole(String),
    InsertUser(User),
    UpdateUser(User),
    DeleteUser(String),
    AddChild {
        kind: ChildKind,
        parent: i64,
        key: String,
    },
    RemoveChild {
        kind: ChildKind,
        parent: i64,
        key: String,
    },
    InsertSecret {
        owner: Owner,
        secret: Secret,
    },
    DeleteSecret {
        owner: Owner,
        id: i64,
    },
    InsertProperty {
        owner: Owner,
        property: Property,
    },
    DeleteProperty {
        owner: Owner,
        key: String,
    },
    InsertClientClaim {
        client: i64,
        claim: ClientClaim,
    },
    DeleteClientClaim {
        client: i64,
        claim_type: String,
    },
    AddRoleClaim(RoleClaim),
    RemoveRoleClaim(RoleClaim),
    AddUserRole {
        user_id: String,
        role_id: String,
    },
    RemoveUserRole {
        user_id: String,
        role_id: String,
    },
}

/// Ordered list of changes committed as one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
}

impl Extend<Change> for ChangeSet {
    fn extend<T: IntoIterator<Item = Change>>(&mut self, iter: T) {
        self.changes.extend(iter);
    }
}

impl From<Vec<Change>> for ChangeSet {
    fn from(changes: Vec<Change>) -> Self {
        Self { changes }
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Persistence collaborator.
///
/// Reads are scoped per entity. All writes go through [`Store::commit`], which
/// applies a [`ChangeSet`] atomically and reports the number of affected rows.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn find_client(&self, client_id: &str) -> Result<Option<Client>, StoreError>;
    async fn find_client_by_name(&self, client_name: &str) -> Result<Option<Client>, StoreError>;
    async fn list_clients(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Client>, StoreError>;
    async fn client_names(&self) -> Result<Vec<String>, StoreError>;
    async fn client_claims(&self, client: i64) -> Result<Vec<ClientClaim>, StoreError>;

    /// Keys of one child collection, scoped to `parent`
    async fn child_keys(&self, kind: ChildKind, parent: i64) -> Result<BTreeSet<String>, StoreError>;

    /// The subset of `keys` already owned by a parent other than `parent`
    async fn child_keys_owned_elsewhere(
        &self,
        kind: ChildKind,
        parent: i64,
        keys: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StoreError>;

    async fn secrets(&self, owner: Owner) -> Result<Vec<Secret>, StoreError>;
    async fn properties(&self, owner: Owner) -> Result<Vec<Property>, StoreError>;

    async fn find_api_resource(&self, name: &str) -> Result<Option<ApiResource>, StoreError>;
    async fn list_api_resources(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<ApiResource>, StoreError>;
    async fn api_resource_names(&self) -> Result<Vec<String>, StoreError>;

    async fn find_api_scope(&self, name: &str) -> Result<Option<ApiScope>, StoreError>;
    async fn list_api_scopes(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<ApiScope>, StoreError>;
    async fn api_scope_names(&self) -> Result<Vec<String>, StoreError>;

    async fn find_identity_resource(&self, name: &str)
        -> Result<Option<IdentityResource>, StoreError>;
    async fn list_identity_resources(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<IdentityResource>, StoreError>;
    async fn identity_resource_names(&self) -> Result<Vec<String>, StoreError>;

    async fn find_role(&self, id: &str) -> Result<Option<Role>, StoreError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;
    async fn list_roles(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Role>, StoreError>;
    async fn roles(&self) -> Result<Vec<Role>, StoreError>;
    async fn role_claims(&self, role_id: &str) -> Result<Vec<RoleClaim>, StoreError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>, StoreError>;
    async fn list_users(
        &self,
        filter: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>, StoreError>;
    async fn user_roles(&self, user_id: &str) -> Result<Vec<Role>, StoreError>;

    /// Allocates a fresh row identifier
    async fn next_id(&self) -> Result<i64, StoreError>;

    /// Applies every change or none of them, returning the affected row count
    async fn commit(&self, changes: ChangeSet) -> Result<usize, StoreError>;

    async fn health_check(&self) -> Result<(), String>;
}
