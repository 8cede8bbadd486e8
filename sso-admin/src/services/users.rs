use crate::errors::ServiceError;
use crate::models::{ListQuery, Page, User};
use crate::reconcile::Delta;
use crate::services::{commit, parse_date, required};
use crate::store::seed::MEMBER_ROLE;
use crate::store::{Change, ChangeSet, Store};
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub avatar_uri: Option<String>,
    pub create_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name,
            email: user.email,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            dob: user.dob,
            avatar_uri: user.avatar_uri,
            create_date: user.create_date,
            last_modified_date: user.last_modified_date,
        }
    }
}

/// Profile fields shared by create and update
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileRequest {
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Date of birth, `YYYY-MM-DD`
    pub dob: String,
    #[serde(default)]
    pub avatar_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub user_name: String,
    #[serde(flatten)]
    pub profile: UserProfileRequest,
}

/// A user together with the roles held and the roles available
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRolesView {
    #[serde(flatten)]
    pub user: UserView,
    pub user_roles: Vec<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRolesRequest {
    /// Role names, replacing the user's current roles
    pub user_roles: Vec<String>,
}

async fn load(store: &dyn Store, user_id: &str) -> Result<User, ServiceError> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("user", user_id))
}

fn apply_profile(user: &mut User, profile: UserProfileRequest) -> Result<(), ServiceError> {
    user.email = required(&profile.email, "email")?.to_string();
    user.dob = parse_date(&profile.dob, "dob")?;
    user.phone_number = profile.phone_number;
    user.first_name = profile.first_name;
    user.last_name = profile.last_name;
    user.avatar_uri = profile.avatar_uri;
    Ok(())
}

pub async fn create(store: &dyn Store, request: CreateUserRequest) -> Result<UserView, ServiceError> {
    let user_name = required(&request.user_name, "userName")?;
    if store.find_user_by_name(user_name).await?.is_some() {
        return Err(ServiceError::conflict("user", user_name));
    }
    let mut user = User {
        id: Uuid::new_v4().to_string(),
        user_name: user_name.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        phone_number: None,
        dob: NaiveDate::default(),
        avatar_uri: None,
        create_date: Utc::now(),
        last_modified_date: None,
    };
    apply_profile(&mut user, request.profile)?;

    let mut changes = ChangeSet::new();
    changes.push(Change::InsertUser(user.clone()));
    match store.find_role_by_name(MEMBER_ROLE).await? {
        Some(member) => changes.push(Change::AddUserRole {
            user_id: user.id.clone(),
            role_id: member.id,
        }),
        None => warn!("Role '{MEMBER_ROLE}' does not exist, '{user_name}' starts without roles"),
    }
    commit(store, changes, "create user").await?;
    info!("Created user '{}'", user.user_name);
    Ok(user.into())
}

pub async fn list(store: &dyn Store, query: &ListQuery) -> Result<Page<UserView>, ServiceError> {
    let page = query.page().map_err(ServiceError::Validation)?;
    let users = store.list_users(query.filter(), page).await?;
    Ok(users.map(UserView::from))
}

pub async fn get(store: &dyn Store, user_id: &str) -> Result<UserView, ServiceError> {
    Ok(load(store, user_id).await?.into())
}

pub async fn update(
    store: &dyn Store,
    user_id: &str,
    request: UserProfileRequest,
) -> Result<(), ServiceError> {
    let mut user = load(store, user_id).await?;
    apply_profile(&mut user, request)?;
    user.last_modified_date = Some(Utc::now());
    commit(
        store,
        ChangeSet::from(vec![Change::UpdateUser(user)]),
        "update user",
    )
    .await
}

pub async fn delete(store: &dyn Store, user_id: &str) -> Result<(), ServiceError> {
    let user = load(store, user_id).await?;
    commit(
        store,
        ChangeSet::from(vec![Change::DeleteUser(user.id.clone())]),
        "delete user",
    )
    .await?;
    info!("Deleted user '{}'", user.user_name);
    Ok(())
}

pub async fn roles(store: &dyn Store, user_id: &str) -> Result<UserRolesView, ServiceError> {
    let user = load(store, user_id).await?;
    let user_roles = store.user_roles(&user.id).await?;
    let roles = store.roles().await?;
    Ok(UserRolesView {
        user: user.into(),
        user_roles: user_roles.into_iter().map(|role| role.name).collect(),
        roles: roles.into_iter().map(|role| role.name).collect(),
    })
}

/// Replaces the user's role memberships with the named roles
pub async fn set_roles(
    store: &dyn Store,
    user_id: &str,
    request: UserRolesRequest,
) -> Result<(), ServiceError> {
    let wanted: BTreeSet<&str> = request
        .user_roles
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if wanted.is_empty() {
        return Err(ServiceError::Validation(
            "A user must hold at least one role".to_string(),
        ));
    }

    let mut user = load(store, user_id).await?;
    let mut desired = BTreeSet::new();
    for name in wanted {
        let role = store
            .find_role_by_name(name)
            .await?
            .ok_or_else(|| ServiceError::Validation(format!("Role '{name}' does not exist")))?;
        desired.insert(role.id);
    }
    let current: BTreeSet<String> = store
        .user_roles(&user.id)
        .await?
        .into_iter()
        .map(|role| role.id)
        .collect();

    let delta = Delta::between(&current, &desired);
    if delta.is_empty() {
        return Ok(());
    }
    let mut changes = ChangeSet::new();
    changes.extend(delta.to_remove.into_iter().map(|role_id| Change::RemoveUserRole {
        user_id: user.id.clone(),
        role_id,
    }));
    changes.extend(delta.to_add.into_iter().map(|role_id| Change::AddUserRole {
        user_id: user.id.clone(),
        role_id,
    }));
    user.last_modified_date = Some(Utc::now());
    changes.push(Change::UpdateUser(user));
    commit(store, changes, "update user roles").await
}
