use super::{Change, ChangeSet, Store, StoreError};
use crate::models::{ApiResource, Role, User};
use crate::permissions::claims::encode_grant;
use crate::permissions::{Action, ResourceTag};
use chrono::{NaiveDate, Utc};
use log::info;
use uuid::Uuid;

pub const ADMIN_ROLE: &str = "Admin";
pub const MEMBER_ROLE: &str = "Member";
pub const ADMIN_USER: &str = "admin";

fn role(name: &str) -> Role {
    Role {
        id: name.to_string(),
        name: name.to_string(),
        normalized_name: name.to_uppercase(),
    }
}

/// Seeds an empty store with the administrative baseline.
///
/// Creates the `Admin` and `Member` roles, the `SSO_SERVER` api resource and an
/// `admin` user. `Admin` is granted every action on `SSO_SERVER`, `Member` only
/// `VIEW`. Returns the admin user, or `None` when the store already held roles,
/// users or api resources.
pub async fn seed(store: &dyn Store) -> Result<Option<User>, StoreError> {
    let populated = !store.roles().await?.is_empty()
        || !store.api_resource_names().await?.is_empty()
        || store.find_user_by_name(ADMIN_USER).await?.is_some();
    if populated {
        info!("Store already populated, skipping seed");
        return Ok(None);
    }

    let resource = ResourceTag::SsoServer.as_str();
    let admin = role(ADMIN_ROLE);
    let member = role(MEMBER_ROLE);
    let user = User {
        id: Uuid::new_v4().to_string(),
        user_name: ADMIN_USER.to_string(),
        first_name: "Admin".to_string(),
        last_name: String::new(),
        email: "admin@admin.com".to_string(),
        phone_number: None,
        dob: NaiveDate::from_ymd_opt(1998, 4, 11).unwrap_or_default(),
        avatar_uri: None,
        create_date: Utc::now(),
        last_modified_date: None,
    };

    let mut changes = ChangeSet::new();
    changes.push(Change::InsertApiResource(ApiResource {
        id: store.next_id().await?,
        name: resource.to_string(),
        display_name: Some("SSO Server".to_string()),
        description: Some("Administrative API of the identity provider".to_string()),
        enabled: true,
        show_in_discovery_document: true,
        allowed_access_token_signing_algorithms: None,
        created: Utc::now(),
        updated: None,
    }));
    changes.push(Change::InsertRole(admin.clone()));
    changes.push(Change::InsertRole(member.clone()));
    changes.push(Change::InsertUser(user.clone()));
    changes.push(Change::AddUserRole {
        user_id: user.id.clone(),
        role_id: admin.id.clone(),
    });
    changes.extend(
        Action::ALL
            .into_iter()
            .map(|action| Change::AddRoleClaim(encode_grant(resource, action).for_role(&admin.id))),
    );
    changes.push(Change::AddRoleClaim(
        encode_grant(resource, Action::View).for_role(&member.id),
    ));

    let rows = store.commit(changes).await?;
    info!("Seeded empty store ({rows} rows), admin user '{ADMIN_USER}'");
    Ok(Some(user))
}
