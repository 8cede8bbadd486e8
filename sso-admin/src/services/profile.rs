use crate::errors::ServiceError;
use crate::models::User;
use crate::permissions::claims::{
    AVATAR_CLAIM, EMAIL_CLAIM, FULL_NAME_CLAIM, PERMISSIONS_CLAIM, ROLE_CLAIM, USER_NAME_CLAIM,
};
use crate::permissions::{Claim, EffectivePermissionSet};
use crate::store::Store;
use log::{debug, error};

async fn find_subject(store: &dyn Store, subject: &str) -> Result<User, ServiceError> {
    if let Some(user) = store.find_user(subject).await? {
        return Ok(user);
    }
    store
        .find_user_by_name(subject)
        .await?
        .ok_or_else(|| ServiceError::not_found("user", subject))
}

/// Computes the claims embedded in a token issued to `subject`, a user id or user name.
///
/// Permissions are decoded from the current role claims on every call.
pub async fn issue_claims(
    store: &dyn Store,
    subject: &str,
    default_avatar: &str,
) -> Result<(User, Vec<Claim>), ServiceError> {
    let user = find_subject(store, subject).await?;
    let roles = store.user_roles(&user.id).await?;

    let mut role_claims = Vec::new();
    for role in &roles {
        role_claims.extend(store.role_claims(&role.id).await?.iter().map(Claim::from));
    }
    let permissions = EffectivePermissionSet::from_claims(&role_claims);
    let encoded = permissions.to_claim_value().map_err(|e| {
        error!("Failed to encode permissions of '{}': {e}", user.user_name);
        ServiceError::Persistence("Failed to encode permissions".to_string())
    })?;

    let role_names: Vec<&str> = roles.iter().map(|role| role.name.as_str()).collect();
    let avatar = user
        .avatar_uri
        .as_deref()
        .filter(|uri| !uri.trim().is_empty())
        .unwrap_or(default_avatar);
    let claims = vec![
        Claim::new(FULL_NAME_CLAIM, user.full_name()),
        Claim::new(ROLE_CLAIM, role_names.join(";")),
        Claim::new(PERMISSIONS_CLAIM, encoded),
        Claim::new(USER_NAME_CLAIM, user.user_name.as_str()),
        Claim::new(EMAIL_CLAIM, user.email.as_str()),
        Claim::new(AVATAR_CLAIM, avatar),
    ];
    debug!(
        "Issued {} permission(s) across {} role(s) to '{}'",
        permissions.len(),
        roles.len(),
        user.user_name
    );
    Ok((user, claims))
}
