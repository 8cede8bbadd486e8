use crate::errors::{ApiError, ServiceError};
use crate::permissions::claims::{Claim, EffectivePermissionSet, PERMISSIONS_CLAIM};
use crate::permissions::code::PermissionCode;
use axum::extract::FromRequestParts;
use http::request::Parts;
use http::StatusCode;
use log::{debug, warn};
use std::marker::PhantomData;

/// The authenticated caller of an administrative request.
///
/// Inserted into request extensions by the bearer token middleware and handed
/// explicitly to every use case that needs to be authorized.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub subject: String,
    pub claims: Vec<Claim>,
}

impl Principal {
    pub fn new(subject: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self {
            subject: subject.into(),
            claims,
        }
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::new("Missing authenticated principal", StatusCode::UNAUTHORIZED))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingClaim,
    AmbiguousClaim,
    MalformedClaim,
    NotGranted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Per-request admission decision for `required` against a caller's token claims.
///
/// Never fails: a missing, duplicated or unparseable `Permissions` claim denies.
pub fn decide(claims: &[Claim], required: PermissionCode) -> Decision {
    let mut permission_claims = claims
        .iter()
        .filter(|claim| claim.claim_type == PERMISSIONS_CLAIM);

    let raw = match (permission_claims.next(), permission_claims.next()) {
        (None, _) => return Decision::Deny(DenyReason::MissingClaim),
        (Some(_), Some(_)) => return Decision::Deny(DenyReason::AmbiguousClaim),
        (Some(claim), None) => &claim.value,
    };

    match EffectivePermissionSet::decode(raw) {
        None => Decision::Deny(DenyReason::MalformedClaim),
        Some(granted) if granted.contains(required) => Decision::Allow,
        Some(_) => Decision::Deny(DenyReason::NotGranted),
    }
}

/// Runs the permission filter for a use case, mapping every denial to the same
/// Unauthorized outcome.
pub fn authorize(principal: &Principal, required: PermissionCode) -> Result<(), ServiceError> {
    match decide(&principal.claims, required) {
        Decision::Allow => {
            debug!("'{}' granted {}", principal.subject, required);
            Ok(())
        }
        Decision::Deny(reason) => {
            warn!(
                "Denied {} to '{}' ({:?})",
                required, principal.subject, reason
            );
            Err(ServiceError::Unauthorized(format!(
                "You are not authorized to perform this operation, {required} is required"
            )))
        }
    }
}

/// A permission code demanded by a route, named at the type level.
pub trait RequiredPermission {
    const CODE: PermissionCode;
}

macro_rules! required_permission {
    ($($name:ident => $code:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl RequiredPermission for $name {
                const CODE: PermissionCode = PermissionCode::$code;
            }
        )*
    };
}

required_permission! {
    SsoServerView => SSO_SERVER_VIEW,
    SsoServerCreate => SSO_SERVER_CREATE,
    SsoServerUpdate => SSO_SERVER_UPDATE,
    SsoServerDelete => SSO_SERVER_DELETE,
}

/// The caller, admitted only when it holds `P::CODE`.
///
/// Runs from request parts, so placed ahead of `Path`, `Query` or `Json` it
/// denies before any of them look at the request.
#[derive(Debug, Clone)]
pub struct Authorized<P> {
    pub principal: Principal,
    required: PhantomData<P>,
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: RequiredPermission + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        authorize(&principal, P::CODE)?;
        Ok(Self {
            principal,
            required: PhantomData,
        })
    }
}
