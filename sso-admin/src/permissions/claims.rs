use crate::models::RoleClaim;
use crate::permissions::code::{Action, PermissionCode, ResourceTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// Claim type carrying the serialized effective permission set in an issued token
pub const PERMISSIONS_CLAIM: &str = "Permissions";
pub const FULL_NAME_CLAIM: &str = "FullName";
pub const ROLE_CLAIM: &str = "Role";
pub const USER_NAME_CLAIM: &str = "UserName";
pub const EMAIL_CLAIM: &str = "Email";
pub const AVATAR_CLAIM: &str = "Avatar";

pub const ENABLED_VALUE: &str = "true";
pub const DISABLED_VALUE: &str = "false";

/// A (type, value) pair attached to a role or embedded in a token
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }

    pub fn for_role(self, role_id: &str) -> RoleClaim {
        RoleClaim {
            role_id: role_id.to_string(),
            claim_type: self.claim_type,
            claim_value: self.value,
        }
    }
}

impl From<&RoleClaim> for Claim {
    fn from(claim: &RoleClaim) -> Self {
        Claim::new(claim.claim_type.clone(), claim.claim_value.clone())
    }
}

/// Claim stored against a role to grant `action` on the resource named `resource`
pub fn encode_grant(resource: &str, action: Action) -> Claim {
    Claim::new(resource, action.as_str())
}

/// Claim stored against a role to enable or disable access to a client
pub fn encode_client_enablement(client_name: &str, enabled: bool) -> Claim {
    let value = if enabled { ENABLED_VALUE } else { DISABLED_VALUE };
    Claim::new(client_name, value)
}

/// Deduplicated union of a principal's permission tokens across all its roles.
///
/// Tokens are `"{type}_{ACTION}"` for action grants plus the bare client name
/// for every enabled client. Disabled clients contribute nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePermissionSet(BTreeSet<String>);

impl EffectivePermissionSet {
    /// Collects tokens from raw claims.
    ///
    /// Disabling a client stores an explicit `false` claim rather than deleting the
    /// row, so claims whose value is neither an action nor `true` are dropped here.
    pub fn from_claims<'a, I>(claims: I) -> Self
    where
        I: IntoIterator<Item = &'a Claim>,
    {
        let tokens = claims
            .into_iter()
            .filter_map(|claim| {
                if Action::from_token(&claim.value).is_some() {
                    Some(format!("{}_{}", claim.claim_type, claim.value))
                } else if claim.value == ENABLED_VALUE {
                    Some(claim.claim_type.clone())
                } else {
                    None
                }
            })
            .collect();
        Self(tokens)
    }

    pub fn contains(&self, code: PermissionCode) -> bool {
        self.0.contains(&code.to_string())
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Codes of the closed set that this permission set grants
    pub fn granted_codes(&self) -> Vec<PermissionCode> {
        PermissionCode::all().filter(|code| self.contains(*code)).collect()
    }

    /// Actions granted on a single resource tag
    pub fn actions_on(&self, resource: ResourceTag) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.contains(PermissionCode::new(resource, *action)))
            .collect()
    }

    /// Serialized form embedded as the value of the `Permissions` claim (a JSON array of strings)
    pub fn to_claim_value(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// Parses a `Permissions` claim value. Anything that is not a JSON array of
    /// strings yields `None`, which callers must treat as "grants nothing".
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str::<Vec<String>>(raw)
            .ok()
            .map(|tokens| Self(tokens.into_iter().collect()))
    }
}

impl FromIterator<String> for EffectivePermissionSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
