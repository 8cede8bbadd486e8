use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Action layered on top of a protected resource tag
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Update, Action::Delete];

    /// The claim value token stored against a role
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "VIEW",
            Action::Create => "CREATE",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == token)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource tags known to this build. Adding a tag is a versioned change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum ResourceTag {
    #[serde(rename = "SSO_SERVER")]
    SsoServer,
}

impl ResourceTag {
    pub const ALL: [ResourceTag; 1] = [ResourceTag::SsoServer];

    /// The claim type stored against a role, equal to the api resource name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceTag::SsoServer => "SSO_SERVER",
        }
    }
}

impl fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceTag {
    type Err = UnknownPermissionCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| UnknownPermissionCode(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission code '{0}'")]
pub struct UnknownPermissionCode(pub String);

/// A permission required to run an administrative operation, e.g. `SSO_SERVER_VIEW`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionCode {
    pub resource: ResourceTag,
    pub action: Action,
}

impl PermissionCode {
    pub const SSO_SERVER_VIEW: Self = Self::new(ResourceTag::SsoServer, Action::View);
    pub const SSO_SERVER_CREATE: Self = Self::new(ResourceTag::SsoServer, Action::Create);
    pub const SSO_SERVER_UPDATE: Self = Self::new(ResourceTag::SsoServer, Action::Update);
    pub const SSO_SERVER_DELETE: Self = Self::new(ResourceTag::SsoServer, Action::Delete);

    pub const fn new(resource: ResourceTag, action: Action) -> Self {
        Self { resource, action }
    }

    /// Every code of the closed set
    pub fn all() -> impl Iterator<Item = PermissionCode> {
        ResourceTag::ALL.into_iter().flat_map(|resource| {
            Action::ALL
                .into_iter()
                .map(move |action| PermissionCode::new(resource, action))
        })
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.resource, self.action)
    }
}

impl FromStr for PermissionCode {
    type Err = UnknownPermissionCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownPermissionCode(s.to_string());
        let (resource, action) = s.rsplit_once('_').ok_or_else(unknown)?;
        let resource = resource.parse::<ResourceTag>().map_err(|_| unknown())?;
        let action = Action::from_token(action).ok_or_else(unknown)?;
        Ok(Self::new(resource, action))
    }
}
