pub mod client;
pub mod identity;
pub mod page;
pub mod resource;

pub(crate) use client::{
    AccessTokenType, Client, ClientAuthentication, ClientBasics, ClientClaim, ClientDeviceFlow,
    ClientOptions, ClientTokenSettings, Property, RefreshTokenExpiration, RefreshTokenUsage,
    Secret,
};
pub(crate) use identity::{Role, RoleClaim, User};
pub(crate) use page::{matches_filter, ListQuery, Page, PageRequest};
pub(crate) use resource::{ApiResource, ApiScope, IdentityResource};
