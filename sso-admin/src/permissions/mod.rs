//! Claims-encoded permission model.
//!
//! Roles hold `(resource, ACTION)` claims and `(client, true|false)` enablement
//! claims. At token issuance the union over a user's roles is flattened into one
//! `Permissions` claim, which the filter checks on every protected request.

pub mod assignment;
pub mod claims;
pub mod code;
pub mod filter;

pub(crate) use assignment::ActionMatrix;
pub(crate) use claims::{Claim, EffectivePermissionSet};
pub(crate) use code::{Action, PermissionCode, ResourceTag};
pub(crate) use filter::{
    Authorized, Principal, SsoServerCreate, SsoServerDelete, SsoServerUpdate, SsoServerView,
};
