use crate::models::RoleClaim;
use crate::permissions::claims::{encode_client_enablement, encode_grant, ENABLED_VALUE};
use crate::permissions::code::Action;
use crate::store::Change;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// Desired view/create/update/delete grants of a role on one resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActionMatrix {
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub delete: bool,
}

impl ActionMatrix {
    pub const FULL: Self = Self {
        view: true,
        create: true,
        update: true,
        delete: true,
    };

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Create => self.create,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }

    /// Reads the grants a role currently holds on `resource`
    pub fn from_claims<'a, I>(resource: &str, claims: I) -> Self
    where
        I: IntoIterator<Item = &'a RoleClaim>,
    {
        let held: BTreeSet<&str> = claims
            .into_iter()
            .filter(|claim| claim.claim_type == resource)
            .map(|claim| claim.claim_value.as_str())
            .collect();
        Self {
            view: held.contains(Action::View.as_str()),
            create: held.contains(Action::Create.as_str()),
            update: held.contains(Action::Update.as_str()),
            delete: held.contains(Action::Delete.as_str()),
        }
    }
}

/// Stages the write that makes `claim` present or absent, if any is needed
pub fn ensure_membership(
    current: &BTreeSet<RoleClaim>,
    claim: RoleClaim,
    present: bool,
) -> Option<Change> {
    match (present, current.contains(&claim)) {
        (true, false) => Some(Change::AddRoleClaim(claim)),
        (false, true) => Some(Change::RemoveRoleClaim(claim)),
        _ => None,
    }
}

/// Changes bringing a role's grants on `resource` in line with `desired`
pub fn permission_changes(
    role_id: &str,
    resource: &str,
    desired: ActionMatrix,
    current: &[RoleClaim],
) -> Vec<Change> {
    let current: BTreeSet<RoleClaim> = current.iter().cloned().collect();
    Action::ALL
        .into_iter()
        .filter_map(|action| {
            let claim = encode_grant(resource, action).for_role(role_id);
            ensure_membership(&current, claim, desired.allows(action))
        })
        .collect()
}

/// Changes leaving exactly one enablement claim (`true` or `false`) for a client on a role
pub fn enablement_changes(
    role_id: &str,
    client_name: &str,
    enabled: bool,
    current: &[RoleClaim],
) -> Vec<Change> {
    let current: BTreeSet<RoleClaim> = current.iter().cloned().collect();
    let wanted = encode_client_enablement(client_name, enabled).for_role(role_id);
    let opposite = encode_client_enablement(client_name, !enabled).for_role(role_id);
    ensure_membership(&current, opposite, false)
        .into_iter()
        .chain(ensure_membership(&current, wanted, true))
        .collect()
}

/// Whether a role currently enables `client_name`
pub fn is_client_enabled(client_name: &str, claims: &[RoleClaim]) -> bool {
    claims
        .iter()
        .any(|claim| claim.claim_type == client_name && claim.claim_value == ENABLED_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::claims::{Claim, EffectivePermissionSet};

    fn role_claim(claim_type: &str, value: &str) -> RoleClaim {
        Claim::new(claim_type, value).for_role("admin")
    }

    fn apply(current: &[RoleClaim], changes: &[Change]) -> Vec<RoleClaim> {
        let mut claims: BTreeSet<RoleClaim> = current.iter().cloned().collect();
        for change in changes {
            match change {
                Change::AddRoleClaim(claim) => {
                    claims.insert(claim.clone());
                }
                Change::RemoveRoleClaim(claim) => {
                    claims.remove(claim);
                }
                other => panic!("unexpected change {other:?}"),
            }
        }
        claims.into_iter().collect()
    }

    #[test]
    fn test_view_false_removes_claim_from_decoded_set() {
        let current = vec![role_claim("API_X", "VIEW"), role_claim("API_X", "UPDATE")];
        let desired = ActionMatrix {
            update: true,
            ..Default::default()
        };

        let changes = permission_changes("admin", "API_X", desired, &current);
        assert_eq!(changes, vec![Change::RemoveRoleClaim(role_claim("API_X", "VIEW"))]);

        let after = apply(&current, &changes);
        let decoded = EffectivePermissionSet::from_claims(&after.iter().map(Claim::from).collect::<Vec<_>>());
        assert!(!decoded.contains_token("API_X_VIEW"));
        assert!(decoded.contains_token("API_X_UPDATE"));
    }

    #[test]
    fn test_granting_held_actions_is_a_noop() {
        let current = vec![role_claim("SSO_SERVER", "VIEW")];
        let desired = ActionMatrix {
            view: true,
            ..Default::default()
        };
        assert!(permission_changes("admin", "SSO_SERVER", desired, &current).is_empty());
    }

    #[test]
    fn test_full_matrix_adds_missing_actions_only() {
        let current = vec![role_claim("SSO_SERVER", "VIEW")];
        let changes = permission_changes("admin", "SSO_SERVER", ActionMatrix::FULL, &current);
        assert_eq!(
            changes,
            vec![
                Change::AddRoleClaim(role_claim("SSO_SERVER", "CREATE")),
                Change::AddRoleClaim(role_claim("SSO_SERVER", "UPDATE")),
                Change::AddRoleClaim(role_claim("SSO_SERVER", "DELETE")),
            ]
        );
        let after = apply(&current, &changes);
        assert_eq!(ActionMatrix::from_claims("SSO_SERVER", &after), ActionMatrix::FULL);
    }

    #[test]
    fn test_other_resources_are_untouched() {
        let current = vec![role_claim("OTHER", "VIEW")];
        let changes = permission_changes("admin", "SSO_SERVER", ActionMatrix::default(), &current);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_enable_then_disable_client() {
        let enabled = enablement_changes("admin", "dashboard", true, &[]);
        assert_eq!(enabled, vec![Change::AddRoleClaim(role_claim("dashboard", "true"))]);
        let after = apply(&[], &enabled);
        assert!(is_client_enabled("dashboard", &after));

        let disabled = enablement_changes("admin", "dashboard", false, &after);
        assert_eq!(
            disabled,
            vec![
                Change::RemoveRoleClaim(role_claim("dashboard", "true")),
                Change::AddRoleClaim(role_claim("dashboard", "false")),
            ]
        );
        let after = apply(&after, &disabled);
        assert!(!is_client_enabled("dashboard", &after));
        assert_eq!(after, vec![role_claim("dashboard", "false")]);
        let decoded = EffectivePermissionSet::from_claims(&after.iter().map(Claim::from).collect::<Vec<_>>());
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_enablement_is_idempotent() {
        let current = vec![role_claim("dashboard", "true")];
        assert!(enablement_changes("admin", "dashboard", true, &current).is_empty());
    }

    #[test]
    fn test_matrix_from_claims_ignores_enablement_values() {
        let claims = vec![
            role_claim("SSO_SERVER", "DELETE"),
            role_claim("SSO_SERVER", "true"),
        ];
        assert_eq!(
            ActionMatrix::from_claims("SSO_SERVER", &claims),
            ActionMatrix {
                delete: true,
                ..Default::default()
            }
        );
    }
}
