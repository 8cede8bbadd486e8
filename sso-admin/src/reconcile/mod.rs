//! Whole-set replacement of a parent's child collection.
//!
//! The caller supplies the desired keys. The current keys are loaded fresh and
//! only the difference is written: removals first, then additions. Collections
//! whose keys must be unique across all parents are checked against the other
//! parents before anything is staged.

use crate::store::{Change, ChangeSet, ChildKind, Store, StoreError};
use log::{debug, warn};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ReconcileError {
    #[error("{kind} already in use by another {owner}: {joined}", owner = .kind.parent(), joined = .keys.join(", "))]
    Conflict { kind: ChildKind, keys: Vec<String> },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Minimal add/remove delta between two key sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub to_remove: BTreeSet<String>,
    pub to_add: BTreeSet<String>,
}

impl Delta {
    pub fn between(current: &BTreeSet<String>, desired: &BTreeSet<String>) -> Self {
        Self {
            to_remove: current.difference(desired).cloned().collect(),
            to_add: desired.difference(current).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }

    /// Row operations realizing the delta for one parent, removals first
    pub fn changes(&self, kind: ChildKind, parent: i64) -> impl Iterator<Item = Change> + '_ {
        let removals = self.to_remove.iter().map(move |key| Change::RemoveChild {
            kind,
            parent,
            key: key.clone(),
        });
        let additions = self.to_add.iter().map(move |key| Change::AddChild {
            kind,
            parent,
            key: key.clone(),
        });
        removals.chain(additions)
    }

    /// The set obtained by applying this delta to `current`
    pub fn apply_to(&self, current: &BTreeSet<String>) -> BTreeSet<String> {
        current
            .difference(&self.to_remove)
            .chain(self.to_add.iter())
            .cloned()
            .collect()
    }
}

/// Collapses caller-supplied keys into a set, dropping blanks and surrounding whitespace
pub fn desired_set<I, S>(keys: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .map(|key| key.as_ref().trim().to_string())
        .filter(|key| !key.is_empty())
        .collect()
}

/// Stages the changes bringing `parent`'s `kind` collection in line with `desired`.
///
/// Nothing is staged when a globally unique key is owned by another parent.
pub async fn reconcile<S>(
    store: &dyn Store,
    kind: ChildKind,
    parent: i64,
    desired: &[S],
    changes: &mut ChangeSet,
) -> Result<Delta, ReconcileError>
where
    S: AsRef<str> + Sync,
{
    let desired = desired_set(desired);

    if kind.is_globally_unique() && !desired.is_empty() {
        let taken = store
            .child_keys_owned_elsewhere(kind, parent, &desired)
            .await?;
        if !taken.is_empty() {
            warn!(
                "Rejected {} update of {} {}: {} key(s) owned elsewhere",
                kind,
                kind.parent(),
                parent,
                taken.len()
            );
            return Err(ReconcileError::Conflict {
                kind,
                keys: taken.into_iter().collect(),
            });
        }
    }

    let current = store.child_keys(kind, parent).await?;
    let delta = Delta::between(&current, &desired);
    debug!(
        "Reconciling {} of {} {}: -{} +{}",
        kind,
        kind.parent(),
        parent,
        delta.to_remove.len(),
        delta.to_add.len()
    );
    changes.extend(delta.changes(kind, parent));
    Ok(delta)
}
