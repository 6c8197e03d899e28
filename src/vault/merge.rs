//! Folding an imported model into the open vault.
//!
//! Merging never deletes anything.  Groups are matched by exact name,
//! accounts by `(name, username)`; a matched account is overwritten in
//! place and keeps its id, an unmatched one is appended with a fresh id.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use super::model::{new_id, DefaultGroupNames, Group, VaultModel};
use crate::errors::{Result, VaultError};

/// What an import changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub groups_added: usize,
    pub accounts_added: usize,
    pub accounts_updated: usize,
}

/// Merge `incoming` into `dest`.
///
/// - An incoming group that is flagged default, or carries a reserved
///   default name, maps onto the destination's default group.
/// - Other groups reuse a destination group with the same (trimmed) name,
///   or are created.  Blank names are skipped.
/// - Each account's `group_id` is remapped through those matches and
///   falls back to the default group when its source group is unknown.
/// - The n-th incoming account with a given `(name, username)` overwrites
///   the n-th existing one, so importing an export of the same vault is
///   idempotent even when it holds duplicates.
pub(crate) fn merge(
    dest: &mut VaultModel,
    incoming: VaultModel,
    names: &DefaultGroupNames,
) -> Result<MergeReport> {
    let default_id = dest
        .default_group()
        .map(|g| g.id.clone())
        .ok_or_else(|| VaultError::InvalidState("vault has no default group".into()))?;

    let mut report = MergeReport::default();

    // Incoming group id -> destination group id.
    let mut group_map: HashMap<String, String> = HashMap::new();
    for group in incoming.groups {
        if group.is_default || names.is_reserved(group.name.trim()) {
            group_map.insert(group.id, default_id.clone());
            continue;
        }

        let name = group.name.trim();
        if name.is_empty() {
            continue;
        }

        let target = match dest.group_by_name(name) {
            Some(existing) => existing.id.clone(),
            None => {
                let created = Group::new(name);
                let id = created.id.clone();
                dest.groups.push(created);
                report.groups_added += 1;
                id
            }
        };
        group_map.insert(group.id, target);
    }

    // (name, username) -> unmatched destination indices, in order.
    let mut slots: HashMap<(String, String), VecDeque<usize>> = HashMap::new();
    for (idx, account) in dest.accounts.iter().enumerate() {
        slots
            .entry((account.name.clone(), account.username.clone()))
            .or_default()
            .push_back(idx);
    }

    for mut account in incoming.accounts {
        let group_id = account
            .group()
            .and_then(|gid| group_map.get(gid))
            .cloned()
            .unwrap_or_else(|| default_id.clone());
        account.group_id = Some(group_id);

        let key = (account.name.clone(), account.username.clone());
        match slots.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(idx) => {
                account.id = dest.accounts[idx].id.clone();
                dest.accounts[idx] = account;
                report.accounts_updated += 1;
            }
            None => {
                account.id = new_id();
                dest.accounts.push(account);
                report.accounts_added += 1;
            }
        }
    }

    debug!(
        groups_added = report.groups_added,
        accounts_added = report.accounts_added,
        accounts_updated = report.accounts_updated,
        "merged import"
    );
    Ok(report)
}

/// Replace the contents of `dest` with `incoming`, then restore the
/// model invariants: one default group, unique non-empty ids, unique
/// group names, no orphaned accounts.
pub(crate) fn replace(
    dest: &mut VaultModel,
    incoming: VaultModel,
    names: &DefaultGroupNames,
) -> MergeReport {
    *dest = incoming;

    dedupe_groups(dest);
    normalize(dest, names);

    let mut seen = HashSet::new();
    for account in &mut dest.accounts {
        if account.id.is_empty() || !seen.insert(account.id.clone()) {
            account.id = new_id();
            seen.insert(account.id.clone());
        }
    }

    debug!(
        groups = dest.groups.len(),
        accounts = dest.accounts.len(),
        "replaced vault contents"
    );
    MergeReport {
        groups_added: dest.groups.len(),
        accounts_added: dest.accounts.len(),
        accounts_updated: 0,
    }
}

/// Give every group a unique id and a unique trimmed name.
///
/// A repeated id is reissued, so accounts that pointed at it stay with
/// the first group carrying it.  Groups sharing a name fold into the
/// first of them and hand over their accounts.  Blank-named groups are
/// dropped unless flagged default; their accounts become orphans.
fn dedupe_groups(model: &mut VaultModel) {
    let mut ids = HashSet::new();
    for group in &mut model.groups {
        group.name = group.name.trim().to_string();
        if group.id.is_empty() || !ids.insert(group.id.clone()) {
            group.id = new_id();
            ids.insert(group.id.clone());
        }
    }

    let mut first_by_name: HashMap<String, usize> = HashMap::new();
    let mut folded: HashMap<String, String> = HashMap::new();
    let mut kept: Vec<Group> = Vec::with_capacity(model.groups.len());
    for group in model.groups.drain(..) {
        if group.name.is_empty() && !group.is_default {
            continue;
        }
        match first_by_name.get(&group.name) {
            Some(&idx) => {
                kept[idx].is_default |= group.is_default;
                folded.insert(group.id, kept[idx].id.clone());
            }
            None => {
                first_by_name.insert(group.name.clone(), kept.len());
                kept.push(group);
            }
        }
    }
    if !folded.is_empty() {
        debug!(folded = folded.len(), "folded duplicate group names");
    }
    model.groups = kept;

    for account in &mut model.accounts {
        let target = account.group().and_then(|gid| folded.get(gid)).cloned();
        if let Some(target) = target {
            account.group_id = Some(target);
        }
    }
}

/// Default-group migration plus orphan healing.  Returns `true` when
/// anything changed.
pub(crate) fn normalize(model: &mut VaultModel, names: &DefaultGroupNames) -> bool {
    let migrated = model.ensure_default_group(names);
    let healed = model.heal_orphans();
    migrated || healed > 0
}
