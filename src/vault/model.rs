//! Account, Group and the in-memory vault model.
//!
//! Field order of the structs is the field order of the serialized
//! payload, so keep it stable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version written by this release.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Generate a new opaque record id (32 lowercase hex chars).
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A stored credential.
///
/// `password` is kept in clear text *inside* the encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl Account {
    /// Create an account with a fresh id and no group.
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            username: username.into(),
            password: password.into(),
            url: String::new(),
            notes: String::new(),
            group_id: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// The group id, treating an empty string like no group at all.
    pub fn group(&self) -> Option<&str> {
        self.group_id.as_deref().filter(|g| !g.is_empty())
    }
}

/// A named folder of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Exactly one group per vault carries this flag.  It is never
    /// inferred from the name after creation or migration.
    #[serde(default)]
    pub is_default: bool,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            is_default: false,
        }
    }

    pub(crate) fn new_default(name: impl Into<String>) -> Self {
        Self {
            is_default: true,
            ..Self::new(name)
        }
    }
}

/// Reserved names for the default group.
///
/// Used to name the default group of a new vault, to recognise it in
/// files written before the explicit flag existed, and to stop ordinary
/// groups from taking the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultGroupNames {
    /// Name given to a freshly created default group.
    pub primary: String,
    /// Additional names older files used for the default group.
    pub legacy: Vec<String>,
}

impl Default for DefaultGroupNames {
    fn default() -> Self {
        Self {
            primary: "未分组".to_string(),
            legacy: vec!["未定义".to_string()],
        }
    }
}

impl DefaultGroupNames {
    pub fn is_reserved(&self, name: &str) -> bool {
        self.primary == name || self.legacy.iter().any(|l| l == name)
    }
}

/// Groups, accounts and the schema version: everything that is encrypted
/// into the vault file apart from the master credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultModel {
    #[serde(default = "default_version")]
    pub version: u32,
    pub groups: Vec<Group>,
    pub accounts: Vec<Account>,
}

fn default_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl Default for VaultModel {
    fn default() -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            groups: Vec::new(),
            accounts: Vec::new(),
        }
    }
}

impl VaultModel {
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn default_group(&self) -> Option<&Group> {
        self.groups.iter().find(|g| g.is_default)
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub(crate) fn account_index(&self, id: &str) -> Option<usize> {
        self.accounts.iter().position(|a| a.id == id)
    }

    pub(crate) fn group_index(&self, id: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.id == id)
    }

    /// Accounts whose group is `group_id`, in stored order.
    pub fn accounts_in_group(&self, group_id: &str) -> Vec<&Account> {
        self.accounts
            .iter()
            .filter(|a| a.group() == Some(group_id))
            .collect()
    }

    /// Make sure exactly one group carries the default flag.
    ///
    /// Files written before the flag existed are migrated by adopting the
    /// first group with a reserved name; if there is none a new default
    /// group is appended.  Returns `true` when anything changed.
    pub(crate) fn ensure_default_group(&mut self, names: &DefaultGroupNames) -> bool {
        let mut seen = false;
        let mut changed = false;
        for group in &mut self.groups {
            if group.is_default {
                if seen {
                    group.is_default = false;
                    changed = true;
                }
                seen = true;
            }
        }
        if seen {
            return changed;
        }

        if let Some(group) = self.groups.iter_mut().find(|g| names.is_reserved(&g.name)) {
            group.is_default = true;
        } else {
            self.groups.push(Group::new_default(names.primary.clone()));
        }
        true
    }

    /// Point every account without a valid group at the default group.
    ///
    /// Returns how many accounts were reassigned.  Does nothing if the
    /// model has no default group yet.
    pub(crate) fn heal_orphans(&mut self) -> usize {
        let Some(default_id) = self.default_group().map(|g| g.id.clone()) else {
            return 0;
        };
        let group_ids: Vec<String> = self.groups.iter().map(|g| g.id.clone()).collect();

        let mut healed = 0;
        for account in &mut self.accounts {
            let valid = account
                .group()
                .is_some_and(|gid| group_ids.iter().any(|id| id == gid));
            if !valid {
                account.group_id = Some(default_id.clone());
                healed += 1;
            }
        }
        healed
    }
}
