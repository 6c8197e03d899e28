//! Session-level vault operations.
//!
//! `VaultStorage` owns the file path, the master credential and the
//! in-memory model.  Its lifecycle is
//!
//! ```text
//! Uninitialized --create_new | load--> Unlocked --save*--> change_master | close
//! ```
//!
//! Every mutation requires `Unlocked`.  Nothing is written to disk until
//! `save` (or `change_master`, which saves as part of the operation).

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::crypto::{HybridCipher, KdfParams};
use crate::errors::{Result, VaultError};

use super::credential::{MasterCredential, SessionPassword};
use super::format::{self, ImportFormat};
use super::merge::{self, MergeReport};
use super::model::{new_id, Account, DefaultGroupNames, Group, VaultModel};
use super::search;

/// Construction-time knobs for a `VaultStorage`.
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    pub kdf: KdfParams,
    pub default_group: DefaultGroupNames,
}

/// State that only exists while the vault is unlocked.
struct Unlocked {
    credential: MasterCredential,
    password: SessionPassword,
}

/// The vault handle.  Bind it to a path, then `create_new` or `load`.
///
/// Not internally synchronized; see `SharedVault` for use across threads.
pub struct VaultStorage {
    path: PathBuf,
    cipher: HybridCipher,
    names: DefaultGroupNames,
    model: VaultModel,
    session: Option<Unlocked>,
}

impl VaultStorage {
    // ------------------------------------------------------------------
    // Construction and lifecycle
    // ------------------------------------------------------------------

    /// A storage bound to `path` with the production KDF parameters.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, StorageOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: StorageOptions) -> Self {
        Self {
            path: path.into(),
            cipher: HybridCipher::new(options.kdf),
            names: options.default_group,
            model: VaultModel::default(),
            session: None,
        }
    }

    /// Start an empty vault protected by `password`.
    ///
    /// Creates the default group and no accounts.  Does not touch the
    /// disk; call `save` to persist.
    pub fn create_new(&mut self, password: &str) -> Result<()> {
        self.require_uninitialized()?;

        let credential = MasterCredential::derive(password, self.cipher.params())?;
        let mut model = VaultModel::default();
        model.ensure_default_group(&self.names);

        self.model = model;
        self.session = Some(Unlocked {
            credential,
            password: SessionPassword::new(password),
        });
        debug!(path = %self.path.display(), "created new vault");
        Ok(())
    }

    /// Decrypt and open the vault file.
    ///
    /// A wrong password and a damaged file both fail with
    /// `DecryptionFailed`.  On any failure the storage stays
    /// uninitialized.
    pub fn load(&mut self, password: &str) -> Result<()> {
        self.require_uninitialized()?;

        let blob = format::read_file(&self.path)?;
        let plaintext = self.cipher.decrypt(password.as_bytes(), &blob)?;
        let payload = format::deserialize_payload(&plaintext)?;

        let credential = payload.credential()?.ok_or_else(|| {
            VaultError::InvalidFormat("vault has no master salt or hash".into())
        })?;
        if !credential.verify(password, self.cipher.params()) {
            warn!(path = %self.path.display(), "master hash did not verify after decryption");
            return Err(VaultError::InvalidFormat(
                "master password verification failed".into(),
            ));
        }

        let mut model = payload.data;
        if merge::normalize(&mut model, &self.names) {
            warn!(path = %self.path.display(), "migrated legacy default group or orphaned accounts");
        }

        self.model = model;
        self.session = Some(Unlocked {
            credential,
            password: SessionPassword::new(password),
        });
        debug!(
            path = %self.path.display(),
            groups = self.model.groups.len(),
            accounts = self.model.accounts.len(),
            "loaded vault"
        );
        Ok(())
    }

    /// Encrypt the vault under the session password and replace the file.
    pub fn save(&self) -> Result<()> {
        let session = self.session()?;
        self.write_with(&session.credential, &session.password)?;
        debug!(path = %self.path.display(), "saved vault");
        Ok(())
    }

    /// Replace the master password and re-encrypt the file in one step.
    ///
    /// The new credential only takes effect if the save succeeds.
    pub fn change_master(&mut self, old: &str, new: &str) -> Result<()> {
        let session = self.session()?;
        if !session.credential.verify(old, self.cipher.params()) {
            warn!("change_master rejected: current password did not verify");
            return Err(VaultError::IncorrectMasterPassword);
        }

        let credential = MasterCredential::derive(new, self.cipher.params())?;
        let password = SessionPassword::new(new);
        self.write_with(&credential, &password)?;

        self.session = Some(Unlocked {
            credential,
            password,
        });
        debug!(path = %self.path.display(), "master password changed");
        Ok(())
    }

    /// Check `password` against the master credential.
    pub fn verify_master(&self, password: &str) -> Result<bool> {
        let session = self.session()?;
        Ok(session.credential.verify(password, self.cipher.params()))
    }

    /// Forget the session password and the decrypted model.
    pub fn close(&mut self) {
        self.session = None;
        self.model = VaultModel::default();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_unlocked(&self) -> bool {
        self.session.is_some()
    }

    pub fn kdf_params(&self) -> &KdfParams {
        self.cipher.params()
    }

    pub fn default_group_names(&self) -> &DefaultGroupNames {
        &self.names
    }

    pub fn model(&self) -> &VaultModel {
        &self.model
    }

    pub fn groups(&self) -> &[Group] {
        &self.model.groups
    }

    pub fn accounts(&self) -> &[Account] {
        &self.model.accounts
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.model.account(id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.model.group(id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.model.group_by_name(name)
    }

    pub fn accounts_in_group(&self, group_id: &str) -> Vec<&Account> {
        self.model.accounts_in_group(group_id)
    }

    pub fn search(&self, query: &str, group: Option<&str>) -> Vec<&Account> {
        search::search(&self.model, query, group)
    }

    /// Id of the group that carries the default flag.
    pub fn default_group_id(&self) -> Result<&str> {
        self.model
            .default_group()
            .map(|g| g.id.as_str())
            .ok_or_else(|| VaultError::InvalidState("vault has no default group".into()))
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Add a group named `name` (trimmed).
    pub fn add_group(&mut self, name: &str) -> Result<Group> {
        self.session()?;
        let name = self.validate_group_name(name, None)?;

        let group = Group::new(name);
        self.model.groups.push(group.clone());
        Ok(group)
    }

    pub fn rename_group(&mut self, id: &str, name: &str) -> Result<()> {
        self.session()?;
        let idx = self
            .model
            .group_index(id)
            .ok_or_else(|| VaultError::GroupNotFound(id.to_string()))?;
        let name = self.validate_group_name(name, Some(idx))?;

        self.model.groups[idx].name = name;
        Ok(())
    }

    /// Delete a group, moving its accounts to `migrate_to` when that is
    /// another existing group, else to the default group.
    ///
    /// Returns how many accounts were moved.  Accounts are never deleted.
    pub fn delete_group(&mut self, id: &str, migrate_to: Option<&str>) -> Result<usize> {
        self.session()?;
        let idx = self
            .model
            .group_index(id)
            .ok_or_else(|| VaultError::GroupNotFound(id.to_string()))?;
        if self.model.groups[idx].is_default {
            return Err(VaultError::ProtectedGroup);
        }

        let target = match migrate_to {
            Some(t) if t != id && self.model.group(t).is_some() => t.to_string(),
            _ => self.default_group_id()?.to_string(),
        };

        self.model.groups.remove(idx);
        let mut moved = 0;
        for account in &mut self.model.accounts {
            if account.group() == Some(id) {
                account.group_id = Some(target.clone());
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Trim and check a group name.  `own` is the index of the group
    /// being renamed, which may keep its current name.
    fn validate_group_name(&self, name: &str, own: Option<usize>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(VaultError::EmptyGroupName);
        }

        let duplicate = self
            .model
            .groups
            .iter()
            .enumerate()
            .any(|(i, g)| g.name == name && Some(i) != own);
        if duplicate {
            return Err(VaultError::DuplicateGroupName(name.to_string()));
        }

        let renaming_default = own.is_some_and(|i| self.model.groups[i].is_default);
        if self.names.is_reserved(name) && !renaming_default && self.model.default_group().is_some() {
            return Err(VaultError::ReservedGroupName(name.to_string()));
        }
        Ok(name.to_string())
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Append an account and return its id.
    ///
    /// An empty id is replaced with a fresh one; a missing or unknown
    /// group falls back to the default group.
    pub fn add_account(&mut self, mut account: Account) -> Result<String> {
        self.session()?;
        if account.id.is_empty() {
            account.id = new_id();
        } else if self.model.account(&account.id).is_some() {
            return Err(VaultError::InvalidInput(format!(
                "an account with id '{}' already exists",
                account.id
            )));
        }
        self.heal_group(&mut account)?;

        let id = account.id.clone();
        self.model.accounts.push(account);
        Ok(id)
    }

    /// Replace the account with the same id.
    pub fn update_account(&mut self, mut account: Account) -> Result<()> {
        self.session()?;
        let idx = self
            .model
            .account_index(&account.id)
            .ok_or_else(|| VaultError::AccountNotFound(account.id.clone()))?;
        self.heal_group(&mut account)?;

        self.model.accounts[idx] = account;
        Ok(())
    }

    /// Remove an account.  Returns `false` if there was none with `id`.
    pub fn delete_account(&mut self, id: &str) -> Result<bool> {
        self.session()?;
        let before = self.model.accounts.len();
        self.model.accounts.retain(|a| a.id != id);
        Ok(self.model.accounts.len() != before)
    }

    fn heal_group(&self, account: &mut Account) -> Result<()> {
        let valid = account
            .group()
            .is_some_and(|gid| self.model.group(gid).is_some());
        if !valid {
            account.group_id = Some(self.default_group_id()?.to_string());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------

    /// Unencrypted, pretty-printed `{version, groups, accounts}`.
    pub fn export_plain(&self) -> Result<String> {
        format::export_plain_json(&self.model)
    }

    /// The same bytes `save` would write, for use as a backup file.
    pub fn export_encrypted(&self) -> Result<Vec<u8>> {
        let session = self.session()?;
        let plaintext = format::serialize_payload(&self.model, Some(&session.credential))?;
        self.cipher.encrypt(session.password.as_bytes(), &plaintext)
    }

    /// Import a plain export.  `merge = false` replaces all groups and
    /// accounts; the master credential is never replaced.
    pub fn import_plain(&mut self, text: &str, merge: bool) -> Result<MergeReport> {
        self.session()?;
        let incoming = format::parse_plain_import(text)?;
        self.apply_import(incoming, merge)
    }

    /// Import an encrypted export, decrypting with `password` or, when
    /// `None`, with the session password.
    pub fn import_encrypted(
        &mut self,
        blob: &[u8],
        password: Option<&str>,
        merge: bool,
    ) -> Result<MergeReport> {
        let session = self.session()?;
        let key = match password {
            Some(p) => p.as_bytes(),
            None => session.password.as_bytes(),
        };
        let plaintext = self.cipher.decrypt(key, blob)?;
        let incoming = format::deserialize_payload(&plaintext)?.data;
        self.apply_import(incoming, merge)
    }

    /// Detect the format of `bytes` and import accordingly.
    pub fn import_auto(
        &mut self,
        bytes: &[u8],
        password: Option<&str>,
        merge: bool,
    ) -> Result<MergeReport> {
        match ImportFormat::detect(bytes) {
            ImportFormat::Encrypted => self.import_encrypted(bytes, password, merge),
            ImportFormat::Plain => {
                let text = std::str::from_utf8(bytes).map_err(|_| {
                    VaultError::InvalidFormat("import file is neither encrypted nor UTF-8".into())
                })?;
                self.import_plain(text, merge)
            }
        }
    }

    fn apply_import(&mut self, incoming: VaultModel, keep_existing: bool) -> Result<MergeReport> {
        let report = if keep_existing {
            merge::merge(&mut self.model, incoming, &self.names)?
        } else {
            merge::replace(&mut self.model, incoming, &self.names)
        };
        debug!(merge = keep_existing, ?report, "import applied");
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn session(&self) -> Result<&Unlocked> {
        self.session.as_ref().ok_or(VaultError::NoMasterPassword)
    }

    fn require_uninitialized(&self) -> Result<()> {
        if self.session.is_some() {
            return Err(VaultError::InvalidState("vault is already open".into()));
        }
        Ok(())
    }

    fn write_with(&self, credential: &MasterCredential, password: &SessionPassword) -> Result<()> {
        let plaintext = format::serialize_payload(&self.model, Some(credential))?;
        let blob = self.cipher.encrypt(password.as_bytes(), &plaintext)?;
        format::write_atomic(&self.path, &blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fast_options() -> StorageOptions {
        StorageOptions {
            kdf: KdfParams::with_iterations(1_000, 1_500),
            ..StorageOptions::default()
        }
    }

    fn open_new() -> (TempDir, VaultStorage) {
        let dir = TempDir::new().unwrap();
        let mut storage = VaultStorage::with_options(dir.path().join("vault.dat"), fast_options());
        storage.create_new("pw").unwrap();
        (dir, storage)
    }

    #[test]
    fn mutations_require_a_session() {
        let dir = TempDir::new().unwrap();
        let mut storage = VaultStorage::with_options(dir.path().join("v.dat"), fast_options());

        assert!(matches!(storage.save(), Err(VaultError::NoMasterPassword)));
        assert!(matches!(
            storage.add_group("Work"),
            Err(VaultError::NoMasterPassword)
        ));
        assert!(matches!(
            storage.add_account(Account::new("n", "u", "p")),
            Err(VaultError::NoMasterPassword)
        ));
        assert!(matches!(
            storage.export_encrypted(),
            Err(VaultError::NoMasterPassword)
        ));
    }

    #[test]
    fn create_new_twice_is_a_state_error() {
        let (_dir, mut storage) = open_new();
        let err = storage.create_new("pw").unwrap_err();
        assert!(matches!(err, VaultError::InvalidState(_)));
    }

    #[test]
    fn add_account_heals_group_and_id() {
        let (_dir, mut storage) = open_new();
        let mut account = Account::new("n", "u", "p").with_group("ghost");
        account.id = String::new();

        let id = storage.add_account(account).unwrap();
        assert!(!id.is_empty());
        let default_id = storage.default_group_id().unwrap().to_string();
        assert_eq!(storage.account(&id).unwrap().group(), Some(default_id.as_str()));
    }

    #[test]
    fn add_account_rejects_duplicate_id() {
        let (_dir, mut storage) = open_new();
        let account = Account::new("n", "u", "p");
        storage.add_account(account.clone()).unwrap();
        assert!(matches!(
            storage.add_account(account),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn reserved_names_are_rejected_for_ordinary_groups() {
        let (_dir, mut storage) = open_new();
        assert!(matches!(
            storage.add_group("未定义"),
            Err(VaultError::ReservedGroupName(_))
        ));

        let work = storage.add_group("Work").unwrap();
        assert!(matches!(
            storage.rename_group(&work.id, "未分组"),
            Err(VaultError::DuplicateGroupName(_))
        ));
        assert!(matches!(
            storage.rename_group(&work.id, "未定义"),
            Err(VaultError::ReservedGroupName(_))
        ));
    }

    #[test]
    fn default_group_can_be_renamed_and_stays_default() {
        let (_dir, mut storage) = open_new();
        let default_id = storage.default_group_id().unwrap().to_string();

        storage.rename_group(&default_id, "Inbox").unwrap();
        assert_eq!(storage.default_group_id().unwrap(), default_id);
        storage.rename_group(&default_id, "未分组").unwrap();

        // A user group taking the old name does not steal the flag.
        storage.rename_group(&default_id, "Inbox").unwrap();
        let other = storage.add_group("Elsewhere").unwrap();
        assert!(storage.rename_group(&other.id, "未分组").is_err());
        assert_eq!(storage.default_group_id().unwrap(), default_id);
    }

    #[test]
    fn delete_group_ignores_invalid_migration_target() {
        let (_dir, mut storage) = open_new();
        let work = storage.add_group("Work").unwrap();
        storage
            .add_account(Account::new("n", "u", "p").with_group(work.id.clone()))
            .unwrap();

        let moved = storage.delete_group(&work.id, Some(&work.id)).unwrap();
        assert_eq!(moved, 1);
        let default_id = storage.default_group_id().unwrap().to_string();
        assert_eq!(storage.accounts()[0].group(), Some(default_id.as_str()));
    }

    #[test]
    fn delete_unknown_group_is_not_found() {
        let (_dir, mut storage) = open_new();
        assert!(matches!(
            storage.delete_group("nope", None),
            Err(VaultError::GroupNotFound(_))
        ));
    }

    #[test]
    fn failed_change_master_keeps_old_credential() {
        let (_dir, mut storage) = open_new();
        assert!(matches!(
            storage.change_master("wrong", "new"),
            Err(VaultError::IncorrectMasterPassword)
        ));
        assert!(storage.verify_master("pw").unwrap());
    }

    #[test]
    fn close_forgets_everything() {
        let (_dir, mut storage) = open_new();
        storage.add_account(Account::new("n", "u", "p")).unwrap();
        storage.close();

        assert!(!storage.is_unlocked());
        assert!(storage.accounts().is_empty());
        assert!(matches!(storage.save(), Err(VaultError::NoMasterPassword)));
    }
}
