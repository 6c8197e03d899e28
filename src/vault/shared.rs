//! A `VaultStorage` shared between threads.
//!
//! All access goes through one mutex.  Saves can be pushed to a worker
//! thread so an interactive caller stays responsive; at most one such
//! save is in flight, and requests made meanwhile are skipped rather than
//! queued, since the next save writes the latest state anyway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::debug;

use super::store::VaultStorage;
use crate::errors::{Result, VaultError};

/// Outcome of `SharedVault::save_in_background`.
#[derive(Debug)]
pub enum SaveRequest {
    /// A worker is running `save`; join it for the result.
    Started(JoinHandle<Result<()>>),
    /// Another background save was still running.
    Skipped,
}

/// Cloneable handle to a mutex-guarded vault.
#[derive(Clone)]
pub struct SharedVault {
    inner: Arc<Mutex<VaultStorage>>,
    saving: Arc<AtomicBool>,
}

impl SharedVault {
    pub fn new(storage: VaultStorage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storage)),
            saving: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run `f` with exclusive access to the storage.
    pub fn with<R>(&self, f: impl FnOnce(&mut VaultStorage) -> R) -> Result<R> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| VaultError::InvalidState("vault lock poisoned".into()))?;
        Ok(f(&mut guard))
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Save on a worker thread unless a background save is already
    /// running.
    pub fn save_in_background(&self) -> Result<SaveRequest> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("background save already running, skipping");
            return Ok(SaveRequest::Skipped);
        }

        let inner = Arc::clone(&self.inner);
        let flag = InFlight(Arc::clone(&self.saving));
        let spawned = thread::Builder::new()
            .name("vault-save".into())
            .spawn(move || {
                let _flag = flag;
                let storage = inner
                    .lock()
                    .map_err(|_| VaultError::InvalidState("vault lock poisoned".into()))?;
                storage.save()
            });

        match spawned {
            Ok(handle) => Ok(SaveRequest::Started(handle)),
            Err(e) => {
                self.saving.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }
}

/// Clears the in-flight flag when the worker ends, even by panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KdfParams;
    use crate::vault::model::Account;
    use crate::vault::store::StorageOptions;
    use tempfile::TempDir;

    fn shared() -> (TempDir, SharedVault) {
        let dir = TempDir::new().unwrap();
        let options = StorageOptions {
            kdf: KdfParams::with_iterations(1_000, 1_500),
            ..StorageOptions::default()
        };
        let mut storage = VaultStorage::with_options(dir.path().join("vault.dat"), options);
        storage.create_new("pw").unwrap();
        (dir, SharedVault::new(storage))
    }

    #[test]
    fn second_request_is_skipped_while_first_is_in_flight() {
        let (_dir, vault) = shared();

        // Holding the lock keeps the first worker blocked.
        let first = vault
            .with(|_| {
                let first = vault.save_in_background().unwrap();
                let second = vault.save_in_background().unwrap();
                assert!(matches!(second, SaveRequest::Skipped));
                assert!(vault.is_saving());
                first
            })
            .unwrap();

        match first {
            SaveRequest::Started(handle) => handle.join().unwrap().unwrap(),
            SaveRequest::Skipped => panic!("first save should start"),
        }
        assert!(!vault.is_saving());
    }

    #[test]
    fn background_save_persists_latest_state() {
        let (dir, vault) = shared();
        vault
            .with(|s| s.add_account(Account::new("Mail", "me", "pw")))
            .unwrap()
            .unwrap();

        if let SaveRequest::Started(handle) = vault.save_in_background().unwrap() {
            handle.join().unwrap().unwrap();
        }

        let options = StorageOptions {
            kdf: KdfParams::with_iterations(1_000, 1_500),
            ..StorageOptions::default()
        };
        let mut reopened = VaultStorage::with_options(dir.path().join("vault.dat"), options);
        reopened.load("pw").unwrap();
        assert_eq!(reopened.accounts().len(), 1);
    }

    #[test]
    fn failed_save_clears_flag() {
        let dir = TempDir::new().unwrap();
        // Never unlocked: save fails with NoMasterPassword.
        let vault = SharedVault::new(VaultStorage::new(dir.path().join("v.dat")));

        match vault.save_in_background().unwrap() {
            SaveRequest::Started(handle) => {
                let err = handle.join().unwrap().unwrap_err();
                assert!(matches!(err, VaultError::NoMasterPassword));
            }
            SaveRequest::Skipped => panic!("nothing else was saving"),
        }
        assert!(!vault.is_saving());
    }
}
