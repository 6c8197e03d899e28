//! The master credential and the in-memory session password.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::kdf::{
    create_master_hash, verify_master_password, KdfParams, MASTER_HASH_LEN, MASTER_SALT_LEN,
};
use crate::errors::{Result, VaultError};

/// Salt and verification hash for the master password.
///
/// Both halves are always generated together by `derive`; there is no
/// way to replace one without the other.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MasterCredential {
    salt: [u8; MASTER_SALT_LEN],
    hash: [u8; MASTER_HASH_LEN],
}

impl MasterCredential {
    /// Create a fresh credential (random salt) for `password`.
    pub fn derive(password: &str, params: &KdfParams) -> Result<Self> {
        let (salt, hash) = create_master_hash(password.as_bytes(), params)?;
        Ok(Self { salt, hash })
    }

    /// Rebuild a credential from stored bytes.
    pub fn from_parts(salt: &[u8], hash: &[u8]) -> Result<Self> {
        let salt: [u8; MASTER_SALT_LEN] = salt.try_into().map_err(|_| {
            VaultError::InvalidFormat(format!(
                "master salt must be {MASTER_SALT_LEN} bytes, got {}",
                salt.len()
            ))
        })?;
        let hash: [u8; MASTER_HASH_LEN] = hash.try_into().map_err(|_| {
            VaultError::InvalidFormat(format!(
                "master hash must be {MASTER_HASH_LEN} bytes, got {}",
                hash.len()
            ))
        })?;
        Ok(Self { salt, hash })
    }

    pub fn verify(&self, password: &str, params: &KdfParams) -> bool {
        verify_master_password(password.as_bytes(), &self.salt, &self.hash, params)
    }

    pub fn salt(&self) -> &[u8; MASTER_SALT_LEN] {
        &self.salt
    }

    pub fn hash(&self) -> &[u8; MASTER_HASH_LEN] {
        &self.hash
    }
}

impl fmt::Debug for MasterCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterCredential(..)")
    }
}

/// The plaintext master password, kept for the lifetime of an unlocked
/// session so saves can re-encrypt.  Wiped on drop.
#[derive(Clone)]
pub struct SessionPassword(Zeroizing<String>);

impl SessionPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Zeroizing::new(password.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SessionPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionPassword(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::with_iterations(1_000, 1_500)
    }

    #[test]
    fn derive_then_verify() {
        let cred = MasterCredential::derive("hunter2", &fast()).unwrap();
        assert!(cred.verify("hunter2", &fast()));
        assert!(!cred.verify("hunter3", &fast()));
    }

    #[test]
    fn from_parts_checks_lengths() {
        assert!(MasterCredential::from_parts(&[0u8; 16], &[0u8; 32]).is_ok());
        assert!(matches!(
            MasterCredential::from_parts(&[0u8; 15], &[0u8; 32]),
            Err(VaultError::InvalidFormat(_))
        ));
        assert!(matches!(
            MasterCredential::from_parts(&[0u8; 16], &[0u8; 31]),
            Err(VaultError::InvalidFormat(_))
        ));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cred = MasterCredential::from_parts(&[7u8; 16], &[9u8; 32]).unwrap();
        assert_eq!(format!("{cred:?}"), "MasterCredential(..)");
        let pw = SessionPassword::new("topsecret");
        assert!(!format!("{pw:?}").contains("topsecret"));
    }
}
