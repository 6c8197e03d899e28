//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! A password feeds two unrelated derivations:
//! - a **P-256 key pair** used as the static recipient of the hybrid
//!   cipher.  It uses a fixed, built-in salt so the same password always
//!   yields the same key pair and the private key never has to be stored.
//!   The consequence is that offline guessing costs only the password's
//!   entropy times the iteration count.
//! - a **verification hash** stored inside the vault, computed with a fresh
//!   random 16-byte salt and a different iteration count.
//!
//! The two never share a salt or an iteration count (`KdfParams::validate`).

use p256::elliptic_curve::bigint::U256;
use p256::elliptic_curve::ops::Reduce;
use p256::elliptic_curve::Field;
use p256::{FieldBytes, NonZeroScalar, PublicKey, Scalar, SecretKey};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::errors::{Result, VaultError};

/// Length of the master-hash salt in bytes.
pub const MASTER_SALT_LEN: usize = 16;

/// Length of the master verification hash in bytes.
pub const MASTER_HASH_LEN: usize = 32;

/// Length of the PBKDF2 output used as the private-scalar seed.
const SEED_LEN: usize = 32;

/// Fixed salt for key-pair derivation.  Changing it makes every existing
/// vault file undecryptable.
const KEYPAIR_SALT: &[u8] = b"ECIES-KeyDerivation-Salt-2024";

/// HKDF context label for the hybrid cipher.
const HKDF_INFO: &[u8] = b"ECIES-AES-256-GCM";

/// Tunable parameters for every password-derived value.
///
/// The defaults are the on-disk format; they are compiled in rather than
/// read from the config file because vaults written with other values
/// cannot be opened with the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// PBKDF2 rounds for the key-pair seed (default: 200 000).
    pub keypair_iterations: u32,
    /// PBKDF2 rounds for the master verification hash (default: 300 000).
    pub master_hash_iterations: u32,
    /// Salt for the key-pair seed.
    pub keypair_salt: &'static [u8],
    /// HKDF `info` used when deriving the AES key from the ECDH secret.
    pub hkdf_info: &'static [u8],
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            keypair_iterations: 200_000,
            master_hash_iterations: 300_000,
            keypair_salt: KEYPAIR_SALT,
            hkdf_info: HKDF_INFO,
        }
    }
}

impl KdfParams {
    /// Default salts and labels with custom iteration counts.
    ///
    /// Mostly useful for tests, where the production counts are slow.
    pub fn with_iterations(keypair_iterations: u32, master_hash_iterations: u32) -> Self {
        Self {
            keypair_iterations,
            master_hash_iterations,
            ..Self::default()
        }
    }

    /// Reject parameter sets that would weaken or break the derivations.
    pub fn validate(&self) -> Result<()> {
        if self.keypair_iterations < 1 || self.master_hash_iterations < 1 {
            return Err(VaultError::KeyDerivationFailed(
                "PBKDF2 iterations must be at least 1".into(),
            ));
        }
        if self.keypair_iterations == self.master_hash_iterations {
            return Err(VaultError::KeyDerivationFailed(
                "key-pair and master-hash iteration counts must differ".into(),
            ));
        }
        if self.keypair_salt.is_empty() {
            return Err(VaultError::KeyDerivationFailed(
                "key-pair salt cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Derive the deterministic P-256 private key for `password`.
///
/// The PBKDF2 seed is read as a big-endian integer and reduced modulo the
/// curve order; a zero result is mapped to one.  The resulting scalar is
/// always in `[1, n-1]`.
pub fn derive_keypair_from_password(password: &[u8], params: &KdfParams) -> Result<SecretKey> {
    params.validate()?;

    let mut seed = [0u8; SEED_LEN];
    pbkdf2_hmac::<Sha256>(
        password,
        params.keypair_salt,
        params.keypair_iterations,
        &mut seed,
    );
    let secret = secret_key_from_seed(&seed);
    seed.zeroize();
    secret
}

/// Public half of the key pair derived from `password`.
pub fn derive_public_key(password: &[u8], params: &KdfParams) -> Result<PublicKey> {
    Ok(derive_keypair_from_password(password, params)?.public_key())
}

fn secret_key_from_seed(seed: &[u8; SEED_LEN]) -> Result<SecretKey> {
    let mut scalar = <Scalar as Reduce<U256>>::reduce_bytes(FieldBytes::from_slice(seed));
    if bool::from(Field::is_zero(&scalar)) {
        scalar = <Scalar as Field>::ONE;
    }

    let scalar = Option::<NonZeroScalar>::from(NonZeroScalar::new(scalar)).ok_or_else(|| {
        VaultError::KeyDerivationFailed("derived scalar is outside [1, n-1]".into())
    })?;
    Ok(SecretKey::from(scalar))
}

/// Create a fresh master verification record for `password`.
///
/// Returns `(salt, hash)`; the salt is random on every call.
pub fn create_master_hash(
    password: &[u8],
    params: &KdfParams,
) -> Result<([u8; MASTER_SALT_LEN], [u8; MASTER_HASH_LEN])> {
    params.validate()?;
    let salt = generate_salt();
    let hash = hash_master(password, &salt, params);
    Ok((salt, hash))
}

/// Check `password` against a stored salt and hash.
///
/// The comparison runs in constant time.  A hash of the wrong length never
/// verifies.
pub fn verify_master_password(
    password: &[u8],
    salt: &[u8],
    expected_hash: &[u8],
    params: &KdfParams,
) -> bool {
    if expected_hash.len() != MASTER_HASH_LEN || params.validate().is_err() {
        return false;
    }
    let mut computed = hash_master(password, salt, params);
    let equal = computed[..].ct_eq(expected_hash).into();
    computed.zeroize();
    equal
}

fn hash_master(password: &[u8], salt: &[u8], params: &KdfParams) -> [u8; MASTER_HASH_LEN] {
    let mut hash = [0u8; MASTER_HASH_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, params.master_hash_iterations, &mut hash);
    hash
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; MASTER_SALT_LEN] {
    let mut salt = [0u8; MASTER_SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::with_iterations(1_000, 1_500)
    }

    #[test]
    fn defaults_match_file_format() {
        let p = KdfParams::default();
        assert_eq!(p.keypair_iterations, 200_000);
        assert_eq!(p.master_hash_iterations, 300_000);
        assert_eq!(p.keypair_salt, b"ECIES-KeyDerivation-Salt-2024");
        assert_eq!(p.hkdf_info, b"ECIES-AES-256-GCM");
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_rejects_shared_iteration_count() {
        assert!(KdfParams::with_iterations(5_000, 5_000).validate().is_err());
        assert!(KdfParams::with_iterations(0, 10).validate().is_err());
    }

    #[test]
    fn zero_seed_maps_to_scalar_one() {
        let key = secret_key_from_seed(&[0u8; SEED_LEN]).unwrap();
        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(key.to_bytes().as_slice(), &expected);
    }

    #[test]
    fn seed_equal_to_order_reduces_to_one() {
        // n itself reduces to zero, which maps to one.
        let order: [u8; 32] = [
            0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2,
            0xfc, 0x63, 0x25, 0x51,
        ];
        let key = secret_key_from_seed(&order).unwrap();
        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(key.to_bytes().as_slice(), &expected);
    }

    #[test]
    fn seed_above_order_is_reduced() {
        let key = secret_key_from_seed(&[0xff; SEED_LEN]).unwrap();
        // 2^256 - 1 - n
        let expected: [u8; 32] = [
            0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x43, 0x19, 0x05, 0x52, 0x58, 0xe8, 0x61, 0x7b, 0x0c, 0x46, 0x35, 0x3d,
            0x03, 0x9c, 0xda, 0xae,
        ];
        assert_eq!(key.to_bytes().as_slice(), &expected);
    }

    #[test]
    fn master_hash_uses_random_salt() {
        let (salt1, hash1) = create_master_hash(b"pw", &fast()).unwrap();
        let (salt2, hash2) = create_master_hash(b"pw", &fast()).unwrap();
        assert_ne!(salt1, salt2);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn verify_rejects_truncated_hash() {
        let (salt, hash) = create_master_hash(b"pw", &fast()).unwrap();
        assert!(verify_master_password(b"pw", &salt, &hash, &fast()));
        assert!(!verify_master_password(b"pw", &salt, &hash[..31], &fast()));
    }
}
