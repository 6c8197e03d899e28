//! ECIES-style hybrid encryption keyed by a password.
//!
//! The password only ever yields the *recipient* key pair.  Each call to
//! `encrypt` generates an ephemeral P-256 key, runs ECDH against the
//! recipient's public key, stretches the shared secret with HKDF-SHA256
//! (fresh random salt) and seals the payload with AES-256-GCM (fresh nonce).
//!
//! Layout of the returned byte buffer (each `len` is one byte):
//!
//! ```text
//! [len][ephemeral public key, 65 bytes uncompressed SEC1]
//! [len][HKDF salt, 16 bytes]
//! [len][AES-GCM nonce, 12 bytes]
//! [ciphertext + 16-byte auth tag]
//! ```

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use hkdf::Hkdf;
use p256::ecdh::{EphemeralSecret, SharedSecret};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::kdf::{derive_keypair_from_password, derive_public_key, KdfParams};
use crate::errors::{Result, VaultError};

/// Length of an uncompressed SEC1 P-256 point.
pub const EPHEMERAL_KEY_LEN: usize = 65;

/// Length of the per-message HKDF salt.
pub const HKDF_SALT_LEN: usize = 16;

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-GCM authentication tag.
const TAG_LEN: usize = 16;

/// Smallest blob `encrypt` can produce (empty plaintext).
pub const MIN_BLOB_LEN: usize = 3 + EPHEMERAL_KEY_LEN + HKDF_SALT_LEN + NONCE_LEN + TAG_LEN;

/// Below this the three length bytes cannot even be present.
const MIN_HEADER_LEN: usize = 4;

/// Password-keyed hybrid cipher.
///
/// Holds no secrets, only the derivation parameters, so it is cheap to
/// copy into whatever owns the vault.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridCipher {
    params: KdfParams,
}

impl HybridCipher {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Encrypt `plaintext` so only holders of `password` can read it.
    ///
    /// Never returns the same bytes twice for the same input.
    pub fn encrypt(&self, password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let recipient = derive_public_key(password, &self.params)?;

        let ephemeral = EphemeralSecret::random(&mut OsRng);
        let ephemeral_point = ephemeral.public_key().to_encoded_point(false);
        let shared = ephemeral.diffie_hellman(&recipient);

        let mut hkdf_salt = [0u8; HKDF_SALT_LEN];
        rand::rng().fill_bytes(&mut hkdf_salt);

        let key = derive_symmetric_key(&shared, &hkdf_salt, self.params.hkdf_info)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

        let mut output = Vec::with_capacity(
            3 + ephemeral_point.len() + hkdf_salt.len() + nonce.len() + ciphertext.len(),
        );
        push_field(&mut output, ephemeral_point.as_bytes())?;
        push_field(&mut output, &hkdf_salt)?;
        push_field(&mut output, &nonce)?;
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    /// Decrypt a blob produced by `encrypt`.
    ///
    /// Every failure (truncated blob, overrunning length byte, invalid
    /// curve point, failed authentication) is reported as the same
    /// `DecryptionFailed`.  The recipient key is derived before the blob is
    /// parsed so malformed input costs the same PBKDF2 work as a wrong
    /// password.
    pub fn decrypt(&self, password: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
        let recipient = derive_keypair_from_password(password, &self.params)?;

        let parts = BlobParts::parse(blob).ok_or(VaultError::DecryptionFailed)?;
        if parts.nonce.len() != NONCE_LEN {
            return Err(VaultError::DecryptionFailed);
        }

        let ephemeral = PublicKey::from_sec1_bytes(parts.ephemeral_key)
            .map_err(|_| VaultError::DecryptionFailed)?;
        let shared = p256::ecdh::diffie_hellman(recipient.to_nonzero_scalar(), ephemeral.as_affine());

        let key = derive_symmetric_key(&shared, parts.hkdf_salt, self.params.hkdf_info)
            .map_err(|_| VaultError::DecryptionFailed)?;
        let cipher =
            Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| VaultError::DecryptionFailed)?;

        cipher
            .decrypt(Nonce::from_slice(parts.nonce), parts.ciphertext)
            .map_err(|_| VaultError::DecryptionFailed)
    }
}

/// HKDF-SHA256 over the ECDH x-coordinate.
fn derive_symmetric_key(
    shared: &SharedSecret,
    salt: &[u8],
    info: &[u8],
) -> Result<Zeroizing<[u8; 32]>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), shared.raw_secret_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(info, okm.as_mut_slice())
        .map_err(|e| VaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(okm)
}

fn push_field(out: &mut Vec<u8>, field: &[u8]) -> Result<()> {
    let len = u8::try_from(field.len()).map_err(|_| {
        VaultError::EncryptionFailed(format!("field of {} bytes exceeds 255", field.len()))
    })?;
    out.push(len);
    out.extend_from_slice(field);
    Ok(())
}

/// Borrowed views into a ciphertext blob.
struct BlobParts<'a> {
    ephemeral_key: &'a [u8],
    hkdf_salt: &'a [u8],
    nonce: &'a [u8],
    ciphertext: &'a [u8],
}

impl<'a> BlobParts<'a> {
    fn parse(blob: &'a [u8]) -> Option<Self> {
        if blob.len() < MIN_HEADER_LEN {
            return None;
        }
        let mut rest = blob;
        let ephemeral_key = take_field(&mut rest)?;
        let hkdf_salt = take_field(&mut rest)?;
        let nonce = take_field(&mut rest)?;
        if rest.len() < TAG_LEN {
            return None;
        }
        Some(Self {
            ephemeral_key,
            hkdf_salt,
            nonce,
            ciphertext: rest,
        })
    }
}

/// Split one length-prefixed field off the front of `rest`.
fn take_field<'a>(rest: &mut &'a [u8]) -> Option<&'a [u8]> {
    let (&len, tail) = rest.split_first()?;
    let len = usize::from(len);
    if tail.len() < len {
        return None;
    }
    let (field, tail) = tail.split_at(len);
    *rest = tail;
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> HybridCipher {
        HybridCipher::new(KdfParams::with_iterations(1_000, 1_500))
    }

    #[test]
    fn blob_layout_has_expected_lengths() {
        let blob = cipher().encrypt(b"pw", b"hello").unwrap();
        assert_eq!(blob[0] as usize, EPHEMERAL_KEY_LEN);
        assert_eq!(blob[1], 0x04, "uncompressed point marker");
        assert_eq!(blob[1 + EPHEMERAL_KEY_LEN] as usize, HKDF_SALT_LEN);
        assert_eq!(blob[2 + EPHEMERAL_KEY_LEN + HKDF_SALT_LEN] as usize, NONCE_LEN);
        assert_eq!(blob.len(), MIN_BLOB_LEN + 5);
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let c = cipher();
        let blob = c.encrypt(b"pw", b"").unwrap();
        assert_eq!(blob.len(), MIN_BLOB_LEN);
        assert!(c.decrypt(b"pw", &blob).unwrap().is_empty());
    }

    #[test]
    fn overrunning_length_byte_is_rejected() {
        let c = cipher();
        let mut blob = c.encrypt(b"pw", b"data").unwrap();
        blob[1 + EPHEMERAL_KEY_LEN] = 0xff;
        assert!(matches!(
            c.decrypt(b"pw", &blob),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn invalid_point_is_rejected() {
        let c = cipher();
        let mut blob = c.encrypt(b"pw", b"data").unwrap();
        // Corrupt the x-coordinate so the point leaves the curve.
        blob[2] ^= 0x01;
        assert!(matches!(
            c.decrypt(b"pw", &blob),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn short_blobs_are_rejected() {
        let c = cipher();
        for len in 0..8 {
            assert!(matches!(
                c.decrypt(b"pw", &vec![0u8; len]),
                Err(VaultError::DecryptionFailed)
            ));
        }
    }

    #[test]
    fn take_field_splits_prefix() {
        let data = [2u8, 0xaa, 0xbb, 1, 0xcc, 0xdd];
        let mut rest: &[u8] = &data;
        assert_eq!(take_field(&mut rest), Some(&[0xaa, 0xbb][..]));
        assert_eq!(take_field(&mut rest), Some(&[0xcc][..]));
        assert_eq!(rest, &[0xddu8]);
        assert_eq!(take_field(&mut rest), None);
    }
}
