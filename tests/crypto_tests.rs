//! Integration tests for the MimaVault crypto module.

use mimavault::crypto::hybrid::{EPHEMERAL_KEY_LEN, HKDF_SALT_LEN, MIN_BLOB_LEN, NONCE_LEN};
use mimavault::crypto::kdf::{MASTER_HASH_LEN, MASTER_SALT_LEN};
use mimavault::crypto::{
    create_master_hash, derive_public_key, generate_password, strength_score,
    verify_master_password, GeneratorOptions, HybridCipher, KdfParams, Strength,
};
use mimavault::errors::VaultError;

fn fast() -> KdfParams {
    KdfParams::with_iterations(1_000, 1_500)
}

// ---------------------------------------------------------------------------
// Hybrid encryption
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let cipher = HybridCipher::new(fast());
    let plaintext = br#"{"meta":{},"data":{"groups":[],"accounts":[]}}"#;

    let blob = cipher.encrypt(b"Secret123!", plaintext).unwrap();
    assert_eq!(cipher.decrypt(b"Secret123!", &blob).unwrap(), plaintext);
}

#[test]
fn blob_layout_has_length_prefixed_fields() {
    let cipher = HybridCipher::new(fast());
    let blob = cipher.encrypt(b"pw", b"hello").unwrap();

    assert_eq!(usize::from(blob[0]), EPHEMERAL_KEY_LEN);
    // Uncompressed SEC1 points start with 0x04.
    assert_eq!(blob[1], 0x04);

    let salt_len_at = 1 + EPHEMERAL_KEY_LEN;
    assert_eq!(usize::from(blob[salt_len_at]), HKDF_SALT_LEN);

    let nonce_len_at = salt_len_at + 1 + HKDF_SALT_LEN;
    assert_eq!(usize::from(blob[nonce_len_at]), NONCE_LEN);

    assert_eq!(blob.len(), MIN_BLOB_LEN + b"hello".len());
}

#[test]
fn same_input_never_encrypts_the_same() {
    let cipher = HybridCipher::new(fast());
    let a = cipher.encrypt(b"pw", b"same").unwrap();
    let b = cipher.encrypt(b"pw", b"same").unwrap();
    assert_ne!(a, b);
}

#[test]
fn empty_plaintext_roundtrips() {
    let cipher = HybridCipher::new(fast());
    let blob = cipher.encrypt(b"pw", b"").unwrap();
    assert_eq!(blob.len(), MIN_BLOB_LEN);
    assert!(cipher.decrypt(b"pw", &blob).unwrap().is_empty());
}

#[test]
fn wrong_password_and_tampering_look_the_same() {
    let cipher = HybridCipher::new(fast());
    let blob = cipher.encrypt(b"right", b"payload").unwrap();

    let wrong = cipher.decrypt(b"wrong", &blob).unwrap_err();

    let mut tampered = blob.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    let damaged = cipher.decrypt(b"right", &tampered).unwrap_err();

    assert!(matches!(wrong, VaultError::DecryptionFailed));
    assert!(matches!(damaged, VaultError::DecryptionFailed));
    assert_eq!(wrong.to_string(), damaged.to_string());
}

#[test]
fn truncated_or_garbage_blobs_fail_cleanly() {
    let cipher = HybridCipher::new(fast());
    let blob = cipher.encrypt(b"pw", b"payload").unwrap();

    for input in [&[][..], &[65u8][..], &blob[..MIN_BLOB_LEN - 1], &[0xFF; 200][..]] {
        assert!(matches!(
            cipher.decrypt(b"pw", input),
            Err(VaultError::DecryptionFailed)
        ));
    }
}

#[test]
fn different_params_cannot_read_each_other() {
    let a = HybridCipher::new(KdfParams::with_iterations(1_000, 1_500));
    let b = HybridCipher::new(KdfParams::with_iterations(1_001, 1_500));
    let blob = a.encrypt(b"pw", b"x").unwrap();
    assert!(b.decrypt(b"pw", &blob).is_err());
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn public_key_is_deterministic_per_password() {
    let a = derive_public_key(b"pw", &fast()).unwrap();
    let b = derive_public_key(b"pw", &fast()).unwrap();
    let c = derive_public_key(b"other", &fast()).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn master_hash_verifies_only_the_right_password() {
    let (salt, hash) = create_master_hash(b"Secret123!", &fast()).unwrap();
    assert_eq!(salt.len(), MASTER_SALT_LEN);
    assert_eq!(hash.len(), MASTER_HASH_LEN);

    assert!(verify_master_password(b"Secret123!", &salt, &hash, &fast()));
    assert!(!verify_master_password(b"secret123!", &salt, &hash, &fast()));
    assert!(!verify_master_password(b"Secret123!", &salt, &hash[..31], &fast()));
}

#[test]
fn master_hash_salt_is_fresh_each_time() {
    let (salt_a, hash_a) = create_master_hash(b"pw", &fast()).unwrap();
    let (salt_b, hash_b) = create_master_hash(b"pw", &fast()).unwrap();
    assert_ne!(salt_a, salt_b);
    assert_ne!(hash_a, hash_b);
}

#[test]
fn invalid_params_are_rejected() {
    let zero = KdfParams::with_iterations(0, 1_500);
    assert!(derive_public_key(b"pw", &zero).is_err());
    assert!(HybridCipher::new(zero).encrypt(b"pw", b"x").is_err());
}

// ---------------------------------------------------------------------------
// Production parameters
// ---------------------------------------------------------------------------

#[test]
fn default_params_roundtrip_and_verify() {
    let params = KdfParams::default();
    assert_eq!(params.keypair_iterations, 200_000);
    assert_eq!(params.master_hash_iterations, 300_000);
    assert_eq!(params.keypair_salt, b"ECIES-KeyDerivation-Salt-2024");
    assert_eq!(params.hkdf_info, b"ECIES-AES-256-GCM");

    let cipher = HybridCipher::default();
    let blob = cipher.encrypt(b"Secret123!", b"payload").unwrap();
    assert_eq!(cipher.decrypt(b"Secret123!", &blob).unwrap(), b"payload");

    let (salt, hash) = create_master_hash(b"Secret123!", &params).unwrap();
    assert!(verify_master_password(b"Secret123!", &salt, &hash, &params));
}

// ---------------------------------------------------------------------------
// Password generator
// ---------------------------------------------------------------------------

#[test]
fn generated_passwords_use_only_enabled_classes() {
    let options = GeneratorOptions {
        length: 64,
        symbols: false,
        uppercase: false,
        ..GeneratorOptions::default()
    };
    let pw = generate_password(&options).unwrap();
    assert_eq!(pw.chars().count(), 64);
    assert!(pw
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
}

#[test]
fn generator_rejects_bad_options() {
    let none = GeneratorOptions {
        lowercase: false,
        uppercase: false,
        digits: false,
        symbols: false,
        ..GeneratorOptions::default()
    };
    assert!(generate_password(&none).is_err());

    let short = GeneratorOptions {
        length: 2,
        ..GeneratorOptions::default()
    };
    assert!(generate_password(&short).is_err());
}

#[test]
fn default_generated_password_is_strong() {
    let pw = generate_password(&GeneratorOptions::default()).unwrap();
    assert!(Strength::from_score(strength_score(&pw)) >= Strength::Strong);
    assert_eq!(Strength::from_score(strength_score("abc")), Strength::Weak);
}
