//! Cryptographic primitives for MimaVault.
//!
//! This module provides:
//! - PBKDF2 key-pair derivation and master-password hashing (`kdf`)
//! - ECIES-style P-256 + AES-256-GCM hybrid encryption (`hybrid`)
//! - Password generation and strength scoring (`password`)

pub mod hybrid;
pub mod kdf;
pub mod password;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{HybridCipher, KdfParams, ...};
pub use hybrid::HybridCipher;
pub use kdf::{
    create_master_hash, derive_keypair_from_password, derive_public_key, generate_salt,
    verify_master_password, KdfParams,
};
pub use password::{generate_password, strength_score, GeneratorOptions, Strength};
