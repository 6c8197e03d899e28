//! Byte encodings of the vault and the file I/O around them.
//!
//! The vault file holds nothing but a hybrid-cipher blob (see
//! `crypto::hybrid`).  Its plaintext is compact UTF-8 JSON:
//!
//! ```text
//! {"meta":{"salt":"<hex>"|null,"hash":"<hex>"|null,"version":1},
//!  "data":{"version":1,"groups":[...],"accounts":[...]}}
//! ```
//!
//! A plain export is the `data` object on its own, pretty-printed.
//! There is no magic number, so encrypted and plain import files are told
//! apart heuristically (`ImportFormat::detect`).

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::credential::MasterCredential;
use super::model::{VaultModel, CURRENT_SCHEMA_VERSION};
use crate::crypto::hybrid::{EPHEMERAL_KEY_LEN, MIN_BLOB_LEN};
use crate::errors::{Result, VaultError};

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// The `meta` section: master credential and schema version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMeta {
    #[serde(
        default,
        serialize_with = "hex_encode_opt",
        deserialize_with = "hex_decode_opt"
    )]
    pub salt: Option<Vec<u8>>,

    #[serde(
        default,
        serialize_with = "hex_encode_opt",
        deserialize_with = "hex_decode_opt"
    )]
    pub hash: Option<Vec<u8>>,

    #[serde(default = "current_version")]
    pub version: u32,
}

fn current_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

/// The full plaintext of a vault file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub meta: PayloadMeta,
    pub data: VaultModel,
}

/// Serialization view that borrows the model instead of cloning it.
#[derive(Serialize)]
struct PayloadRef<'a> {
    meta: PayloadMeta,
    data: &'a VaultModel,
}

impl Payload {
    /// The stored master credential, if both halves are present.
    pub fn credential(&self) -> Result<Option<MasterCredential>> {
        match (&self.meta.salt, &self.meta.hash) {
            (Some(salt), Some(hash)) => MasterCredential::from_parts(salt, hash).map(Some),
            _ => Ok(None),
        }
    }
}

/// Encode `model` and its credential as the AEAD plaintext.
pub fn serialize_payload(model: &VaultModel, credential: Option<&MasterCredential>) -> Result<Vec<u8>> {
    let payload = PayloadRef {
        meta: PayloadMeta {
            salt: credential.map(|c| c.salt().to_vec()),
            hash: credential.map(|c| c.hash().to_vec()),
            version: model.version,
        },
        data: model,
    };
    serde_json::to_vec(&payload)
        .map_err(|e| VaultError::SerializationError(format!("vault payload: {e}")))
}

/// Decode an AEAD plaintext.  Unknown fields are ignored.
pub fn deserialize_payload(bytes: &[u8]) -> Result<Payload> {
    serde_json::from_slice(bytes)
        .map_err(|e| VaultError::InvalidFormat(format!("vault payload: {e}")))
}

// ---------------------------------------------------------------------------
// Plain export / import
// ---------------------------------------------------------------------------

/// Human-readable, unencrypted export of `model`.
pub fn export_plain_json(model: &VaultModel) -> Result<String> {
    serde_json::to_string_pretty(model)
        .map_err(|e| VaultError::SerializationError(format!("plain export: {e}")))
}

/// Parse a plain import file.
///
/// Accepts the plain-export shape `{version, groups, accounts}` as well
/// as a full decrypted payload `{meta, data}`, whose `meta` is ignored.
pub fn parse_plain_import(text: &str) -> Result<VaultModel> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| VaultError::InvalidFormat(format!("import file is not valid JSON: {e}")))?;

    let model = match value.get("data") {
        Some(data) => VaultModel::deserialize(data),
        None => VaultModel::deserialize(&value),
    };
    model.map_err(|e| VaultError::InvalidFormat(format!("import file: {e}")))
}

/// How an import file is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Plain,
    Encrypted,
}

impl ImportFormat {
    /// Guess the encoding from the raw bytes.
    ///
    /// An encrypted blob starts with the length byte of an uncompressed
    /// P-256 point (65) and is at least as long as an empty ciphertext.
    /// A JSON file starts with `{` or whitespace, never with byte 65 (`A`).
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.first() {
            Some(&len) if usize::from(len) == EPHEMERAL_KEY_LEN && bytes.len() >= MIN_BLOB_LEN => {
                Self::Encrypted
            }
            _ => Self::Plain,
        }
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Read a whole vault file.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(VaultError::VaultNotFound(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

/// Replace `path` with `bytes` **atomically**.
///
/// The bytes go to a temp file in the same directory, are flushed to
/// disk, and the temp file is renamed over the target.  Readers see
/// either the old file or the new one, never a prefix.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = temp_path_for(path);

    let result = write_synced(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    sync_parent(path)?;
    Ok(())
}

/// Flush the directory entry created by the rename.
#[cfg(unix)]
fn sync_parent(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

// ---------------------------------------------------------------------------
// Serde helpers for optional hex-encoded byte fields
// ---------------------------------------------------------------------------

fn hex_encode_opt<S>(data: &Option<Vec<u8>>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match data {
        Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
        None => serializer.serialize_none(),
    }
}

fn hex_decode_opt<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<u8>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.is_empty() => hex::decode(&s).map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
