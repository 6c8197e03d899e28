//! Vault module: the encrypted account store.
//!
//! This module provides:
//! - `Account`, `Group` and `VaultModel` (`model`)
//! - Payload encoding, plain export parsing and atomic file I/O (`format`)
//! - The master credential and session password (`credential`)
//! - Import merging (`merge`) and account search (`search`)
//! - `VaultStorage`, the session-level API (`store`)
//! - `SharedVault` for use across threads (`shared`)

pub mod credential;
pub mod format;
pub mod merge;
pub mod model;
pub mod search;
pub mod shared;
pub mod store;

// Re-export the most commonly used items.
pub use credential::{MasterCredential, SessionPassword};
pub use format::ImportFormat;
pub use merge::MergeReport;
pub use model::{Account, DefaultGroupNames, Group, VaultModel};
pub use shared::{SaveRequest, SharedVault};
pub use store::{StorageOptions, VaultStorage};
