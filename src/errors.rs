use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in MimaVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Authentication ---
    #[error("Incorrect master password")]
    IncorrectMasterPassword,

    // --- Corrupt data ---
    /// Carries no detail; a wrong password and a damaged file look the same.
    #[error("Vault data is corrupt or the password is incorrect")]
    DecryptionFailed,

    #[error("Data format error: {0}")]
    InvalidFormat(String),

    // --- Not found ---
    #[error("Vault file not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Account '{0}' not found")]
    AccountNotFound(String),

    #[error("Group '{0}' not found")]
    GroupNotFound(String),

    // --- Validation ---
    #[error("Group name cannot be empty")]
    EmptyGroupName,

    #[error("Group name '{0}' already exists")]
    DuplicateGroupName(String),

    #[error("'{0}' is reserved for the default group")]
    ReservedGroupName(String),

    #[error("The default group cannot be deleted")]
    ProtectedGroup,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- State ---
    #[error("No master password set; create or load a vault first")]
    NoMasterPassword,

    #[error("Invalid vault state: {0}")]
    InvalidState(String),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    // --- IO ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Internal ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    AuditError(String),
}

/// Coarse error categories exposed to callers that only need to decide
/// how to react (re-prompt, show a message, abort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    CorruptData,
    NotFound,
    Validation,
    State,
    Io,
    Internal,
}

impl VaultError {
    /// Map this error onto its category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IncorrectMasterPassword => ErrorKind::Authentication,
            Self::DecryptionFailed | Self::InvalidFormat(_) => ErrorKind::CorruptData,
            Self::VaultNotFound(_) | Self::AccountNotFound(_) | Self::GroupNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::EmptyGroupName
            | Self::DuplicateGroupName(_)
            | Self::ReservedGroupName(_)
            | Self::ProtectedGroup
            | Self::InvalidInput(_) => ErrorKind::Validation,
            Self::NoMasterPassword | Self::InvalidState(_) | Self::VaultAlreadyExists(_) => {
                ErrorKind::State
            }
            Self::Io(_) => ErrorKind::Io,
            Self::EncryptionFailed(_)
            | Self::KeyDerivationFailed(_)
            | Self::SerializationError(_)
            | Self::ConfigError(_)
            | Self::CommandFailed(_)
            | Self::AuditError(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience type alias for MimaVault results.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            VaultError::IncorrectMasterPassword.kind(),
            ErrorKind::Authentication
        );
        assert_eq!(VaultError::DecryptionFailed.kind(), ErrorKind::CorruptData);
        assert_eq!(
            VaultError::InvalidFormat("x".into()).kind(),
            ErrorKind::CorruptData
        );
        assert_eq!(
            VaultError::AccountNotFound("a".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            VaultError::VaultNotFound(PathBuf::from("v.dat")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            VaultError::DuplicateGroupName("Work".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(VaultError::ProtectedGroup.kind(), ErrorKind::Validation);
        assert_eq!(
            VaultError::ReservedGroupName("未分组".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(VaultError::NoMasterPassword.kind(), ErrorKind::State);
    }

    #[test]
    fn decryption_message_does_not_reveal_cause() {
        let msg = VaultError::DecryptionFailed.to_string();
        assert!(msg.contains("corrupt"));
        assert!(msg.contains("password"));
    }
}
