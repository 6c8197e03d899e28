use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::password::GeneratorOptions;
use crate::errors::{Result, VaultError};
use crate::vault::DefaultGroupNames;

/// User-level configuration, loaded from `.mimavault.toml`.
///
/// Every field has a default so MimaVault works without a config file.
/// Key-derivation parameters live in `KdfParams` instead; they are part
/// of the file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vault file name, relative to the config directory.
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Name given to the default group of a new vault.
    #[serde(default = "default_group_name")]
    pub default_group_name: String,

    /// Names older vaults used for the default group.
    #[serde(default = "default_legacy_group_names")]
    pub legacy_default_group_names: Vec<String>,

    /// Shortest accepted master password.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Longest accepted master password.
    #[serde(default = "default_max_password_length")]
    pub max_password_length: usize,

    /// Defaults for `mimavault generate` and `add --generate`.
    #[serde(default)]
    pub generator: GeneratorSettings,
}

/// The `[generator]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    #[serde(default = "default_generator_length")]
    pub length: usize,
    #[serde(default = "yes")]
    pub lowercase: bool,
    #[serde(default = "yes")]
    pub uppercase: bool,
    #[serde(default = "yes")]
    pub digits: bool,
    #[serde(default = "yes")]
    pub symbols: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_data_file() -> String {
    "vault.dat".to_string()
}

fn default_group_name() -> String {
    DefaultGroupNames::default().primary
}

fn default_legacy_group_names() -> Vec<String> {
    DefaultGroupNames::default().legacy
}

fn default_min_password_length() -> usize {
    8
}

fn default_max_password_length() -> usize {
    128
}

fn default_generator_length() -> usize {
    16
}

fn yes() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            default_group_name: default_group_name(),
            legacy_default_group_names: default_legacy_group_names(),
            min_password_length: default_min_password_length(),
            max_password_length: default_max_password_length(),
            generator: GeneratorSettings::default(),
        }
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            length: default_generator_length(),
            lowercase: true,
            uppercase: true,
            digits: true,
            symbols: true,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the config directory.
    pub const FILE_NAME: &'static str = ".mimavault.toml";

    /// Load settings from `<config_dir>/.mimavault.toml`.
    ///
    /// If the file does not exist, defaults are returned.  If it exists
    /// but cannot be parsed or fails validation, an error is returned.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;
        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.data_file.trim().is_empty() {
            return Err(VaultError::ConfigError("data_file cannot be empty".into()));
        }
        if self.default_group_name.trim().is_empty() {
            return Err(VaultError::ConfigError(
                "default_group_name cannot be empty".into(),
            ));
        }
        if self.min_password_length == 0 || self.min_password_length > self.max_password_length {
            return Err(VaultError::ConfigError(format!(
                "min_password_length ({}) must be between 1 and max_password_length ({})",
                self.min_password_length, self.max_password_length
            )));
        }
        Ok(())
    }

    /// Full path of the vault file.
    ///
    /// Example: `config_dir/vault.dat`
    pub fn vault_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.data_file)
    }

    /// Reserved default-group names for the storage layer.
    pub fn default_group(&self) -> DefaultGroupNames {
        DefaultGroupNames {
            primary: self.default_group_name.clone(),
            legacy: self.legacy_default_group_names.clone(),
        }
    }

    /// Check a new master password against the configured bounds.
    pub fn check_password_length(&self, password: &str) -> Result<()> {
        let len = password.chars().count();
        if len < self.min_password_length {
            return Err(VaultError::InvalidInput(format!(
                "password must be at least {} characters",
                self.min_password_length
            )));
        }
        if len > self.max_password_length {
            return Err(VaultError::InvalidInput(format!(
                "password cannot exceed {} characters",
                self.max_password_length
            )));
        }
        Ok(())
    }
}

impl GeneratorSettings {
    /// Convert into generator options for the crypto layer.
    pub fn options(&self) -> GeneratorOptions {
        GeneratorOptions {
            length: self.length,
            lowercase: self.lowercase,
            uppercase: self.uppercase,
            digits: self.digits,
            symbols: self.symbols,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
