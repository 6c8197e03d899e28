//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use dialoguer::{Confirm, Password};
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::KdfParams;
use crate::errors::{Result, VaultError};
use crate::vault::{Account, Group, StorageOptions, VaultStorage};

/// Environment variable holding the master password for scripted use.
pub const PASSWORD_ENV: &str = "MIMAVAULT_PASSWORD";

/// Environment variable holding the new master password for `change-master`.
pub const NEW_PASSWORD_ENV: &str = "MIMAVAULT_NEW_PASSWORD";

/// MimaVault CLI: local encrypted password vault.
#[derive(Parser)]
#[command(
    name = "mimavault",
    about = "Local encrypted password vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (default: `data_file` from the config, in the config directory)
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// Directory holding .mimavault.toml (default: current directory)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// List accounts, optionally filtered
    List {
        /// Only accounts in this group (name or id)
        #[arg(short, long)]
        group: Option<String>,
        /// Fuzzy or regex search over name, username and URL
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one account
    Show {
        /// Account id or unique name
        account: String,
        /// Print the password instead of masking it
        #[arg(long)]
        reveal: bool,
        /// Copy the password to the clipboard
        #[arg(short, long)]
        copy: bool,
    },

    /// Add an account
    Add {
        /// Display name (e.g. GitHub)
        name: String,
        /// Login name
        #[arg(short, long)]
        username: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Group name or id (default group if omitted)
        #[arg(short, long)]
        group: Option<String>,
        /// Generate a random password instead of prompting
        #[arg(long)]
        generate: bool,
    },

    /// Change fields of an account
    Edit {
        /// Account id or unique name
        account: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        username: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Move to this group (name or id)
        #[arg(short, long)]
        group: Option<String>,
        /// Prompt for a new password
        #[arg(long)]
        password: bool,
    },

    /// Delete an account
    Delete {
        /// Account id or unique name
        account: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Manage groups
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Change the vault's master password
    ChangeMaster,

    /// Export the vault as plain JSON or as an encrypted file
    Export {
        /// Write an encrypted export (requires --output)
        #[arg(long)]
        encrypted: bool,
        /// Output file path (plain exports print to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a plain JSON or encrypted export
    Import {
        /// File to import
        file: PathBuf,
        /// Replace the vault contents instead of merging
        #[arg(long)]
        replace: bool,
        /// Prompt for the export's password instead of using the master password
        #[arg(long)]
        ask_password: bool,
        /// Skip confirmation prompt for --replace
        #[arg(short, long)]
        force: bool,
    },

    /// Generate a random password
    Generate {
        /// Password length (default from config)
        #[arg(short, long)]
        length: Option<usize>,
        #[arg(long)]
        no_lower: bool,
        #[arg(long)]
        no_upper: bool,
        #[arg(long)]
        no_digits: bool,
        #[arg(long)]
        no_symbols: bool,
    },

    /// View the audit log of vault operations
    #[cfg(feature = "audit-log")]
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

/// Group subcommands.
#[derive(clap::Subcommand)]
pub enum GroupAction {
    /// List groups with account counts
    List,

    /// Create a group
    Add { name: String },

    /// Rename a group
    Rename {
        /// Group name or id
        group: String,
        new_name: String,
    },

    /// Delete a group, moving its accounts
    Delete {
        /// Group name or id
        group: String,
        /// Move accounts here instead of the default group
        #[arg(long)]
        migrate_to: Option<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Settings and vault location resolved from the global flags.
pub struct Context {
    pub settings: Settings,
    pub vault_path: PathBuf,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_dir = match &cli.config_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let settings = Settings::load(&config_dir)?;
        let vault_path = match &cli.file {
            Some(file) => file.clone(),
            None => settings.vault_path(&config_dir),
        };
        Ok(Self {
            settings,
            vault_path,
        })
    }

    /// A locked storage handle for the vault file.
    pub fn storage(&self) -> VaultStorage {
        let options = StorageOptions {
            kdf: KdfParams::default(),
            default_group: self.settings.default_group(),
        };
        VaultStorage::with_options(self.vault_path.clone(), options)
    }

    /// Prompt for the master password and unlock the vault.
    pub fn open_vault(&self) -> Result<VaultStorage> {
        if !self.vault_path.exists() {
            output::tip("Run `mimavault init` to create a vault.");
            return Err(VaultError::VaultNotFound(self.vault_path.clone()));
        }
        let password = prompt_password()?;
        self.unlock(&password)
    }

    /// Unlock the vault with a password the caller already has.
    pub fn unlock(&self, password: &str) -> Result<VaultStorage> {
        let mut storage = self.storage();
        storage.load(password)?;
        Ok(storage)
    }

    /// Record an operation in the audit log next to the vault.
    pub fn audit(&self, operation: &str, target: Option<&str>, details: Option<&str>) {
        #[cfg(feature = "audit-log")]
        crate::audit::log_audit(&self.vault_path, operation, target, details);

        #[cfg(not(feature = "audit-log"))]
        let _ = (operation, target, details);
    }
}

/// Get the master password from `MIMAVAULT_PASSWORD`, or prompt for it.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    prompt_secret_with_env(PASSWORD_ENV, "Master password")
}

fn prompt_secret_with_env(var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(var) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Get a new master password, from `var` or an interactive prompt with
/// confirmation.  The configured length bounds are enforced either way.
pub fn prompt_new_password(settings: &Settings, var: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(var) {
        if !pw.is_empty() {
            settings.check_password_length(&pw)?;
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = Password::new()
            .with_prompt("Choose master password")
            .with_confirmation(
                "Confirm master password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;

        if let Err(e) = settings.check_password_length(&password) {
            output::warning(&format!("{e}. Try again."));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Prompt for an account password (entered twice).
pub fn prompt_account_password() -> Result<Zeroizing<String>> {
    let password = Password::new()
        .with_prompt("Account password")
        .with_confirmation("Confirm account password", "Passwords do not match")
        .allow_empty_password(true)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(password))
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Find an account by id, or else by a name that only one account has.
pub fn resolve_account<'a>(storage: &'a VaultStorage, query: &str) -> Result<&'a Account> {
    if let Some(account) = storage.account(query) {
        return Ok(account);
    }

    let mut named = storage.accounts().iter().filter(|a| a.name == query);
    match (named.next(), named.next()) {
        (Some(account), None) => Ok(account),
        (Some(_), Some(_)) => Err(VaultError::InvalidInput(format!(
            "several accounts are named '{query}'; use the id instead"
        ))),
        (None, _) => Err(VaultError::AccountNotFound(query.to_string())),
    }
}

/// Find a group by id or exact name.
pub fn resolve_group<'a>(storage: &'a VaultStorage, query: &str) -> Result<&'a Group> {
    storage
        .group(query)
        .or_else(|| storage.group_by_name(query.trim()))
        .ok_or_else(|| VaultError::GroupNotFound(query.to_string()))
}

/// Read a file named on the command line.
pub fn read_input_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(VaultError::CommandFailed(format!(
            "file not found: {}",
            path.display()
        )));
    }
    Ok(std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn unlocked() -> (TempDir, VaultStorage) {
        let dir = TempDir::new().unwrap();
        let options = StorageOptions {
            kdf: KdfParams::with_iterations(1_000, 1_500),
            ..StorageOptions::default()
        };
        let mut storage = VaultStorage::with_options(dir.path().join("vault.dat"), options);
        storage.create_new("pw").unwrap();
        (dir, storage)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["mimavault", "list", "--file", "x.dat", "--config-dir", "cfg"]);
        assert_eq!(cli.file.as_deref(), Some(Path::new("x.dat")));
        assert_eq!(cli.config_dir.as_deref(), Some(Path::new("cfg")));
    }

    #[test]
    fn resolve_account_by_id_or_unique_name() {
        let (_dir, mut storage) = unlocked();
        let id = storage
            .add_account(Account::new("GitHub", "alice", "p"))
            .unwrap();

        assert_eq!(resolve_account(&storage, &id).unwrap().name, "GitHub");
        assert_eq!(resolve_account(&storage, "GitHub").unwrap().id, id);
        assert!(matches!(
            resolve_account(&storage, "Nope"),
            Err(VaultError::AccountNotFound(_))
        ));
    }

    #[test]
    fn resolve_account_rejects_ambiguous_name() {
        let (_dir, mut storage) = unlocked();
        storage
            .add_account(Account::new("Mail", "alice", "p"))
            .unwrap();
        storage.add_account(Account::new("Mail", "bob", "p")).unwrap();

        assert!(matches!(
            resolve_account(&storage, "Mail"),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn resolve_group_by_name_or_id() {
        let (_dir, mut storage) = unlocked();
        let work = storage.add_group("Work").unwrap();

        assert_eq!(resolve_group(&storage, "Work").unwrap().id, work.id);
        assert_eq!(resolve_group(&storage, &work.id).unwrap().name, "Work");
        assert!(resolve_group(&storage, "Home").is_err());
    }
}
