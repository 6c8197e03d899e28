//! `mimavault init`: create a new, empty vault file.

use std::fs;

use crate::cli::output;
use crate::cli::{prompt_new_password, Cli, Context, PASSWORD_ENV};
use crate::errors::{Result, VaultError};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::from_cli(cli)?;
    let path = &ctx.vault_path;

    if path.exists() {
        output::tip("Use `mimavault add` to add accounts to the existing vault.");
        return Err(VaultError::VaultAlreadyExists(path.clone()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            output::info(&format!("Created directory: {}", parent.display()));
        }
    }

    let password = prompt_new_password(&ctx.settings, PASSWORD_ENV)?;

    let mut storage = ctx.storage();
    storage.create_new(&password)?;
    storage.save()?;

    ctx.audit("init", None, Some("vault created"));
    output::success(&format!("Vault created at {}", path.display()));
    output::tip("Run `mimavault add <NAME> -u <USER>` to add an account.");
    output::tip("Run `mimavault list` to see all accounts.");

    Ok(())
}
