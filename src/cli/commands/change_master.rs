//! `mimavault change-master`: replace the master password.
//!
//! The current password unlocks the vault, then the whole payload is
//! re-encrypted under a key pair derived from the new one and written
//! atomically.  The in-memory session switches only after the write.

use crate::cli::output;
use crate::cli::{prompt_new_password, prompt_password, Cli, Context, NEW_PASSWORD_ENV};
use crate::errors::{Result, VaultError};

/// Execute the `change-master` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::from_cli(cli)?;
    if !ctx.vault_path.exists() {
        return Err(VaultError::VaultNotFound(ctx.vault_path.clone()));
    }

    output::info("Enter your current master password.");
    let old_password = prompt_password()?;
    let mut storage = ctx.unlock(&old_password)?;

    output::info("Choose your new master password.");
    let new_password = prompt_new_password(&ctx.settings, NEW_PASSWORD_ENV)?;

    storage.change_master(&old_password, &new_password)?;

    ctx.audit("change-master", None, None);
    output::success("Master password changed.");

    Ok(())
}
