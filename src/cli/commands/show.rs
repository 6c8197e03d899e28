//! `mimavault show`: print one account, optionally copying its password.

use crate::cli::output;
use crate::cli::{resolve_account, Cli, Context};
use crate::errors::{Result, VaultError};

/// Execute the `show` command.
pub fn execute(cli: &Cli, query: &str, reveal: bool, copy: bool) -> Result<()> {
    let ctx = Context::from_cli(cli)?;
    let storage = ctx.open_vault()?;
    let account = resolve_account(&storage, query)?;

    output::print_account(&storage, account, reveal);

    if copy {
        copy_to_clipboard(&account.password)?;
        output::success(&format!("Copied password for '{}' to the clipboard", account.name));
    }

    Ok(())
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| VaultError::CommandFailed(format!("clipboard unavailable: {e}")))?;
    clipboard
        .set_text(text.to_owned())
        .map_err(|e| VaultError::CommandFailed(format!("clipboard write: {e}")))
}
