//! `mimavault delete`: remove an account from the vault.

use crate::cli::output;
use crate::cli::{confirm, resolve_account, Cli, Context};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, query: &str, force: bool) -> Result<()> {
    let ctx = Context::from_cli(cli)?;
    let mut storage = ctx.open_vault()?;

    let account = resolve_account(&storage, query)?;
    let (id, name) = (account.id.clone(), account.name.clone());

    // Unless --force is set, ask before deleting.
    if !force && !confirm(&format!("Delete account '{name}' ({})?", account.username))? {
        output::info("Cancelled.");
        return Ok(());
    }

    storage.delete_account(&id)?;
    storage.save()?;

    ctx.audit("delete", Some(&name), force.then_some("forced"));
    output::success(&format!("Deleted account '{name}'"));

    Ok(())
}
