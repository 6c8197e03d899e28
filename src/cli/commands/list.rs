//! `mimavault list`: show accounts, optionally by group or search query.

use crate::cli::output;
use crate::cli::{resolve_group, Cli, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, group: Option<&str>, search: Option<&str>) -> Result<()> {
    let ctx = Context::from_cli(cli)?;
    let storage = ctx.open_vault()?;

    let group_id = match group {
        Some(g) => Some(resolve_group(&storage, g)?.id.as_str()),
        None => None,
    };

    let accounts = storage.search(search.unwrap_or(""), group_id);
    output::print_accounts_table(&storage, &accounts);

    if !accounts.is_empty() {
        let total = storage.accounts().len();
        output::info(&format!("{} of {total} accounts shown.", accounts.len()));
    }

    Ok(())
}
