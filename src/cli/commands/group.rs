//! `mimavault group`: list, add, rename and delete groups.

use crate::cli::output;
use crate::cli::{confirm, resolve_group, Cli, Context, GroupAction};
use crate::errors::Result;

/// Execute a `group` subcommand.
pub fn execute(cli: &Cli, action: &GroupAction) -> Result<()> {
    let ctx = Context::from_cli(cli)?;
    let mut storage = ctx.open_vault()?;

    match action {
        GroupAction::List => {
            output::print_groups_table(&storage);
        }
        GroupAction::Add { name } => {
            let group = storage.add_group(name)?;
            storage.save()?;
            ctx.audit("group-add", Some(&group.name), None);
            output::success(&format!("Created group '{}'", group.name));
        }
        GroupAction::Rename { group, new_name } => {
            let existing = resolve_group(&storage, group)?;
            let (id, old_name) = (existing.id.clone(), existing.name.clone());
            storage.rename_group(&id, new_name)?;
            storage.save()?;
            let new_name = new_name.trim();
            ctx.audit("group-rename", Some(new_name), Some(&format!("was '{old_name}'")));
            output::success(&format!("Renamed group '{old_name}' to '{new_name}'"));
        }
        GroupAction::Delete {
            group,
            migrate_to,
            force,
        } => {
            let existing = resolve_group(&storage, group)?;
            let (id, name) = (existing.id.clone(), existing.name.clone());
            let target = match migrate_to {
                Some(t) => Some(resolve_group(&storage, t)?.id.clone()),
                None => None,
            };

            let count = storage.accounts_in_group(&id).len();
            if !force && !confirm(&format!("Delete group '{name}' ({count} accounts will move)?"))? {
                output::info("Cancelled.");
                return Ok(());
            }

            let moved = storage.delete_group(&id, target.as_deref())?;
            storage.save()?;
            ctx.audit("group-delete", Some(&name), Some(&format!("{moved} accounts moved")));
            output::success(&format!("Deleted group '{name}', moved {moved} accounts"));
        }
    }

    Ok(())
}
