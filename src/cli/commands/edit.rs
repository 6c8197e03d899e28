//! `mimavault edit`: change fields of an existing account.

use crate::cli::output;
use crate::cli::{prompt_account_password, resolve_account, resolve_group, Cli, Context};
use crate::errors::Result;

/// Replacement values for `edit`; `None` leaves a field as it is.
pub struct EditArgs<'a> {
    pub account: &'a str,
    pub name: Option<&'a str>,
    pub username: Option<&'a str>,
    pub url: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub group: Option<&'a str>,
    pub password: bool,
}

impl EditArgs<'_> {
    fn changes_nothing(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.url.is_none()
            && self.notes.is_none()
            && self.group.is_none()
            && !self.password
    }
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, args: EditArgs<'_>) -> Result<()> {
    if args.changes_nothing() {
        output::info("Nothing to change.");
        output::tip("Pass --name, --username, --url, --notes, --group or --password.");
        return Ok(());
    }

    let ctx = Context::from_cli(cli)?;
    let mut storage = ctx.open_vault()?;

    let mut account = resolve_account(&storage, args.account)?.clone();
    if let Some(name) = args.name {
        account.name = name.to_string();
    }
    if let Some(username) = args.username {
        account.username = username.to_string();
    }
    if let Some(url) = args.url {
        account.url = url.to_string();
    }
    if let Some(notes) = args.notes {
        account.notes = notes.to_string();
    }
    if let Some(group) = args.group {
        account.group_id = Some(resolve_group(&storage, group)?.id.clone());
    }
    if args.password {
        let password = prompt_account_password()?;
        account.password = password.as_str().to_owned();
    }

    let name = account.name.clone();
    storage.update_account(account)?;
    storage.save()?;

    ctx.audit("edit", Some(&name), None);
    output::success(&format!("Updated '{name}'"));

    Ok(())
}
