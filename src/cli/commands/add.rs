//! `mimavault add`: store a new account.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{prompt_account_password, resolve_group, Cli, Context};
use crate::crypto::{generate_password, strength_score, Strength};
use crate::errors::Result;
use crate::vault::Account;

/// Arguments of `add`, bundled to keep `execute` readable.
pub struct AddArgs<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub url: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub group: Option<&'a str>,
    pub generate: bool,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: AddArgs<'_>) -> Result<()> {
    let ctx = Context::from_cli(cli)?;
    let mut storage = ctx.open_vault()?;

    let group_id = match args.group {
        Some(g) => Some(resolve_group(&storage, g)?.id.clone()),
        None => None,
    };

    let password = if args.generate {
        Zeroizing::new(generate_password(&ctx.settings.generator.options())?)
    } else {
        prompt_account_password()?
    };

    let mut account = Account::new(args.name, args.username, password.as_str())
        .with_url(args.url.unwrap_or_default())
        .with_notes(args.notes.unwrap_or_default());
    if let Some(id) = group_id {
        account = account.with_group(id);
    }

    let id = storage.add_account(account)?;
    storage.save()?;

    ctx.audit("add", Some(args.name), None);
    output::success(&format!("Added '{}' ({})", args.name, output::short_id(&id)));

    if args.generate {
        output::info(&format!(
            "Generated a {} password.",
            output::strength_label(&password)
        ));
        output::tip("Run `mimavault show <NAME> --copy` to copy it.");
    } else if Strength::from_score(strength_score(&password)) == Strength::Weak {
        output::warning("This password is weak.");
    }

    Ok(())
}
