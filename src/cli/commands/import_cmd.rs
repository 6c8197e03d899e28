//! `mimavault import`: merge or replace vault contents from an export.
//!
//! The file format is detected from its first bytes.  Encrypted exports
//! are decrypted with the master password unless `--ask-password` is
//! given.

use std::path::Path;

use dialoguer::Password;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{confirm, read_input_file, Cli, Context};
use crate::errors::{Result, VaultError};
use crate::vault::ImportFormat;

/// Execute the `import` command.
pub fn execute(
    cli: &Cli,
    file: &Path,
    replace: bool,
    ask_password: bool,
    force: bool,
) -> Result<()> {
    let ctx = Context::from_cli(cli)?;
    let bytes = read_input_file(file)?;
    let format = ImportFormat::detect(&bytes);

    let mut storage = ctx.open_vault()?;

    if replace
        && !force
        && !confirm(&format!(
            "Replace all {} accounts with the contents of {}?",
            storage.accounts().len(),
            file.display()
        ))?
    {
        output::info("Cancelled.");
        return Ok(());
    }

    let export_password = if ask_password && format == ImportFormat::Encrypted {
        Some(prompt_export_password()?)
    } else {
        None
    };

    let export_password = export_password.as_ref().map(|pw| pw.as_str());
    let report = storage.import_auto(&bytes, export_password, !replace)?;
    storage.save()?;

    let mode = if replace { "replace" } else { "merge" };
    let details = format!(
        "{mode}: {} groups added, {} accounts added, {} updated",
        report.groups_added, report.accounts_added, report.accounts_updated
    );
    ctx.audit("import", Some(&file.display().to_string()), Some(&details));

    output::success(&format!("Imported {}", file.display()));
    output::info(&format!(
        "{} groups added, {} accounts added, {} accounts updated.",
        report.groups_added, report.accounts_added, report.accounts_updated
    ));

    Ok(())
}

fn prompt_export_password() -> Result<Zeroizing<String>> {
    let pw = Password::new()
        .with_prompt("Password of the exported file")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}
