//! `mimavault export`: write the vault as plain JSON or as an encrypted
//! backup that `import` understands.

use std::path::Path;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{Result, VaultError};
use crate::vault::format::write_atomic;

/// Execute the `export` command.
pub fn execute(cli: &Cli, encrypted: bool, output_path: Option<&Path>) -> Result<()> {
    if encrypted && output_path.is_none() {
        return Err(VaultError::InvalidInput(
            "encrypted exports are binary; pass --output <FILE>".into(),
        ));
    }

    let ctx = Context::from_cli(cli)?;
    let storage = ctx.open_vault()?;
    let count = storage.accounts().len();

    let (bytes, kind) = if encrypted {
        (storage.export_encrypted()?, "encrypted")
    } else {
        (storage.export_plain()?.into_bytes(), "plain")
    };

    match output_path {
        Some(path) => {
            write_atomic(path, &bytes)?;
            ctx.audit("export", None, Some(&format!("{kind}, {count} accounts")));
            output::success(&format!(
                "Exported {count} accounts ({kind}) to {}",
                path.display()
            ));
            if !encrypted {
                output::warning("Plain exports contain every password in clear text.");
            }
        }
        None => {
            // Plain JSON to stdout, nothing else, so it can be piped.
            println!("{}", String::from_utf8_lossy(&bytes));
            ctx.audit("export", None, Some(&format!("{kind} to stdout, {count} accounts")));
        }
    }

    Ok(())
}
