//! `mimavault generate`: print a random password.
//!
//! The password goes to stdout on its own line; the strength rating
//! goes to stderr so `$(mimavault generate)` captures only the password.

use console::style;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::crypto::generate_password;
use crate::errors::Result;

/// Character-class switches from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassFlags {
    pub no_lower: bool,
    pub no_upper: bool,
    pub no_digits: bool,
    pub no_symbols: bool,
}

/// Execute the `generate` command.
pub fn execute(cli: &Cli, length: Option<usize>, flags: ClassFlags) -> Result<()> {
    let ctx = Context::from_cli(cli)?;

    let mut options = ctx.settings.generator.options();
    if let Some(length) = length {
        options.length = length;
    }
    options.lowercase &= !flags.no_lower;
    options.uppercase &= !flags.no_upper;
    options.digits &= !flags.no_digits;
    options.symbols &= !flags.no_symbols;

    let password = generate_password(&options)?;
    println!("{password}");
    eprintln!(
        "{} strength: {}",
        style("\u{2192}").dim(),
        output::strength_label(&password)
    );

    Ok(())
}
