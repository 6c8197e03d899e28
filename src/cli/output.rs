//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so every command
//! looks the same.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::crypto::{strength_score, Strength};
use crate::vault::{Account, VaultStorage};

/// Shown in place of a password that was not revealed.
const MASK: &str = "********";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// First eight characters of an id, enough to tell accounts apart.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Name of the group an account lives in, or "-".
fn group_name<'a>(storage: &'a VaultStorage, account: &Account) -> &'a str {
    account
        .group()
        .and_then(|id| storage.group(id))
        .map_or("-", |g| g.name.as_str())
}

/// Strength label colored by bucket.
pub fn strength_label(password: &str) -> String {
    let score = strength_score(password);
    let strength = Strength::from_score(score);
    let text = format!("{} ({score}/100)", strength.label());
    match strength {
        Strength::Weak => style(text).red().to_string(),
        Strength::Fair => style(text).yellow().to_string(),
        Strength::Strong | Strength::VeryStrong => style(text).green().to_string(),
    }
}

/// Print a table of accounts (ID, Name, Username, URL, Group).
pub fn print_accounts_table(storage: &VaultStorage, accounts: &[&Account]) {
    if accounts.is_empty() {
        info("No matching accounts.");
        if storage.accounts().is_empty() {
            tip("Run `mimavault add <NAME> -u <USER>` to add your first account.");
        }
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Username", "URL", "Group"]);

    for a in accounts {
        table.add_row(vec![
            short_id(&a.id).to_string(),
            a.name.clone(),
            a.username.clone(),
            a.url.clone(),
            group_name(storage, a).to_string(),
        ]);
    }

    println!("{table}");
}

/// Print a table of groups with their account counts.
pub fn print_groups_table(storage: &VaultStorage) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Accounts", "Default", "ID"]);

    for g in storage.groups() {
        table.add_row(vec![
            g.name.clone(),
            storage.accounts_in_group(&g.id).len().to_string(),
            if g.is_default { "yes" } else { "" }.to_string(),
            short_id(&g.id).to_string(),
        ]);
    }

    println!("{table}");
}

/// Print every field of one account.  The password is masked unless
/// `reveal` is set.
pub fn print_account(storage: &VaultStorage, account: &Account, reveal: bool) {
    let password = if reveal {
        account.password.as_str()
    } else {
        MASK
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["ID", account.id.as_str()]);
    table.add_row(vec!["Name", account.name.as_str()]);
    table.add_row(vec!["Username", account.username.as_str()]);
    table.add_row(vec!["Password", password]);
    table.add_row(vec!["URL", account.url.as_str()]);
    table.add_row(vec!["Group", group_name(storage, account)]);
    table.add_row(vec!["Notes", account.notes.as_str()]);

    println!("{table}");
    println!("Strength: {}", strength_label(&account.password));
}
