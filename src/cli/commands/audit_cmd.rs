//! `mimavault audit`: display the audit log.
//!
//! Usage:
//!   mimavault audit               # show last 50 entries
//!   mimavault audit --last 20     # show last 20
//!   mimavault audit --since 7d    # entries from last 7 days

use chrono::{DateTime, Duration, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::audit::{audit_dir, AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{Result, VaultError};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let ctx = Context::from_cli(cli)?;
    let since = since.map(parse_since).transpose()?;

    let audit = AuditLog::open(&audit_dir(&ctx.vault_path))
        .ok_or_else(|| VaultError::AuditError("failed to open audit database".into()))?;
    let entries = audit.query(last, since)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);
    Ok(())
}

/// Turn "7d", "24h" or "30m" into the instant that long ago.
fn parse_since(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = || {
        VaultError::InvalidInput(format!(
            "invalid duration '{input}'; use a form like 7d, 24h or 30m"
        ))
    };

    let mut chars = input.chars();
    let unit = chars.next_back().ok_or_else(invalid)?;
    let number: i64 = chars.as_str().parse().map_err(|_| invalid())?;

    let duration = match unit {
        'd' => Duration::try_days(number),
        'h' => Duration::try_hours(number),
        'm' => Duration::try_minutes(number),
        _ => None,
    }
    .ok_or_else(invalid)?;

    Utc::now().checked_sub_signed(duration).ok_or_else(invalid)
}

/// Print audit entries in a formatted table.
fn print_audit_table(entries: &[AuditEntry]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Target", "Details"]);

    for entry in entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&entry.operation),
            entry.target.clone().unwrap_or_else(|| "-".into()),
            entry.details.clone().unwrap_or_else(|| "-".into()),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

fn colorize_operation(op: &str) -> String {
    match op {
        "init" | "add" | "group-add" => style(op).green().to_string(),
        "edit" | "group-rename" => style(op).blue().to_string(),
        "delete" | "group-delete" => style(op).red().to_string(),
        "change-master" => style(op).yellow().to_string(),
        "export" | "import" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_since_days_hours_minutes() {
        let days = Utc::now() - parse_since("7d").unwrap();
        assert!((days.num_days() - 7).abs() <= 1);

        let hours = Utc::now() - parse_since("24h").unwrap();
        assert!((hours.num_hours() - 24).abs() <= 1);

        let minutes = Utc::now() - parse_since(" 30m ").unwrap();
        assert!((minutes.num_minutes() - 30).abs() <= 1);
    }

    #[test]
    fn parse_since_rejects_garbage() {
        for bad in ["", "abc", "7x", "d", "7", "-", "7\u{e9}"] {
            assert!(parse_since(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parse_since_rejects_overflow() {
        assert!(parse_since("99999999999999d").is_err());
    }

    #[test]
    fn colorize_operation_keeps_text() {
        console::set_colors_enabled(false);
        assert_eq!(colorize_operation("add"), "add");
        assert_eq!(colorize_operation("unknown"), "unknown");
    }
}
