use clap::Parser;
use tracing_subscriber::EnvFilter;

use mimavault::cli::commands::{add::AddArgs, edit::EditArgs, generate::ClassFlags};
use mimavault::cli::{commands, output, Cli, Commands};

/// Environment variable holding the log filter (e.g. `debug`, `mimavault=trace`).
const LOG_ENV: &str = "MIMAVAULT_LOG";

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::List {
            ref group,
            ref search,
        } => commands::list::execute(&cli, group.as_deref(), search.as_deref()),
        Commands::Show {
            ref account,
            reveal,
            copy,
        } => commands::show::execute(&cli, account, reveal, copy),
        Commands::Add {
            ref name,
            ref username,
            ref url,
            ref notes,
            ref group,
            generate,
        } => commands::add::execute(
            &cli,
            AddArgs {
                name,
                username,
                url: url.as_deref(),
                notes: notes.as_deref(),
                group: group.as_deref(),
                generate,
            },
        ),
        Commands::Edit {
            ref account,
            ref name,
            ref username,
            ref url,
            ref notes,
            ref group,
            password,
        } => commands::edit::execute(
            &cli,
            EditArgs {
                account,
                name: name.as_deref(),
                username: username.as_deref(),
                url: url.as_deref(),
                notes: notes.as_deref(),
                group: group.as_deref(),
                password,
            },
        ),
        Commands::Delete { ref account, force } => commands::delete::execute(&cli, account, force),
        Commands::Group { ref action } => commands::group::execute(&cli, action),
        Commands::ChangeMaster => commands::change_master::execute(&cli),
        Commands::Export {
            encrypted,
            ref output,
        } => commands::export::execute(&cli, encrypted, output.as_deref()),
        Commands::Import {
            ref file,
            replace,
            ask_password,
            force,
        } => commands::import_cmd::execute(&cli, file, replace, ask_password, force),
        Commands::Generate {
            length,
            no_lower,
            no_upper,
            no_digits,
            no_symbols,
        } => commands::generate::execute(
            &cli,
            length,
            ClassFlags {
                no_lower,
                no_upper,
                no_digits,
                no_symbols,
            },
        ),
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `MIMAVAULT_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .compact()
        .init();
}
