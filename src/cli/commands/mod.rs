//! One module per subcommand, each exposing `execute`.

pub mod add;
#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod change_master;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod export;
pub mod generate;
pub mod group;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod show;
