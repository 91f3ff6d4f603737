//! Command shell driving the property and booking wizards.

pub mod commands;
pub mod context;
pub mod errors;
mod help;
pub mod output;
pub mod registry;
pub mod render;
pub mod session;
mod shell;

pub use context::{CliMode, ShellContext};
pub use errors::{CliError, CommandError};
pub use shell::{run_cli, SCRIPT_ENV};
