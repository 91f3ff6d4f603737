use crate::cli::context::ShellContext;
use crate::cli::errors::{CommandError, CommandResult};
use crate::cli::help;
use crate::cli::output::{self, section};
use crate::cli::registry::CommandEntry;
use crate::core::catalog::CURRENT_SCHEMA_VERSION;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit).with_aliases(&["quit"]),
    ]
}

fn cmd_version(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    section(format!("Property Core {}", meta.version));
    output::info(format!("  Catalog schema: v{}", CURRENT_SCHEMA_VERSION));
    output::info(format!("  Data dir      : {}", context.data_dir.display()));
    output::info(format!("  Build hash    : {}", meta.git_hash));
    output::info(format!("  Built at      : {}", meta.timestamp));
    output::info(format!("  Target        : {}", meta.target));
    output::info(format!("  Profile       : {}", meta.profile));
    output::info(format!("  Rustc         : {}", meta.rustc));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.command(&name.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
