use crate::cli::context::ShellContext;
use crate::cli::errors::{CommandError, CommandResult};
use crate::cli::output::{self, section, OutputPreferences};
use crate::cli::registry::CommandEntry;
use crate::config::Config;
use crate::domain::BillingUnit;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and change preferences",
        "config [show|set <currency|locale|debounce|unit|color> <value>|reset]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        show(context);
        return Ok(());
    }

    match args[0].to_ascii_lowercase().as_str() {
        "set" => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(
                    "usage: config set <currency|locale|debounce|unit|color> <value>".into(),
                ));
            }
            let mut updated = context.config.clone();
            apply(&mut updated, args[1], &args[2..].join(" "))?;
            store(context, updated)?;
            output::success(format!("Updated {}.", args[1]));
            Ok(())
        }
        "reset" => {
            store(context, Config::default())?;
            output::success("Preferences reset to defaults.");
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{}`. Available: show, set, reset",
            other
        ))),
    }
}

fn apply(config: &mut Config, key: &str, value: &str) -> CommandResult {
    let value = value.trim();
    match key.to_ascii_lowercase().as_str() {
        "currency" => config.currency = value.to_ascii_uppercase(),
        "locale" => config.locale = value.to_string(),
        "debounce" | "draft_debounce_ms" => {
            config.draft_debounce_ms = value.parse().map_err(|_| {
                CommandError::InvalidArguments(format!("`{}` is not a number of milliseconds", value))
            })?
        }
        "unit" | "default_billing_unit" => {
            config.default_billing_unit = value
                .parse::<BillingUnit>()
                .map_err(CommandError::InvalidArguments)?
        }
        "color" | "ui_color_enabled" => {
            config.ui_color_enabled = match value.to_ascii_lowercase().as_str() {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                _ => {
                    return Err(CommandError::InvalidArguments(
                        "color expects on or off".into(),
                    ))
                }
            }
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown setting `{}`",
                other
            )))
        }
    }
    Ok(())
}

fn store(context: &mut ShellContext, config: Config) -> CommandResult {
    context
        .config_manager
        .save(&config)
        .map_err(|err| CommandError::Message(err.to_string()))?;
    output::set_preferences(OutputPreferences {
        color: config.ui_color_enabled && context.mode == crate::cli::context::CliMode::Interactive,
        quiet: false,
    });
    context.config = config;
    Ok(())
}

fn show(context: &ShellContext) {
    let config = &context.config;
    section("Preferences");
    output::info(format!("  Locale        : {}", config.locale));
    output::info(format!("  Currency      : {}", config.currency));
    output::info(format!("  Draft debounce: {} ms", config.draft_debounce_ms));
    output::info(format!("  Billing unit  : {}", config.default_billing_unit.label()));
    output::info(format!(
        "  Color         : {}",
        if config.ui_color_enabled { "on" } else { "off" }
    ));
    output::info(format!("  Data dir      : {}", context.data_dir.display()));
    output::info(format!("  Config file   : {}", context.config_manager.path().display()));
}
