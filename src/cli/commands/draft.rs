use crate::cli::context::ShellContext;
use crate::cli::errors::{CommandError, CommandResult};
use crate::cli::output::{self, section};
use crate::cli::registry::CommandEntry;
use crate::forms::SubmitMode;

use super::wizard::{booking_draft_key, property_draft_key};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "draft",
        "Inspect or discard a saved form draft",
        "draft <show|clear> [property | booking <property>]",
        cmd_draft,
    )]
}

fn cmd_draft(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, target)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: draft <show|clear> [property | booking <property>]".into(),
        ));
    };
    match action.to_ascii_lowercase().as_str() {
        "show" => show(context, target),
        "clear" => clear(context, target),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown draft action `{}`. Available: show, clear",
            other
        ))),
    }
}

/// Form name and storage key addressed by `target`, defaulting to the open form.
fn resolve(context: &ShellContext, target: &[&str]) -> Result<(&'static str, String), CommandError> {
    match target.split_first() {
        None => {
            let wizard = context.wizard_ref()?;
            let key = wizard
                .draft_key()
                .ok_or_else(|| CommandError::Message("The open form keeps no draft.".into()))?;
            Ok((wizard.form_name(), key))
        }
        Some((form, rest)) => match form.to_ascii_lowercase().as_str() {
            "property" => Ok(("property", property_draft_key(&SubmitMode::Create))),
            "booking" => {
                let query = rest.join(" ");
                if query.trim().is_empty() {
                    return Err(CommandError::InvalidArguments(
                        "usage: draft <show|clear> booking <property>".into(),
                    ));
                }
                let property = context.catalog.find_property(&query)?;
                Ok(("booking", booking_draft_key(property.id, &SubmitMode::Create)))
            }
            other => Err(CommandError::InvalidArguments(format!(
                "unknown form `{}`. Available: property, booking",
                other
            ))),
        },
    }
}

fn show(context: &mut ShellContext, target: &[&str]) -> CommandResult {
    if target.is_empty() {
        if let Some(wizard) = context.wizard.as_mut() {
            wizard.flush_draft();
        }
    }
    let (form, key) = resolve(context, target)?;
    let draft = context.draft_persistence(form, key.clone()).load_draft();
    match draft {
        Some(draft) => {
            section(format!("Draft {}", key));
            output::info(format!("  Step  : {}", draft.step_index + 1));
            for (field, value) in &draft.values {
                output::info(format!("  {:<14} {}", field, value));
            }
        }
        None => output::info(format!("No {} draft saved.", form)),
    }
    Ok(())
}

fn clear(context: &mut ShellContext, target: &[&str]) -> CommandResult {
    if target.is_empty() {
        context.wizard_mut()?.clear_draft();
        output::success("Draft cleared; the open form is unchanged.");
        return Ok(());
    }
    let (form, key) = resolve(context, target)?;
    if let Some(wizard) = context.wizard.as_mut() {
        if wizard.draft_key().as_deref() == Some(key.as_str()) {
            wizard.clear_draft();
        }
    }
    context.draft_persistence(form, key).clear_draft();
    output::success(format!("Cleared the {} draft.", form));
    Ok(())
}
