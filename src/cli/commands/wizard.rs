//! Commands that open a wizard and drive it step by step.

use uuid::Uuid;

use crate::cli::context::ShellContext;
use crate::cli::errors::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::core::repository::{BookingRepository, PropertyRepository};
use crate::domain::{Booking, Property};
use crate::forms::{BookingForm, PropertyForm, SubmitMode, SubmitOutcome};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "property",
            "Create or edit a property with the step-by-step form",
            "property <new|edit <property>>",
            cmd_property,
        ),
        CommandEntry::new(
            "booking",
            "Create or edit a booking for a property",
            "booking <new <property>|edit <booking-id>>",
            cmd_booking,
        ),
        CommandEntry::new(
            "set",
            "Set a field on the open form",
            "set <field> <value...>",
            cmd_set,
        ),
        CommandEntry::new("clear", "Clear a field on the open form", "clear <field>", cmd_clear),
        CommandEntry::new("next", "Validate this step and continue", "next", cmd_next),
        CommandEntry::new(
            "back",
            "Return to the previous step, or to step <n>",
            "back [n]",
            cmd_back,
        )
        .with_aliases(&["previous", "prev"]),
        CommandEntry::new("submit", "Validate and save the open form", "submit", cmd_submit),
        CommandEntry::new("status", "Show the current step and its fields", "status", cmd_status),
        CommandEntry::new("cancel", "Discard the open form and its draft", "cancel", cmd_cancel),
    ]
}

pub(crate) fn property_draft_key(mode: &SubmitMode) -> String {
    mode.draft_key("property")
}

/// New bookings keep one draft per property; edits keep one per booking.
pub(crate) fn booking_draft_key(property_id: Uuid, mode: &SubmitMode) -> String {
    match mode {
        SubmitMode::Create => format!("{}:new:{}", mode.draft_key("booking"), property_id),
        SubmitMode::Update { .. } => mode.draft_key("booking"),
    }
}

fn cmd_property(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: property <new|edit <property>>".into(),
        ));
    };
    context.ensure_no_wizard()?;
    let properties = context.catalog.properties()?;

    match subcommand.to_ascii_lowercase().as_str() {
        "new" => {
            let names = property_names(&properties, None);
            let mode = SubmitMode::Create;
            let key = property_draft_key(&mode);
            context.open_wizard(PropertyForm::create(names), mode, key)?;
        }
        "edit" => {
            let query = rest.join(" ");
            if query.trim().is_empty() {
                return Err(CommandError::InvalidArguments(
                    "usage: property edit <property>".into(),
                ));
            }
            let property = context.catalog.find_property(&query)?;
            let names = property_names(&properties, Some(property.id));
            let mode = SubmitMode::Update {
                id: property.id.to_string(),
            };
            let key = property_draft_key(&mode);
            output::info(format!("Editing `{}`.", property.name));
            context.open_wizard(PropertyForm::edit(property, names), mode, key)?;
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown property subcommand `{}`. Available: new, edit",
                other
            )))
        }
    }
    show_status(context)
}

fn cmd_booking(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: booking <new <property>|edit <booking-id>>".into(),
        ));
    };
    context.ensure_no_wizard()?;
    let target = rest.join(" ");
    if target.trim().is_empty() {
        return Err(CommandError::InvalidArguments(format!(
            "usage: booking {} <{}>",
            subcommand,
            if subcommand.eq_ignore_ascii_case("edit") { "booking-id" } else { "property" }
        )));
    }

    match subcommand.to_ascii_lowercase().as_str() {
        "new" => {
            let property = context.catalog.find_property(&target)?;
            if property.pricing.is_empty() {
                output::warning(format!(
                    "`{}` has no rates yet; set them with `property edit` first.",
                    property.name
                ));
            }
            let mode = SubmitMode::Create;
            let key = booking_draft_key(property.id, &mode);
            output::info(format!("New booking for `{}`.", property.name));
            let form = BookingForm::create(property, context.config.default_billing_unit);
            context.open_wizard(form, mode, key)?;
        }
        "edit" => {
            let booking = find_booking(context, &target)?;
            let property = context
                .catalog
                .property(booking.property_id)?
                .ok_or_else(|| CommandError::Message("The booked property no longer exists.".into()))?;
            let mode = SubmitMode::Update {
                id: booking.id.to_string(),
            };
            let key = booking_draft_key(property.id, &mode);
            context.open_wizard(BookingForm::edit(property, booking), mode, key)?;
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown booking subcommand `{}`. Available: new, edit",
                other
            )))
        }
    }
    show_status(context)
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.len() < 2 {
        return Err(CommandError::InvalidArguments(
            "usage: set <field> <value...>".into(),
        ));
    }
    let value = args[1..].join(" ");
    let wizard = context.wizard_mut()?;
    if wizard.set(args[0], &value)? {
        let view = wizard.view();
        output::success(format!("{} = {}", args[0], value.trim()));
        if let Some(pricing) = &view.pricing {
            output::info(format!(
                "Estimate: {}",
                render::quote_line(pricing, &context.config.currency)
            ));
        }
    } else {
        output::info("No change.");
    }
    Ok(())
}

fn cmd_clear(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [field] = args else {
        return Err(CommandError::InvalidArguments("usage: clear <field>".into()));
    };
    if context.wizard_mut()?.clear(field)? {
        output::success(format!("Cleared {}.", field));
    } else {
        output::info("No change.");
    }
    Ok(())
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let wizard = context.wizard_mut()?;
    let transition = wizard.next();
    render::transition(&transition, &wizard.view());
    Ok(())
}

fn cmd_back(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let wizard = context.wizard_mut()?;
    let transition = match args.first() {
        Some(step) => {
            let number: usize = step.parse().map_err(|_| {
                CommandError::InvalidArguments(format!("`{}` is not a step number", step))
            })?;
            if number == 0 {
                return Err(CommandError::InvalidArguments("steps are numbered from 1".into()));
            }
            wizard.go_to(number - 1)
        }
        None => wizard.previous(),
    };
    render::transition(&transition, &wizard.view());
    Ok(())
}

fn cmd_submit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let wizard = context.wizard.as_mut().ok_or(CommandError::NoActiveForm)?;
    let outcome = wizard.submit(&context.catalog);
    render::submit_outcome(&outcome, &wizard.view());
    if matches!(outcome, SubmitOutcome::Submitted { .. }) {
        context.wizard = None;
    }
    Ok(())
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    show_status(context)
}

fn cmd_cancel(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let mut wizard = context.wizard.take().ok_or(CommandError::NoActiveForm)?;
    let form = wizard.form_name();
    if wizard.cancel() {
        output::success(format!("Discarded the {} form.", form));
    }
    Ok(())
}

fn show_status(context: &ShellContext) -> CommandResult {
    let view = context.wizard_ref()?.view();
    render::wizard_status(&view, &context.config.currency);
    Ok(())
}

fn property_names(properties: &[Property], except: Option<Uuid>) -> Vec<String> {
    properties
        .iter()
        .filter(|property| Some(property.id) != except)
        .map(|property| property.name.clone())
        .collect()
}

/// Resolves a booking by full id or an unambiguous id prefix of four or more characters.
pub(crate) fn find_booking(context: &ShellContext, query: &str) -> Result<Booking, CommandError> {
    let query = query.trim().to_lowercase();
    if query.len() < 4 {
        return Err(CommandError::InvalidArguments(
            "give at least four characters of the booking id".into(),
        ));
    }
    let bookings = context.catalog.bookings()?;
    let mut matches = bookings
        .into_iter()
        .filter(|booking| booking.id.to_string().starts_with(&query));
    match (matches.next(), matches.next()) {
        (Some(booking), None) => Ok(booking),
        (None, _) => Err(CommandError::Message(format!("No booking matches `{}`.", query))),
        (Some(_), Some(_)) => Err(CommandError::Message(format!(
            "`{}` matches several bookings; use more of the id.",
            query
        ))),
    }
}
