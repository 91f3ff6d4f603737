//! Read-only catalog commands: listings and price quotes.

use crate::cli::context::ShellContext;
use crate::cli::errors::{CommandError, CommandResult};
use crate::cli::output::section;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::core::filter::{BookingFilter, BookingSort, PropertyFilter, PropertySort};
use crate::core::repository::{BookingRepository, PropertyRepository};
use crate::domain::{BillingUnit, BookingStatus, PropertyKind};
use crate::forms::fields::{parse_amount, parse_count, parse_datetime};
use crate::pricing::{compute_pricing, PricingInput};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "list",
            "List properties or bookings",
            "list properties [search] [--kind k] [--city c] [--guests n] [--max-rate x] [--sort s] | list bookings [status] [--property p] [--guest g] [--sort s]",
            cmd_list,
        )
        .with_aliases(&["ls"]),
        CommandEntry::new(
            "quote",
            "Price a stay without booking it",
            "quote <property> <check-in> <check-out> [night|week|month]",
            cmd_quote,
        ),
    ]
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((target, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: list <properties|bookings> [options]".into(),
        ));
    };
    match target.to_ascii_lowercase().as_str() {
        "properties" | "property" => list_properties(context, rest),
        "bookings" | "booking" => list_bookings(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "cannot list `{}`. Available: properties, bookings",
            other
        ))),
    }
}

fn list_properties(context: &ShellContext, args: &[&str]) -> CommandResult {
    let options = Options::parse(args)?;
    let mut filter = PropertyFilter::default().search(options.positional.join(" "));
    let mut sort = PropertySort::default();
    for (flag, value) in &options.flags {
        match flag.as_str() {
            "kind" => filter = filter.kind(value.parse::<PropertyKind>().map_err(invalid)?),
            "city" => filter = filter.city(value.clone()),
            "guests" => filter = filter.min_guests(parse_count(value).ok_or_else(|| not_a_number(value))?),
            "max-rate" => {
                filter = filter.max_nightly_rate(parse_amount(value).ok_or_else(|| not_a_number(value))?)
            }
            "sort" => sort = value.parse().map_err(invalid)?,
            other => return Err(unknown_flag(other)),
        }
    }

    let properties = context.catalog.properties()?;
    let listed = filter.apply(&properties, sort);
    section(format!("Properties ({} of {})", listed.len(), properties.len()));
    render::property_table(&listed, &context.config.currency);
    Ok(())
}

fn list_bookings(context: &ShellContext, args: &[&str]) -> CommandResult {
    let options = Options::parse(args)?;
    let mut filter = BookingFilter::default();
    let mut sort = BookingSort::default();
    if let Some(status) = options.positional.first() {
        filter = filter.status(status.parse::<BookingStatus>().map_err(invalid)?);
    }
    for (flag, value) in &options.flags {
        match flag.as_str() {
            "property" => filter = filter.property(context.catalog.find_property(value)?.id),
            "guest" => filter = filter.guest(value.clone()),
            "sort" => sort = value.parse().map_err(invalid)?,
            other => return Err(unknown_flag(other)),
        }
    }

    let bookings = context.catalog.bookings()?;
    let properties = context.catalog.properties()?;
    let listed = filter.apply(&bookings, sort);
    section(format!("Bookings ({} of {})", listed.len(), bookings.len()));
    render::booking_table(&listed, &properties, &context.config.currency);
    Ok(())
}

fn cmd_quote(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (property, check_in, check_out, unit) = match args {
        [property, check_in, check_out] => (property, check_in, check_out, None),
        [property, check_in, check_out, unit] => (property, check_in, check_out, Some(unit)),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: quote <property> <check-in> <check-out> [night|week|month]".into(),
            ))
        }
    };
    let property = context.catalog.find_property(property)?;
    let check_in = parse_datetime(check_in).ok_or_else(|| not_a_date(check_in))?;
    let check_out = parse_datetime(check_out).ok_or_else(|| not_a_date(check_out))?;
    let unit = match unit {
        Some(unit) => unit.parse::<BillingUnit>().map_err(invalid)?,
        None => context.config.default_billing_unit,
    };

    let input = PricingInput::for_property(&property, check_in, check_out, unit);
    let pricing = compute_pricing(&input).map_err(|err| CommandError::Message(err.to_string()))?;
    render::quote(&property, &pricing, &context.config.currency);
    Ok(())
}

/// Positional words plus `--flag value` pairs.
#[derive(Debug, Default, PartialEq)]
struct Options {
    positional: Vec<String>,
    flags: Vec<(String, String)>,
}

impl Options {
    fn parse(args: &[&str]) -> Result<Self, CommandError> {
        let mut options = Options::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.strip_prefix("--") {
                Some(flag) => {
                    let value = iter.next().ok_or_else(|| {
                        CommandError::InvalidArguments(format!("`--{}` needs a value", flag))
                    })?;
                    options.flags.push((flag.to_ascii_lowercase(), value.to_string()));
                }
                None => options.positional.push(arg.to_string()),
            }
        }
        Ok(options)
    }
}

fn invalid(message: String) -> CommandError {
    CommandError::InvalidArguments(message)
}

fn not_a_number(value: &str) -> CommandError {
    CommandError::InvalidArguments(format!("`{}` is not a valid number", value))
}

fn not_a_date(value: &str) -> CommandError {
    CommandError::InvalidArguments(format!(
        "`{}` is not a date; use YYYY-MM-DD or YYYY-MM-DDTHH:MM",
        value
    ))
}

fn unknown_flag(flag: &str) -> CommandError {
    CommandError::InvalidArguments(format!("unknown option `--{}`", flag))
}
