//! Text rendering for wizard snapshots, quotes, and listings.

use rust_decimal::Decimal;

use crate::domain::{Booking, Property};
use crate::forms::{StepTransition, SubmitOutcome, WizardView};
use crate::pricing::PricingResult;

use super::output::{self, section};

pub fn money(amount: Decimal, currency: &str) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    format!("{} {}", rounded, currency)
}

pub fn wizard_status(view: &WizardView, currency: &str) {
    section(format!(
        "{} form · step {}/{}: {}",
        view.form,
        view.step_index + 1,
        view.step_count,
        view.step_title
    ));
    if !view.step_description.is_empty() {
        output::info(format!("  {}", view.step_description));
    }
    for field in &view.fields {
        let marker = if field.required { "*" } else { " " };
        let value = field.value.as_deref().unwrap_or("-");
        output::info(format!("  {}{:<14} {:<24} ({})", marker, field.label, value, field.key));
        if let Some(error) = &field.error {
            output::error(format!("    {}", error));
        } else if let Some(help) = field.help {
            output::hint(format!("    {}", help));
        }
    }
    if let Some(error) = &view.root_error {
        output::error(error);
    }
    if let Some(pricing) = &view.pricing {
        output::info(format!("  Estimate: {}", quote_line(pricing, currency)));
    }

    let mut actions = Vec::new();
    if view.can_go_previous {
        actions.push("back");
    }
    if view.can_go_next {
        actions.push("next");
    }
    if view.can_submit {
        actions.push("submit");
    }
    let state = if view.is_dirty { "unsaved changes" } else { "no changes" };
    output::hint(format!(
        "phase: {} · {} · actions: {}",
        view.phase,
        state,
        if actions.is_empty() { "none".to_string() } else { actions.join(", ") }
    ));
}

pub fn quote_line(pricing: &PricingResult, currency: &str) -> String {
    let unit = pricing.unit.label();
    let plural = if pricing.duration == 1 { "" } else { "s" };
    format!(
        "{} {}{} = {}",
        pricing.duration,
        unit,
        plural,
        money(pricing.total_price, currency)
    )
}

pub fn quote(property: &Property, pricing: &PricingResult, currency: &str) {
    section(format!("Quote: {}", property.name));
    output::info(format!("  Days         : {}", pricing.raw_days));
    output::info(format!(
        "  Duration     : {} {}(s)",
        pricing.duration,
        pricing.unit.label()
    ));
    output::info(format!("  Base amount  : {}", money(pricing.base_amount, currency)));
    output::info(format!("  Fees         : {}", money(pricing.fees_total, currency)));
    output::info(format!("  Total        : {}", money(pricing.total_price, currency)));
}

pub fn transition(transition: &StepTransition, view: &WizardView) {
    match transition {
        StepTransition::Advanced { to, .. } | StepTransition::Retreated { to, .. } => {
            output::success(format!("Step {}/{}: {}", to + 1, view.step_count, view.step_title));
        }
        StepTransition::Blocked { errors, .. } => {
            output::warning(format!(
                "Fix {} field{} before continuing:",
                errors,
                if *errors == 1 { "" } else { "s" }
            ));
            for field in view.fields.iter().filter(|field| field.error.is_some()) {
                if let Some(error) = &field.error {
                    output::error(format!("  {}: {}", field.key, error));
                }
            }
        }
        StepTransition::AtBoundary => {
            if view.can_submit {
                output::hint("This is the last step. Use `submit` to save.");
            } else {
                output::hint("Already at the first step.");
            }
        }
        StepTransition::Ignored => output::warning(format!("The form is {}.", view.phase)),
    }
}

pub fn submit_outcome(outcome: &SubmitOutcome, view: &WizardView) {
    match outcome {
        SubmitOutcome::Submitted { id, message } => match id {
            Some(id) => output::success(format!("{} ({})", message, id)),
            None => output::success(message),
        },
        SubmitOutcome::Rejected { message } => {
            output::error(message);
            output::hint("Adjust the form and `submit` again, or `cancel`.");
        }
        SubmitOutcome::NotOnLastStep => {
            output::warning("Finish every step first; `submit` is available on the last step.")
        }
        SubmitOutcome::Blocked { errors, .. } => {
            transition(
                &StepTransition::Blocked {
                    step: view.step_index,
                    errors: *errors,
                },
                view,
            );
        }
        SubmitOutcome::Ignored => output::warning("A submission is already in progress."),
    }
}

pub fn property_table(properties: &[&Property], currency: &str) {
    if properties.is_empty() {
        output::info("No properties found.");
        return;
    }
    output::info(format!(
        "  {:<8} {:<28} {:<10} {:<14} {:>6} {:>14}",
        "ID", "Name", "Kind", "City", "Guests", "Nightly"
    ));
    for property in properties {
        let nightly = property
            .nightly_rate()
            .map(|rate| money(rate, currency))
            .unwrap_or_else(|| "-".to_string());
        output::info(format!(
            "  {:<8} {:<28} {:<10} {:<14} {:>6} {:>14}",
            short_id(&property.id.to_string()),
            property.name,
            property.kind.to_string(),
            property.address.city,
            property.max_guests,
            nightly
        ));
    }
}

pub fn booking_table(bookings: &[&Booking], properties: &[Property], currency: &str) {
    if bookings.is_empty() {
        output::info("No bookings found.");
        return;
    }
    output::info(format!(
        "  {:<8} {:<20} {:<20} {:<10} {:<10} {:<11} {:>14}",
        "ID", "Property", "Guest", "Check-in", "Check-out", "Status", "Total"
    ));
    for booking in bookings {
        let property = properties
            .iter()
            .find(|property| property.id == booking.property_id)
            .map(|property| property.name.as_str())
            .unwrap_or("(removed)");
        output::info(format!(
            "  {:<8} {:<20} {:<20} {:<10} {:<10} {:<11} {:>14}",
            short_id(&booking.id.to_string()),
            property,
            booking.guest.name,
            booking.check_in.format("%Y-%m-%d").to_string(),
            booking.check_out.format("%Y-%m-%d").to_string(),
            booking.status.to_string(),
            money(booking.total_price, currency)
        ));
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BillingUnit;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn money_uses_two_decimals() {
        assert_eq!(money(dec("1250"), "EUR"), "1250.00 EUR");
        assert_eq!(money(dec("19.999"), "GBP"), "20.00 GBP");
    }

    #[test]
    fn quote_line_pluralises_units() {
        let pricing = PricingResult {
            duration: 2,
            total_price: dec("700"),
            unit: BillingUnit::Week,
            raw_days: 10,
            base_amount: dec("700"),
            fees_total: Decimal::ZERO,
        };
        assert_eq!(quote_line(&pricing, "EUR"), "2 weeks = 700.00 EUR");
    }

    #[test]
    fn short_ids_keep_eight_characters() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
