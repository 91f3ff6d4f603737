//! Three-step booking wizard bound to one property.
//!
//! The stay step carries the interesting rules: check-out after check-in,
//! a rate for the chosen billing unit, the rate's stay limits, and the
//! property's guest capacity. Pricing is derived from the same values so the
//! quote shown while editing matches what gets stored.

use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;

use super::fields::{FieldDescriptor, FieldKind, Validator};
use super::registry::{FieldId, StepId};
use super::schema::FormSchema;
use super::validation::{CrossFieldRule, FieldErrors, FormValues};
use crate::domain::{BillingUnit, Booking, BookingStatus, Guest, PricingTable, Property};
use crate::pricing::{compute_pricing, stay_days, units_for_days, PricingError, PricingInput};

const STAY_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BookingField {
    GuestName,
    GuestEmail,
    GuestPhone,
    CheckIn,
    CheckOut,
    Unit,
    Guests,
    Status,
    Notes,
}

impl FieldId for BookingField {
    fn all() -> &'static [Self] {
        use BookingField::*;
        &[
            GuestName, GuestEmail, GuestPhone, CheckIn, CheckOut, Unit, Guests, Status, Notes,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            BookingField::GuestName => "guest_name",
            BookingField::GuestEmail => "guest_email",
            BookingField::GuestPhone => "guest_phone",
            BookingField::CheckIn => "check_in",
            BookingField::CheckOut => "check_out",
            BookingField::Unit => "billing_unit",
            BookingField::Guests => "guests",
            BookingField::Status => "status",
            BookingField::Notes => "notes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStep {
    Guest,
    Stay,
    Confirmation,
}

impl StepId for BookingStep {
    type Field = BookingField;

    fn all() -> &'static [Self] {
        &[BookingStep::Guest, BookingStep::Stay, BookingStep::Confirmation]
    }

    fn key(self) -> &'static str {
        match self {
            BookingStep::Guest => "guest",
            BookingStep::Stay => "stay",
            BookingStep::Confirmation => "confirmation",
        }
    }

    fn title(self) -> &'static str {
        match self {
            BookingStep::Guest => "Guest",
            BookingStep::Stay => "Stay",
            BookingStep::Confirmation => "Confirmation",
        }
    }

    fn description(self) -> &'static str {
        match self {
            BookingStep::Guest => "Who is staying.",
            BookingStep::Stay => "Dates, billing unit, and party size.",
            BookingStep::Confirmation => "Review the quote and set the booking status.",
        }
    }

    fn fields(self) -> &'static [BookingField] {
        use BookingField::*;
        match self {
            BookingStep::Guest => &[GuestName, GuestEmail, GuestPhone],
            BookingStep::Stay => &[CheckIn, CheckOut, Unit, Guests],
            BookingStep::Confirmation => &[Status, Notes],
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingForm {
    property: Property,
    existing: Option<Booking>,
    default_unit: BillingUnit,
}

impl BookingForm {
    pub fn create(property: Property, default_unit: BillingUnit) -> Self {
        Self {
            property,
            existing: None,
            default_unit,
        }
    }

    pub fn edit(property: Property, booking: Booking) -> Self {
        let default_unit = booking.billing_unit;
        Self {
            property,
            existing: Some(booking),
            default_unit,
        }
    }

    pub fn property(&self) -> &Property {
        &self.property
    }

    fn status_options(&self) -> Vec<BookingStatus> {
        if self.existing.is_some() {
            BookingStatus::ALL.to_vec()
        } else {
            vec![BookingStatus::Pending, BookingStatus::Confirmed]
        }
    }
}

/// Formats a stay instant the way the booking form accepts it.
pub fn format_stay(instant: NaiveDateTime) -> String {
    instant.format(STAY_FORMAT).to_string()
}

fn stay_unit(values: &FormValues<BookingField>) -> Option<BillingUnit> {
    values
        .get(BookingField::Unit)
        .and_then(|raw| raw.parse::<BillingUnit>().ok())
}

fn stay_range(values: &FormValues<BookingField>) -> Option<(NaiveDateTime, NaiveDateTime)> {
    Some((
        values.datetime(BookingField::CheckIn)?,
        values.datetime(BookingField::CheckOut)?,
    ))
}

fn plural(count: u32, unit: BillingUnit) -> String {
    if count == 1 {
        format!("1 {}", unit.label())
    } else {
        format!("{} {}s", count, unit.label())
    }
}

fn stay_limit_violation(pricing: &PricingTable, values: &FormValues<BookingField>) -> Option<String> {
    let unit = stay_unit(values)?;
    let entry = pricing.rate(unit)?;
    let (check_in, check_out) = stay_range(values)?;
    let duration = units_for_days(stay_days(check_in, check_out).ok()?, unit);
    if entry.accepts(duration) {
        return None;
    }
    match (entry.min_duration, entry.max_duration) {
        (Some(min), _) if duration < min => Some(format!("Minimum stay is {}", plural(min, unit))),
        (_, Some(max)) => Some(format!("Maximum stay is {}", plural(max, unit))),
        _ => None,
    }
}

impl FormSchema for BookingForm {
    type Field = BookingField;
    type Step = BookingStep;
    type Output = Booking;

    fn name(&self) -> &'static str {
        "booking"
    }

    fn describe(&self, field: BookingField) -> FieldDescriptor<BookingField> {
        use BookingField::*;
        match field {
            GuestName => FieldDescriptor::new(GuestName, "Guest name", FieldKind::Text, Validator::MaxLength(120)),
            GuestEmail => FieldDescriptor::new(GuestEmail, "Guest email", FieldKind::Text, Validator::Email),
            GuestPhone => FieldDescriptor::new(
                GuestPhone,
                "Guest phone",
                FieldKind::Text,
                Validator::custom(|value| {
                    let digits = value.chars().filter(char::is_ascii_digit).count();
                    let allowed = value
                        .chars()
                        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
                    if allowed && digits >= 6 {
                        Ok(())
                    } else {
                        Err("Enter a phone number with at least 6 digits".to_string())
                    }
                }),
            )
            .with_optional(),
            CheckIn => FieldDescriptor::new(CheckIn, "Check-in", FieldKind::DateTime, Validator::DateTime)
                .with_help("YYYY-MM-DD or YYYY-MM-DDTHH:MM"),
            CheckOut => FieldDescriptor::new(CheckOut, "Check-out", FieldKind::DateTime, Validator::DateTime)
                .with_help("YYYY-MM-DD or YYYY-MM-DDTHH:MM"),
            Unit => FieldDescriptor::new(
                Unit,
                "Billing unit",
                FieldKind::Choice(BillingUnit::ALL.iter().map(|u| u.label().to_string()).collect()),
                Validator::custom(|value| value.parse::<BillingUnit>().map(|_| ())),
            ),
            Guests => FieldDescriptor::new(Guests, "Guests", FieldKind::Integer, Validator::PositiveInteger),
            Status => {
                let options = self.status_options();
                let labels: Vec<String> = options.iter().map(ToString::to_string).collect();
                let allowed = labels.join(", ");
                FieldDescriptor::new(
                    Status,
                    "Status",
                    FieldKind::Choice(labels),
                    Validator::custom(move |value| match value.parse::<BookingStatus>() {
                        Ok(status) if options.contains(&status) => Ok(()),
                        _ => Err(format!("Value must be one of: {}", allowed)),
                    }),
                )
            }
            Notes => FieldDescriptor::new(Notes, "Notes", FieldKind::Text, Validator::MaxLength(500))
                .with_optional(),
        }
    }

    fn cross_field_rules(&self) -> Vec<CrossFieldRule<BookingField>> {
        use BookingField::*;
        let pricing = self.property.pricing.clone();
        let limits = self.property.pricing.clone();
        let name = self.property.name.clone();
        let capacity = self.property.max_guests;
        let property = self.property.clone();
        vec![
            CrossFieldRule::new("check_out_after_check_in", CheckOut, |values| {
                let (check_in, check_out) = stay_range(values)?;
                (check_out <= check_in).then(|| "Check-out must be after check-in".to_string())
            }),
            CrossFieldRule::new("rate_configured", Unit, move |values| {
                let unit = stay_unit(values)?;
                pricing
                    .rate(unit)
                    .is_none()
                    .then(|| format!("`{}` has no {} rate", name, unit.adjective().to_lowercase()))
            }),
            CrossFieldRule::new("stay_within_limits", Unit, move |values| {
                stay_limit_violation(&limits, values)
            }),
            CrossFieldRule::new("price_in_range", Unit, move |values| {
                let (check_in, check_out) = stay_range(values)?;
                let input = PricingInput::for_property(&property, check_in, check_out, stay_unit(values)?);
                match compute_pricing(&input) {
                    Err(err @ PricingError::AmountTooLarge) => Some(err.to_string()),
                    _ => None,
                }
            }),
            CrossFieldRule::new("guests_within_capacity", Guests, move |values| {
                let guests = values.count(Guests)?;
                (guests > capacity).then(|| format!("This property hosts at most {} guests", capacity))
            }),
        ]
    }

    fn defaults(&self) -> FormValues<BookingField> {
        use BookingField::*;
        match &self.existing {
            Some(booking) => {
                let mut values = FormValues::new()
                    .with(GuestName, booking.guest.name.clone())
                    .with(GuestEmail, booking.guest.email.clone())
                    .with(CheckIn, format_stay(booking.check_in))
                    .with(CheckOut, format_stay(booking.check_out))
                    .with(Unit, booking.billing_unit.label())
                    .with(Guests, booking.guests.to_string())
                    .with(Status, booking.status.to_string());
                if let Some(phone) = &booking.guest.phone {
                    values.set(GuestPhone, phone.clone());
                }
                if let Some(notes) = &booking.notes {
                    values.set(Notes, notes.clone());
                }
                values
            }
            None => FormValues::new()
                .with(Unit, self.default_unit.label())
                .with(Guests, "1")
                .with(Status, BookingStatus::Pending.to_string()),
        }
    }

    fn pricing_input(&self, values: &FormValues<BookingField>) -> Option<PricingInput> {
        let (check_in, check_out) = stay_range(values)?;
        let unit = stay_unit(values)?;
        Some(PricingInput::for_property(&self.property, check_in, check_out, unit))
    }

    fn commit(&self, values: &FormValues<BookingField>) -> Result<Booking, FieldErrors<BookingField>> {
        use BookingField::*;
        let missing = |field: BookingField| FieldErrors::single(field, "Value is required");

        let input = self.pricing_input(values).ok_or_else(|| missing(CheckOut))?;
        let pricing = compute_pricing(&input).map_err(|err| FieldErrors::single(Unit, err.to_string()))?;
        let guests = values.count(Guests).ok_or_else(|| missing(Guests))?;
        let status = values
            .get(Status)
            .and_then(|raw| raw.parse::<BookingStatus>().ok())
            .ok_or_else(|| missing(Status))?;
        let guest = Guest {
            name: values.get(GuestName).ok_or_else(|| missing(GuestName))?.to_string(),
            email: values.get(GuestEmail).ok_or_else(|| missing(GuestEmail))?.to_string(),
            phone: values.get(GuestPhone).map(str::to_string),
        };

        let (id, created_at) = match &self.existing {
            Some(existing) => (existing.id, existing.created_at),
            None => (Uuid::new_v4(), Utc::now()),
        };
        Ok(Booking {
            id,
            property_id: self.property.id,
            guest,
            check_in: input.check_in,
            check_out: input.check_out,
            billing_unit: input.billing_unit,
            guests,
            duration: pricing.duration,
            total_price: pricing.total_price,
            status,
            notes: values.get(Notes).map(str::to_string),
            created_at,
        })
    }
}
