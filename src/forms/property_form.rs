//! Four-step wizard for creating and editing properties.

use rust_decimal::Decimal;

use super::fields::{format_amount, FieldDescriptor, FieldKind, Validator};
use super::registry::{FieldId, StepId};
use super::schema::FormSchema;
use super::validation::{CrossFieldRule, FieldErrors, FormValues};
use crate::domain::{Address, BillingUnit, Fee, PricingEntry, PricingTable, Property, PropertyKind};

pub const CLEANING_FEE_LABEL: &str = "Cleaning fee";
pub const SERVICE_FEE_LABEL: &str = "Service fee";
const NAME_MAX_LEN: usize = 80;
const DESCRIPTION_MAX_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyField {
    Name,
    Kind,
    Description,
    AddressLine,
    City,
    Postcode,
    Country,
    Bedrooms,
    MaxGuests,
    NightlyRate,
    WeeklyRate,
    MonthlyRate,
    MinNights,
    MaxNights,
    CleaningFee,
    ServiceFee,
}

impl FieldId for PropertyField {
    fn all() -> &'static [Self] {
        use PropertyField::*;
        &[
            Name,
            Kind,
            Description,
            AddressLine,
            City,
            Postcode,
            Country,
            Bedrooms,
            MaxGuests,
            NightlyRate,
            WeeklyRate,
            MonthlyRate,
            MinNights,
            MaxNights,
            CleaningFee,
            ServiceFee,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            PropertyField::Name => "name",
            PropertyField::Kind => "kind",
            PropertyField::Description => "description",
            PropertyField::AddressLine => "address_line",
            PropertyField::City => "city",
            PropertyField::Postcode => "postcode",
            PropertyField::Country => "country",
            PropertyField::Bedrooms => "bedrooms",
            PropertyField::MaxGuests => "max_guests",
            PropertyField::NightlyRate => "nightly_rate",
            PropertyField::WeeklyRate => "weekly_rate",
            PropertyField::MonthlyRate => "monthly_rate",
            PropertyField::MinNights => "min_nights",
            PropertyField::MaxNights => "max_nights",
            PropertyField::CleaningFee => "cleaning_fee",
            PropertyField::ServiceFee => "service_fee",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyStep {
    Details,
    Location,
    Capacity,
    Pricing,
}

impl StepId for PropertyStep {
    type Field = PropertyField;

    fn all() -> &'static [Self] {
        &[
            PropertyStep::Details,
            PropertyStep::Location,
            PropertyStep::Capacity,
            PropertyStep::Pricing,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            PropertyStep::Details => "details",
            PropertyStep::Location => "location",
            PropertyStep::Capacity => "capacity",
            PropertyStep::Pricing => "pricing",
        }
    }

    fn title(self) -> &'static str {
        match self {
            PropertyStep::Details => "Property details",
            PropertyStep::Location => "Location",
            PropertyStep::Capacity => "Capacity",
            PropertyStep::Pricing => "Pricing",
        }
    }

    fn description(self) -> &'static str {
        match self {
            PropertyStep::Details => "Name the property and choose its type.",
            PropertyStep::Location => "Where guests will stay.",
            PropertyStep::Capacity => "Rooms and the most guests allowed at once.",
            PropertyStep::Pricing => "Rates per billing unit and one-off fees.",
        }
    }

    fn fields(self) -> &'static [PropertyField] {
        use PropertyField::*;
        match self {
            PropertyStep::Details => &[Name, Kind, Description],
            PropertyStep::Location => &[AddressLine, City, Postcode, Country],
            PropertyStep::Capacity => &[Bedrooms, MaxGuests],
            PropertyStep::Pricing => &[
                NightlyRate,
                WeeklyRate,
                MonthlyRate,
                MinNights,
                MaxNights,
                CleaningFee,
                ServiceFee,
            ],
        }
    }
}

/// Property wizard schema. `taken_names` are names of other properties,
/// used to keep names unique.
#[derive(Debug, Clone)]
pub struct PropertyForm {
    taken_names: Vec<String>,
    existing: Option<Property>,
}

impl PropertyForm {
    pub fn create(taken_names: Vec<String>) -> Self {
        Self {
            taken_names,
            existing: None,
        }
    }

    /// Edits `property`; its own name is never treated as taken.
    pub fn edit(property: Property, taken_names: Vec<String>) -> Self {
        let own = property.name.trim().to_lowercase();
        let taken_names = taken_names
            .into_iter()
            .filter(|name| name.trim().to_lowercase() != own)
            .collect();
        Self {
            taken_names,
            existing: Some(property),
        }
    }

    pub fn existing(&self) -> Option<&Property> {
        self.existing.as_ref()
    }

    fn name_validator(&self) -> Validator {
        let taken: Vec<String> = self
            .taken_names
            .iter()
            .map(|name| name.trim().to_lowercase())
            .collect();
        Validator::custom(move |value| {
            if value.chars().count() > NAME_MAX_LEN {
                return Err(format!("Name cannot exceed {} characters", NAME_MAX_LEN));
            }
            if taken.contains(&value.to_lowercase()) {
                return Err(format!("A property named `{}` already exists", value));
            }
            Ok(())
        })
    }
}

/// Field values mirroring an existing property.
pub fn values_from_property(property: &Property) -> FormValues<PropertyField> {
    use PropertyField::*;
    let mut values = FormValues::new()
        .with(Name, property.name.clone())
        .with(Kind, property.kind.to_string())
        .with(AddressLine, property.address.line1.clone())
        .with(City, property.address.city.clone())
        .with(Postcode, property.address.postcode.clone())
        .with(Country, property.address.country.clone())
        .with(Bedrooms, property.bedrooms.to_string())
        .with(MaxGuests, property.max_guests.to_string());
    if let Some(description) = &property.description {
        values.set(Description, description.clone());
    }
    for (unit, field) in rate_fields() {
        if let Some(entry) = property.pricing.rate(unit) {
            values.set(field, format_amount(entry.unit_price));
        }
    }
    if let Some(entry) = property.pricing.rate(BillingUnit::Night) {
        if let Some(min) = entry.min_duration {
            values.set(MinNights, min.to_string());
        }
        if let Some(max) = entry.max_duration {
            values.set(MaxNights, max.to_string());
        }
    }
    for fee in &property.fees {
        match fee.label.as_str() {
            CLEANING_FEE_LABEL => {
                values.set(CleaningFee, format_amount(fee.amount));
            }
            SERVICE_FEE_LABEL => {
                values.set(ServiceFee, format_amount(fee.amount));
            }
            _ => {}
        }
    }
    values
}

fn rate_fields() -> [(BillingUnit, PropertyField); 3] {
    [
        (BillingUnit::Night, PropertyField::NightlyRate),
        (BillingUnit::Week, PropertyField::WeeklyRate),
        (BillingUnit::Month, PropertyField::MonthlyRate),
    ]
}

impl FormSchema for PropertyForm {
    type Field = PropertyField;
    type Step = PropertyStep;
    type Output = Property;

    fn name(&self) -> &'static str {
        "property"
    }

    fn describe(&self, field: PropertyField) -> FieldDescriptor<PropertyField> {
        use PropertyField::*;
        let amount = |id: PropertyField, label: &'static str| {
            FieldDescriptor::new(id, label, FieldKind::Decimal, Validator::NonNegativeDecimal)
                .with_optional()
        };
        match field {
            Name => FieldDescriptor::new(Name, "Name", FieldKind::Text, self.name_validator()),
            Kind => FieldDescriptor::choice(
                Kind,
                "Type",
                PropertyKind::ALL.iter().map(ToString::to_string).collect(),
            ),
            Description => FieldDescriptor::new(
                Description,
                "Description",
                FieldKind::Text,
                Validator::MaxLength(DESCRIPTION_MAX_LEN),
            )
            .with_optional(),
            AddressLine => FieldDescriptor::new(AddressLine, "Address", FieldKind::Text, Validator::NonEmpty),
            City => FieldDescriptor::new(City, "City", FieldKind::Text, Validator::NonEmpty),
            Postcode => FieldDescriptor::new(Postcode, "Postcode", FieldKind::Text, Validator::MaxLength(16)),
            Country => FieldDescriptor::new(Country, "Country", FieldKind::Text, Validator::MaxLength(56)),
            Bedrooms => FieldDescriptor::new(
                Bedrooms,
                "Bedrooms",
                FieldKind::Integer,
                Validator::custom(|value| {
                    value
                        .parse::<u32>()
                        .map(|_| ())
                        .map_err(|_| "Enter a whole number (0 or greater)".to_string())
                }),
            )
            .with_help("Use 0 for studios."),
            MaxGuests => FieldDescriptor::new(
                MaxGuests,
                "Maximum guests",
                FieldKind::Integer,
                Validator::PositiveInteger,
            ),
            NightlyRate => amount(NightlyRate, "Nightly rate"),
            WeeklyRate => amount(WeeklyRate, "Weekly rate"),
            MonthlyRate => amount(MonthlyRate, "Monthly rate"),
            MinNights => FieldDescriptor::new(
                MinNights,
                "Minimum nights",
                FieldKind::Integer,
                Validator::PositiveInteger,
            )
            .with_optional(),
            MaxNights => FieldDescriptor::new(
                MaxNights,
                "Maximum nights",
                FieldKind::Integer,
                Validator::PositiveInteger,
            )
            .with_optional(),
            CleaningFee => amount(CleaningFee, "Cleaning fee").with_help("Charged once per booking."),
            ServiceFee => amount(ServiceFee, "Service fee").with_help("Charged once per booking."),
        }
    }

    fn cross_field_rules(&self) -> Vec<CrossFieldRule<PropertyField>> {
        use PropertyField::*;
        vec![
            CrossFieldRule::new("at_least_one_rate", NightlyRate, |values| {
                let any_rate = [NightlyRate, WeeklyRate, MonthlyRate]
                    .into_iter()
                    .any(|field| !values.is_blank(field));
                (!any_rate).then(|| "Set at least one nightly, weekly, or monthly rate".to_string())
            }),
            CrossFieldRule::new("stay_limits_need_nightly_rate", MinNights, |values| {
                let limited = !values.is_blank(MinNights) || !values.is_blank(MaxNights);
                (limited && values.is_blank(NightlyRate))
                    .then(|| "Stay limits apply to the nightly rate; set one first".to_string())
            }),
            CrossFieldRule::new("max_nights_after_min", MaxNights, |values| {
                match (values.count(MinNights), values.count(MaxNights)) {
                    (Some(min), Some(max)) if max < min => Some(format!(
                        "Maximum nights must be at least the minimum ({})",
                        min
                    )),
                    _ => None,
                }
            }),
        ]
    }

    fn defaults(&self) -> FormValues<PropertyField> {
        match &self.existing {
            Some(property) => values_from_property(property),
            None => FormValues::new()
                .with(PropertyField::Kind, PropertyKind::default().to_string())
                .with(PropertyField::Bedrooms, "1")
                .with(PropertyField::MaxGuests, "2"),
        }
    }

    fn commit(&self, values: &FormValues<PropertyField>) -> Result<Property, FieldErrors<PropertyField>> {
        use PropertyField::*;
        let text = |field: PropertyField| required(values, field).map(str::to_string);

        let kind = required(values, Kind)?
            .parse::<PropertyKind>()
            .map_err(|err| FieldErrors::single(Kind, err))?;
        let address = Address::new(text(AddressLine)?, text(City)?, text(Postcode)?, text(Country)?);
        let bedrooms = parsed_count(values, Bedrooms)?.unwrap_or(0);
        let max_guests = parsed_count(values, MaxGuests)?.unwrap_or(1);

        let mut pricing = PricingTable::default();
        for (unit, field) in rate_fields() {
            if let Some(price) = parsed_amount(values, field)? {
                let mut entry = PricingEntry::new(price);
                if unit == BillingUnit::Night {
                    entry = entry.with_limits(
                        parsed_count(values, MinNights)?,
                        parsed_count(values, MaxNights)?,
                    );
                }
                pricing.set(unit, entry);
            }
        }

        let mut fees = Vec::new();
        for (field, label) in [(CleaningFee, CLEANING_FEE_LABEL), (ServiceFee, SERVICE_FEE_LABEL)] {
            if let Some(amount) = parsed_amount(values, field)? {
                if amount > Decimal::ZERO {
                    fees.push(Fee::new(label, amount));
                }
            }
        }

        let mut property = match &self.existing {
            Some(existing) => existing.clone(),
            None => Property::new(String::new(), kind, address.clone()),
        };
        property.name = text(Name)?;
        property.kind = kind;
        property.description = values.get(Description).map(str::to_string);
        property.address = address;
        property.bedrooms = bedrooms;
        property.max_guests = max_guests;
        property.pricing = pricing;
        property.fees = fees;
        if self.existing.is_some() {
            property.touch();
        }
        Ok(property)
    }
}

fn required(values: &FormValues<PropertyField>, field: PropertyField) -> Result<&str, FieldErrors<PropertyField>> {
    values
        .get(field)
        .ok_or_else(|| FieldErrors::single(field, "Value is required"))
}

fn parsed_amount(
    values: &FormValues<PropertyField>,
    field: PropertyField,
) -> Result<Option<Decimal>, FieldErrors<PropertyField>> {
    match values.get(field) {
        None => Ok(None),
        Some(_) => values
            .amount(field)
            .map(Some)
            .ok_or_else(|| FieldErrors::single(field, "Enter a numeric amount")),
    }
}

fn parsed_count(
    values: &FormValues<PropertyField>,
    field: PropertyField,
) -> Result<Option<u32>, FieldErrors<PropertyField>> {
    match values.get(field) {
        None => Ok(None),
        Some(_) => values
            .count(field)
            .map(Some)
            .ok_or_else(|| FieldErrors::single(field, "Enter a whole number")),
    }
}
