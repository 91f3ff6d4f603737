use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// A rentable property managed by an organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: Uuid,
    pub name: String,
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: Address,
    pub bedrooms: u32,
    pub max_guests: u32,
    #[serde(default)]
    pub pricing: PricingTable,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fees: Vec<Fee>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyKind, address: Address) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            description: None,
            address,
            bedrooms: 1,
            max_guests: 2,
            pricing: PricingTable::default(),
            fees: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_rate(mut self, unit: BillingUnit, entry: PricingEntry) -> Self {
        self.pricing.set(unit, entry);
        self
    }

    pub fn with_fee(mut self, fee: Fee) -> Self {
        self.fees.push(fee);
        self
    }

    pub fn with_capacity(mut self, bedrooms: u32, max_guests: u32) -> Self {
        self.bedrooms = bedrooms;
        self.max_guests = max_guests;
        self
    }

    pub fn nightly_rate(&self) -> Option<Decimal> {
        self.pricing.rate(BillingUnit::Night).map(|entry| entry.unit_price)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Identifiable for Property {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Property {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Property {
    fn display_label(&self) -> String {
        format!("{} ({}, {})", self.name, self.kind, self.address.city)
    }
}

/// Enumerates the supported property classifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PropertyKind {
    #[default]
    Apartment,
    House,
    Villa,
    Studio,
    Room,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 5] = [
        PropertyKind::Apartment,
        PropertyKind::House,
        PropertyKind::Villa,
        PropertyKind::Studio,
        PropertyKind::Room,
    ];
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PropertyKind::Apartment => "Apartment",
            PropertyKind::House => "House",
            PropertyKind::Villa => "Villa",
            PropertyKind::Studio => "Studio",
            PropertyKind::Room => "Room",
        };
        f.write_str(label)
    }
}

impl FromStr for PropertyKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        PropertyKind::ALL
            .into_iter()
            .find(|kind| kind.to_string().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("Unknown property type `{}`", value.trim()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Address {
    pub line1: String,
    pub city: String,
    pub postcode: String,
    pub country: String,
}

impl Address {
    pub fn new(
        line1: impl Into<String>,
        city: impl Into<String>,
        postcode: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            line1: line1.into(),
            city: city.into(),
            postcode: postcode.into(),
            country: country.into(),
        }
    }
}

/// Price and stay limits for one billing unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricingEntry {
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
}

impl PricingEntry {
    pub fn new(unit_price: Decimal) -> Self {
        Self {
            unit_price,
            min_duration: None,
            max_duration: None,
        }
    }

    pub fn with_limits(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_duration = min;
        self.max_duration = max;
        self
    }

    /// Whether a stay of `duration` units falls inside the configured limits.
    pub fn accepts(&self, duration: u32) -> bool {
        self.min_duration.map_or(true, |min| duration >= min)
            && self.max_duration.map_or(true, |max| duration <= max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct PricingTable {
    entries: BTreeMap<BillingUnit, PricingEntry>,
}

impl PricingTable {
    pub fn rate(&self, unit: BillingUnit) -> Option<&PricingEntry> {
        self.entries.get(&unit)
    }

    pub fn set(&mut self, unit: BillingUnit, entry: PricingEntry) {
        self.entries.insert(unit, entry);
    }

    pub fn remove(&mut self, unit: BillingUnit) -> Option<PricingEntry> {
        self.entries.remove(&unit)
    }

    pub fn units(&self) -> impl Iterator<Item = BillingUnit> + '_ {
        self.entries.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One-off charge added to every booking (cleaning, service, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fee {
    pub label: String,
    pub amount: Decimal,
}

impl Fee {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_entry_limits_are_inclusive() {
        let entry = PricingEntry::new(Decimal::from(100)).with_limits(Some(2), Some(5));
        assert!(!entry.accepts(1));
        assert!(entry.accepts(2));
        assert!(entry.accepts(5));
        assert!(!entry.accepts(6));
    }

    #[test]
    fn property_kind_round_trips_through_display() {
        for kind in PropertyKind::ALL {
            assert_eq!(kind.to_string().parse::<PropertyKind>(), Ok(kind));
        }
    }

    #[test]
    fn pricing_table_serializes_as_unit_map() {
        let property = Property::new("Loft", PropertyKind::Studio, Address::default())
            .with_rate(BillingUnit::Week, PricingEntry::new(Decimal::from(700)));
        let json = serde_json::to_value(&property.pricing).unwrap();
        assert_eq!(json["week"]["unit_price"], serde_json::json!("700"));
    }
}
