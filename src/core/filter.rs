//! In-memory search, filter, and sort for catalog listings.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Booking, BookingStatus, Property, PropertyKind};

/// Minimum Jaro-Winkler score for a fuzzy name match.
pub const FUZZY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    pub search: Option<String>,
    pub kind: Option<PropertyKind>,
    pub min_guests: Option<u32>,
    pub max_nightly_rate: Option<Decimal>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PropertySort {
    #[default]
    NameAsc,
    NameDesc,
    NightlyRateAsc,
    NightlyRateDesc,
    Newest,
}

impl FromStr for PropertySort {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "name" | "name-asc" => Ok(PropertySort::NameAsc),
            "name-desc" => Ok(PropertySort::NameDesc),
            "rate" | "rate-asc" => Ok(PropertySort::NightlyRateAsc),
            "rate-desc" => Ok(PropertySort::NightlyRateDesc),
            "newest" => Ok(PropertySort::Newest),
            other => Err(format!("unknown property sort `{}`", other)),
        }
    }
}

impl PropertyFilter {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = (!term.trim().is_empty()).then_some(term);
        self
    }

    pub fn kind(mut self, kind: PropertyKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn min_guests(mut self, guests: u32) -> Self {
        self.min_guests = Some(guests);
        self
    }

    pub fn max_nightly_rate(mut self, rate: Decimal) -> Self {
        self.max_nightly_rate = Some(rate);
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn matches(&self, property: &Property) -> bool {
        if let Some(kind) = self.kind {
            if property.kind != kind {
                return false;
            }
        }
        if let Some(guests) = self.min_guests {
            if property.max_guests < guests {
                return false;
            }
        }
        if let Some(limit) = self.max_nightly_rate {
            match property.nightly_rate() {
                Some(rate) if rate <= limit => {}
                _ => return false,
            }
        }
        if let Some(city) = &self.city {
            if !property.address.city.eq_ignore_ascii_case(city.trim()) {
                return false;
            }
        }
        match &self.search {
            Some(term) => search_matches(term, property),
            None => true,
        }
    }

    pub fn apply<'a>(&self, properties: &'a [Property], sort: PropertySort) -> Vec<&'a Property> {
        let mut matched: Vec<&Property> = properties.iter().filter(|p| self.matches(p)).collect();
        matched.sort_by(|a, b| compare_properties(a, b, sort));
        matched
    }
}

fn search_matches(term: &str, property: &Property) -> bool {
    let needle = term.trim().to_lowercase();
    let name = property.name.to_lowercase();
    if name.contains(&needle) || property.address.city.to_lowercase().contains(&needle) {
        return true;
    }
    strsim::jaro_winkler(&needle, &name) >= FUZZY_THRESHOLD
}

fn compare_properties(a: &Property, b: &Property, sort: PropertySort) -> Ordering {
    let by_name = || a.name.to_lowercase().cmp(&b.name.to_lowercase());
    match sort {
        PropertySort::NameAsc => by_name(),
        PropertySort::NameDesc => by_name().reverse(),
        PropertySort::NightlyRateAsc => {
            compare_rates(a.nightly_rate(), b.nightly_rate()).then_with(by_name)
        }
        PropertySort::NightlyRateDesc => compare_rates(b.nightly_rate(), a.nightly_rate())
            .then_with(by_name),
        PropertySort::Newest => b.created_at.cmp(&a.created_at).then_with(by_name),
    }
}

/// Properties without a nightly rate always sort last.
fn compare_rates(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub property_id: Option<Uuid>,
    /// Keeps bookings still running at or after this instant.
    pub from: Option<NaiveDateTime>,
    /// Keeps bookings starting before this instant.
    pub to: Option<NaiveDateTime>,
    pub guest: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookingSort {
    #[default]
    CheckInAsc,
    CheckInDesc,
    TotalDesc,
}

impl FromStr for BookingSort {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "check-in" | "checkin" | "upcoming" => Ok(BookingSort::CheckInAsc),
            "check-in-desc" | "checkin-desc" | "latest" => Ok(BookingSort::CheckInDesc),
            "total" | "total-desc" => Ok(BookingSort::TotalDesc),
            other => Err(format!("unknown booking sort `{}`", other)),
        }
    }
}

impl BookingFilter {
    pub fn status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn property(mut self, id: Uuid) -> Self {
        self.property_id = Some(id);
        self
    }

    pub fn between(mut self, from: NaiveDateTime, to: NaiveDateTime) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn guest(mut self, name: impl Into<String>) -> Self {
        self.guest = Some(name.into());
        self
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        if self.status.is_some_and(|status| booking.status != status) {
            return false;
        }
        if self.property_id.is_some_and(|id| booking.property_id != id) {
            return false;
        }
        if self.from.is_some_and(|from| booking.check_out <= from) {
            return false;
        }
        if self.to.is_some_and(|to| booking.check_in >= to) {
            return false;
        }
        match &self.guest {
            Some(guest) => {
                let needle = guest.trim().to_lowercase();
                booking.guest.name.to_lowercase().contains(&needle)
                    || booking.guest.email.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }

    pub fn apply<'a>(&self, bookings: &'a [Booking], sort: BookingSort) -> Vec<&'a Booking> {
        let mut matched: Vec<&Booking> = bookings.iter().filter(|b| self.matches(b)).collect();
        matched.sort_by(|a, b| match sort {
            BookingSort::CheckInAsc => a.check_in.cmp(&b.check_in),
            BookingSort::CheckInDesc => b.check_in.cmp(&a.check_in),
            BookingSort::TotalDesc => b
                .total_price
                .cmp(&a.total_price)
                .then_with(|| a.check_in.cmp(&b.check_in)),
        });
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, BillingUnit, PricingEntry};

    fn property(name: &str, city: &str, guests: u32, nightly: Option<i64>) -> Property {
        let mut property = Property::new(
            name,
            PropertyKind::House,
            Address::new("1 Main St", city, "0000", "PT"),
        )
        .with_capacity(2, guests);
        if let Some(rate) = nightly {
            property = property.with_rate(BillingUnit::Night, PricingEntry::new(Decimal::from(rate)));
        }
        property
    }

    fn sample() -> Vec<Property> {
        vec![
            property("Harbour Loft", "Lisbon", 4, Some(120)),
            property("Mountain Cabin", "Porto", 6, Some(90)),
            property("City Studio", "Lisbon", 2, None),
        ]
    }

    #[test]
    fn search_matches_name_or_city_substring() {
        let properties = sample();
        let hits = PropertyFilter::default()
            .search("lisbon")
            .apply(&properties, PropertySort::NameAsc);
        let names: Vec<&str> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["City Studio", "Harbour Loft"]);
    }

    #[test]
    fn search_tolerates_typos() {
        let properties = sample();
        let hits = PropertyFilter::default()
            .search("Mountain Cabn")
            .apply(&properties, PropertySort::NameAsc);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Mountain Cabin");
    }

    #[test]
    fn rate_filter_excludes_unpriced_and_sorts() {
        let properties = sample();
        let hits = PropertyFilter::default()
            .max_nightly_rate(Decimal::from(150))
            .min_guests(3)
            .apply(&properties, PropertySort::NightlyRateAsc);
        let names: Vec<&str> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Mountain Cabin", "Harbour Loft"]);
    }

    #[test]
    fn unpriced_properties_sort_last() {
        let properties = sample();
        let hits = PropertyFilter::default().apply(&properties, PropertySort::NightlyRateDesc);
        assert_eq!(hits.last().map(|p| p.name.as_str()), Some("City Studio"));
    }

    #[test]
    fn sort_names_parse() {
        assert_eq!("rate-desc".parse::<PropertySort>(), Ok(PropertySort::NightlyRateDesc));
        assert!("sideways".parse::<PropertySort>().is_err());
    }
}
