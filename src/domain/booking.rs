use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guest {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A reservation of a property for a guest over a date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest: Guest,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub billing_unit: BillingUnit,
    pub guests: u32,
    pub duration: u32,
    pub total_price: Decimal,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Whether the booking's stay intersects `[check_in, check_out)`.
    pub fn overlaps(&self, check_in: NaiveDateTime, check_out: NaiveDateTime) -> bool {
        self.check_in < check_out && check_in < self.check_out
    }

    /// Bookings that still hold the property's calendar.
    pub fn blocks_calendar(&self) -> bool {
        matches!(
            self.status,
            BookingStatus::Confirmed | BookingStatus::CheckedIn
        )
    }
}

impl Identifiable for Booking {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Booking {
    fn display_label(&self) -> String {
        format!(
            "{} · {} → {} ({})",
            self.guest.name,
            self.check_in.format("%Y-%m-%d"),
            self.check_out.format("%Y-%m-%d"),
            self.status
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::CheckedIn,
        BookingStatus::CheckedOut,
        BookingStatus::Cancelled,
    ];
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::CheckedIn => "Checked in",
            BookingStatus::CheckedOut => "Checked out",
            BookingStatus::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        BookingStatus::ALL
            .into_iter()
            .find(|status| {
                status
                    .to_string()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_ascii_lowercase()
                    == normalized
            })
            .ok_or_else(|| format!("Unknown booking status `{}`", value.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn status_parses_with_spacing_variants() {
        assert_eq!("checked-in".parse::<BookingStatus>(), Ok(BookingStatus::CheckedIn));
        assert_eq!("CheckedOut".parse::<BookingStatus>(), Ok(BookingStatus::CheckedOut));
        assert!("archived".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn adjacent_stays_do_not_overlap() {
        let booking = Booking {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            guest: Guest {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                phone: None,
            },
            check_in: at(1),
            check_out: at(4),
            billing_unit: BillingUnit::Night,
            guests: 2,
            duration: 3,
            total_price: Decimal::from(300),
            status: BookingStatus::Confirmed,
            notes: None,
            created_at: Utc::now(),
        };
        assert!(!booking.overlaps(at(4), at(6)));
        assert!(booking.overlaps(at(3), at(6)));
    }
}
