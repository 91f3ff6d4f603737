//! Shared traits and enums for property-management records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Exposes a stable identifier for stored records.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to a record's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts a record into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Time granularity used to price a booking.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum BillingUnit {
    #[default]
    Night,
    Week,
    Month,
}

impl BillingUnit {
    pub const ALL: [BillingUnit; 3] = [BillingUnit::Night, BillingUnit::Week, BillingUnit::Month];

    /// Number of calendar days covered by one unit.
    pub fn span_days(self) -> i64 {
        match self {
            BillingUnit::Night => 1,
            BillingUnit::Week => 7,
            BillingUnit::Month => 30,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BillingUnit::Night => "night",
            BillingUnit::Week => "week",
            BillingUnit::Month => "month",
        }
    }

    /// Label used for rate fields, e.g. "Nightly".
    pub fn adjective(self) -> &'static str {
        match self {
            BillingUnit::Night => "Nightly",
            BillingUnit::Week => "Weekly",
            BillingUnit::Month => "Monthly",
        }
    }
}

impl fmt::Display for BillingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BillingUnit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "night" | "nightly" | "nights" => Ok(BillingUnit::Night),
            "week" | "weekly" | "weeks" => Ok(BillingUnit::Week),
            "month" | "monthly" | "months" => Ok(BillingUnit::Month),
            other => Err(format!(
                "Unknown billing unit `{}` (expected night, week, or month)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_unit_parses_aliases() {
        assert_eq!("Nightly".parse::<BillingUnit>(), Ok(BillingUnit::Night));
        assert_eq!(" weeks ".parse::<BillingUnit>(), Ok(BillingUnit::Week));
        assert_eq!("MONTH".parse::<BillingUnit>(), Ok(BillingUnit::Month));
        assert!("fortnight".parse::<BillingUnit>().is_err());
    }

    #[test]
    fn billing_unit_serializes_lowercase() {
        let json = serde_json::to_string(&BillingUnit::Week).unwrap();
        assert_eq!(json, "\"week\"");
    }
}
