//! Property-management records: properties, pricing schedules, guests, and bookings.

pub mod booking;
pub mod common;
pub mod property;

pub use booking::{Booking, BookingStatus, Guest};
pub use common::{BillingUnit, Displayable, Identifiable, NamedEntity};
pub use property::{Address, Fee, PricingEntry, PricingTable, Property, PropertyKind};
