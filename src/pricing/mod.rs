//! Stay duration and price derivation for bookings.
//!
//! Durations are always rounded up to the next whole billing unit and fixed
//! fees are charged once per booking, never per unit.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{BillingUnit, Fee, PricingTable, Property};

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Check-out must be after check-in")]
    InvalidStayRange,
    #[error("No {0} rate is configured for this property")]
    MissingRate(BillingUnit),
    #[error("{0} cannot be negative")]
    NegativeAmount(String),
    #[error("Stay is too long to price")]
    StayTooLong,
    #[error("Price is too large to calculate")]
    AmountTooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingInput {
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub billing_unit: BillingUnit,
    pub pricing_table: PricingTable,
    pub fixed_fees: Vec<Fee>,
}

impl PricingInput {
    pub fn new(
        check_in: NaiveDateTime,
        check_out: NaiveDateTime,
        billing_unit: BillingUnit,
        pricing_table: PricingTable,
    ) -> Self {
        Self {
            check_in,
            check_out,
            billing_unit,
            pricing_table,
            fixed_fees: Vec::new(),
        }
    }

    pub fn with_fee(mut self, fee: Fee) -> Self {
        self.fixed_fees.push(fee);
        self
    }

    /// Builds an input from a property's own rate schedule and fees.
    pub fn for_property(
        property: &Property,
        check_in: NaiveDateTime,
        check_out: NaiveDateTime,
        billing_unit: BillingUnit,
    ) -> Self {
        Self {
            check_in,
            check_out,
            billing_unit,
            pricing_table: property.pricing.clone(),
            fixed_fees: property.fees.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    /// Whole billing units charged.
    pub duration: u32,
    pub total_price: Decimal,
    pub unit: BillingUnit,
    /// Elapsed calendar days, rounded up.
    pub raw_days: u32,
    pub base_amount: Decimal,
    pub fees_total: Decimal,
}

/// Computes duration and total price, rejecting a unit with no configured rate.
pub fn compute_pricing(input: &PricingInput) -> Result<PricingResult, PricingError> {
    let entry = input
        .pricing_table
        .rate(input.billing_unit)
        .ok_or(PricingError::MissingRate(input.billing_unit))?;
    price_with_rate(input, entry.unit_price)
}

/// Like [`compute_pricing`], but prices a missing rate as zero so only the
/// fixed fees are charged.
pub fn compute_pricing_lenient(input: &PricingInput) -> Result<PricingResult, PricingError> {
    let unit_price = match input.pricing_table.rate(input.billing_unit) {
        Some(entry) => entry.unit_price,
        None => {
            tracing::warn!(
                unit = %input.billing_unit,
                "no rate configured; pricing with fixed fees only"
            );
            Decimal::ZERO
        }
    };
    price_with_rate(input, unit_price)
}

/// Elapsed whole days between two instants, rounded up.
pub fn stay_days(
    check_in: NaiveDateTime,
    check_out: NaiveDateTime,
) -> Result<u32, PricingError> {
    let seconds = (check_out - check_in).num_seconds();
    if seconds <= 0 {
        return Err(PricingError::InvalidStayRange);
    }
    let days = (seconds as u64).div_ceil(SECONDS_PER_DAY);
    u32::try_from(days).map_err(|_| PricingError::StayTooLong)
}

/// Converts raw days into whole billing units, rounding partial units up.
pub fn units_for_days(raw_days: u32, unit: BillingUnit) -> u32 {
    raw_days.div_ceil(unit.span_days() as u32)
}

fn price_with_rate(input: &PricingInput, unit_price: Decimal) -> Result<PricingResult, PricingError> {
    if unit_price.is_sign_negative() && !unit_price.is_zero() {
        return Err(PricingError::NegativeAmount(format!(
            "{} rate",
            input.billing_unit.adjective()
        )));
    }
    let raw_days = stay_days(input.check_in, input.check_out)?;
    let duration = units_for_days(raw_days, input.billing_unit);
    let base_amount = Decimal::from(duration)
        .checked_mul(unit_price)
        .ok_or(PricingError::AmountTooLarge)?;

    let mut fees_total = Decimal::ZERO;
    for fee in &input.fixed_fees {
        if fee.amount.is_sign_negative() && !fee.amount.is_zero() {
            return Err(PricingError::NegativeAmount(format!("Fee `{}`", fee.label)));
        }
        fees_total = fees_total
            .checked_add(fee.amount)
            .ok_or(PricingError::AmountTooLarge)?;
    }
    let total_price = base_amount
        .checked_add(fees_total)
        .ok_or(PricingError::AmountTooLarge)?;

    Ok(PricingResult {
        duration,
        total_price,
        unit: input.billing_unit,
        raw_days,
        base_amount,
        fees_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricingEntry;
    use chrono::{Duration, NaiveDate};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn table(unit: BillingUnit, price: i64) -> PricingTable {
        let mut table = PricingTable::default();
        table.set(unit, PricingEntry::new(Decimal::from(price)));
        table
    }

    fn input(from: NaiveDateTime, to: NaiveDateTime, unit: BillingUnit, price: i64) -> PricingInput {
        PricingInput::new(from, to, unit, table(unit, price))
    }

    #[test]
    fn nightly_stay_adds_fee_once() {
        let input = input(at(1, 0), at(4, 0), BillingUnit::Night, 1000)
            .with_fee(Fee::new("Cleaning", Decimal::from(500)));
        let result = compute_pricing(&input).unwrap();
        assert_eq!(result.duration, 3);
        assert_eq!(result.total_price, Decimal::from(3500));
        assert_eq!(result.fees_total, Decimal::from(500));
    }

    #[test]
    fn partial_week_rounds_up() {
        let result = compute_pricing(&input(at(1, 0), at(4, 0), BillingUnit::Week, 7000)).unwrap();
        assert_eq!(result.duration, 1);
        assert_eq!(result.total_price, Decimal::from(7000));
    }

    #[test]
    fn partial_day_counts_as_full_day() {
        let result = compute_pricing(&input(at(1, 15), at(3, 11), BillingUnit::Night, 90)).unwrap();
        assert_eq!(result.raw_days, 2);
        assert_eq!(result.total_price, Decimal::from(180));
    }

    #[test]
    fn thirty_one_days_is_two_months() {
        let result = compute_pricing(&input(at(1, 0), at(1, 0) + Duration::days(31), BillingUnit::Month, 2000))
            .unwrap();
        assert_eq!(result.raw_days, 31);
        assert_eq!(result.duration, 2);
    }

    #[test]
    fn empty_or_reversed_range_is_rejected() {
        let same = input(at(4, 0), at(4, 0), BillingUnit::Night, 10);
        assert_eq!(compute_pricing(&same), Err(PricingError::InvalidStayRange));
        let reversed = input(at(5, 0), at(4, 0), BillingUnit::Night, 10);
        assert_eq!(compute_pricing(&reversed), Err(PricingError::InvalidStayRange));
    }

    #[test]
    fn missing_rate_is_an_error_unless_lenient() {
        let mut input = input(at(1, 0), at(4, 0), BillingUnit::Night, 10)
            .with_fee(Fee::new("Service", Decimal::from(25)));
        input.billing_unit = BillingUnit::Month;
        assert_eq!(
            compute_pricing(&input),
            Err(PricingError::MissingRate(BillingUnit::Month))
        );
        let lenient = compute_pricing_lenient(&input).unwrap();
        assert_eq!(lenient.base_amount, Decimal::ZERO);
        assert_eq!(lenient.total_price, Decimal::from(25));
    }

    #[test]
    fn overflowing_amounts_are_errors() {
        let mut huge = PricingTable::default();
        huge.set(BillingUnit::Night, PricingEntry::new(Decimal::MAX));
        let long_stay = PricingInput::new(at(1, 0), at(3, 0), BillingUnit::Night, huge);
        assert_eq!(compute_pricing(&long_stay), Err(PricingError::AmountTooLarge));

        let stacked_fees = input(at(1, 0), at(2, 0), BillingUnit::Night, 10)
            .with_fee(Fee::new("Cleaning", Decimal::MAX))
            .with_fee(Fee::new("Service", Decimal::MAX));
        assert_eq!(compute_pricing(&stacked_fees), Err(PricingError::AmountTooLarge));
    }

    #[test]
    fn negative_fee_is_rejected() {
        let input = input(at(1, 0), at(2, 0), BillingUnit::Night, 10)
            .with_fee(Fee::new("Discount", Decimal::from(-5)));
        assert!(matches!(
            compute_pricing(&input),
            Err(PricingError::NegativeAmount(_))
        ));
    }
}
