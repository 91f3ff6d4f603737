//! Per-step validation gate.
//!
//! A step is checked in three passes over the fields it owns: required
//! presence, the field's own validator, then cross-field rules targeting one
//! of the step's fields. The first message recorded for a field wins, so a
//! cross-field rule never overwrites a more basic failure.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use super::fields::{parse_amount, parse_count, parse_datetime};
use super::registry::{FieldId, StepRegistry};
use super::schema::FormSchema;

/// Raw string values keyed by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues<F: FieldId> {
    values: BTreeMap<F, String>,
}

impl<F: FieldId> Default for FormValues<F> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<F: FieldId> FormValues<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed value, treating blank input as absent.
    pub fn get(&self, field: F) -> Option<&str> {
        self.values
            .get(&field)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn raw(&self, field: F) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn is_blank(&self, field: F) -> bool {
        self.get(field).is_none()
    }

    /// Stores `value`, returning whether anything changed.
    pub fn set(&mut self, field: F, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.values.get(&field) == Some(&value) {
            return false;
        }
        self.values.insert(field, value);
        true
    }

    pub fn remove(&mut self, field: F) -> bool {
        self.values.remove(&field).is_some()
    }

    pub fn with(mut self, field: F, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> {
        self.values.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn amount(&self, field: F) -> Option<Decimal> {
        self.get(field).and_then(parse_amount)
    }

    pub fn count(&self, field: F) -> Option<u32> {
        self.get(field).and_then(parse_count)
    }

    pub fn datetime(&self, field: F) -> Option<NaiveDateTime> {
        self.get(field).and_then(parse_datetime)
    }

    /// String-keyed copy used for drafts and views.
    pub fn to_keyed(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(field, value)| (field.key().to_string(), value.clone()))
            .collect()
    }

    /// Rebuilds values from string keys, returning the keys that matched no field.
    pub fn from_keyed(keyed: &BTreeMap<String, String>) -> (Self, Vec<String>) {
        let mut values = Self::new();
        let mut unknown = Vec::new();
        for (key, value) in keyed {
            match F::from_key(key) {
                Some(field) => {
                    values.set(field, value.clone());
                }
                None => unknown.push(key.clone()),
            }
        }
        (values, unknown)
    }
}

/// Validation messages keyed by field; the first message per field wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors<F: FieldId> {
    errors: BTreeMap<F, String>,
}

impl<F: FieldId> Default for FieldErrors<F> {
    fn default() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }
}

impl<F: FieldId> FieldErrors<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: F, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: F, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: F) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn remove(&mut self, field: F) -> Option<String> {
        self.errors.remove(&field)
    }

    pub fn contains(&self, field: F) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
        self.errors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    pub fn to_keyed(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|(field, msg)| (field.key().to_string(), msg.clone()))
            .collect()
    }
}

impl<F: FieldId> fmt::Display for FieldErrors<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, msg)| format!("{}: {}", field.key(), msg))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

type RuleCheck<F> = dyn Fn(&FormValues<F>) -> Option<String> + Send + Sync;

/// Predicate over several fields whose failure is reported on `target`.
#[derive(Clone)]
pub struct CrossFieldRule<F: FieldId> {
    pub target: F,
    pub name: &'static str,
    check: Arc<RuleCheck<F>>,
}

impl<F: FieldId> CrossFieldRule<F> {
    pub fn new(
        name: &'static str,
        target: F,
        check: impl Fn(&FormValues<F>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            target,
            name,
            check: Arc::new(check),
        }
    }

    /// Returns the failure message, or `None` when the rule holds.
    pub fn evaluate(&self, values: &FormValues<F>) -> Option<String> {
        (self.check)(values)
    }
}

impl<F: FieldId> fmt::Debug for CrossFieldRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossFieldRule")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish()
    }
}

/// Validates the fields owned by `step_index` and nothing else.
///
/// An index outside the registry owns no fields and therefore passes.
pub fn validate_step<S: FormSchema>(
    schema: &S,
    registry: &StepRegistry<S::Step>,
    values: &FormValues<S::Field>,
    step_index: usize,
) -> Result<(), FieldErrors<S::Field>> {
    let owned = registry.fields_of(step_index);
    let mut errors = FieldErrors::new();

    for field in owned {
        let descriptor = schema.describe(*field);
        match values.get(*field) {
            None if descriptor.required => {
                errors.insert(*field, format!("{} is required", descriptor.label));
            }
            None => {}
            Some(value) => {
                if let Err(err) = descriptor.validator.validate(value) {
                    errors.insert(*field, err.message);
                }
            }
        }
    }

    for rule in schema.cross_field_rules() {
        if !owned.contains(&rule.target) || errors.contains(rule.target) {
            continue;
        }
        if let Some(message) = rule.evaluate(values) {
            errors.insert(rule.target, message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(step = step_index, errors = errors.len(), "step validation failed");
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::property_form::{PropertyField, PropertyForm};

    fn details() -> FormValues<PropertyField> {
        FormValues::new()
            .with(PropertyField::Name, "Harbour Loft")
            .with(PropertyField::Kind, "apartment")
    }

    #[test]
    fn only_reports_fields_of_the_requested_step() {
        let form = PropertyForm::create(Vec::new());
        let registry = StepRegistry::from_all().unwrap();
        // Location and pricing are blank but only the details step is checked.
        assert!(validate_step(&form, &registry, &details(), 0).is_ok());

        let errors = validate_step(&form, &registry, &details(), 1).unwrap_err();
        assert!(errors.fields().all(|field| registry.owner_of(field) == Some(1)));
        assert_eq!(errors.get(PropertyField::City), Some("City is required"));
    }

    #[test]
    fn blank_input_counts_as_missing() {
        let form = PropertyForm::create(Vec::new());
        let registry = StepRegistry::from_all().unwrap();
        let values = details().with(PropertyField::Name, "   ");
        let errors = validate_step(&form, &registry, &values, 0).unwrap_err();
        assert_eq!(errors.get(PropertyField::Name), Some("Name is required"));
    }

    #[test]
    fn cross_field_rule_reports_on_target() {
        let form = PropertyForm::create(Vec::new());
        let registry = StepRegistry::from_all().unwrap();
        let pricing = registry.len() - 1;
        let errors = validate_step(&form, &registry, &FormValues::new(), pricing).unwrap_err();
        assert!(errors.get(PropertyField::NightlyRate).is_some());
        assert!(errors.get(PropertyField::CleaningFee).is_none());
    }

    #[test]
    fn out_of_range_step_passes() {
        let form = PropertyForm::create(Vec::new());
        let registry = StepRegistry::from_all().unwrap();
        assert!(validate_step(&form, &registry, &FormValues::new(), 42).is_ok());
    }

    #[test]
    fn keyed_round_trip_drops_unknown_keys() {
        let mut keyed = BTreeMap::new();
        keyed.insert("name".to_string(), "Loft".to_string());
        keyed.insert("legacy_field".to_string(), "x".to_string());
        let (values, unknown) = FormValues::<PropertyField>::from_keyed(&keyed);
        assert_eq!(values.get(PropertyField::Name), Some("Loft"));
        assert_eq!(unknown, vec!["legacy_field".to_string()]);
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.insert(PropertyField::Name, "first");
        errors.insert(PropertyField::Name, "second");
        assert_eq!(errors.get(PropertyField::Name), Some("first"));
        assert_eq!(errors.len(), 1);
    }
}
