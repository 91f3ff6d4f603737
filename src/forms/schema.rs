use super::fields::FieldDescriptor;
use super::registry::{FieldId, FormStep, StepId};
use super::validation::{CrossFieldRule, FieldErrors, FormValues};
use crate::pricing::PricingInput;

/// Describes one concrete multi-step form: its steps, how each field is
/// validated, and how validated values become a record.
pub trait FormSchema: Send + Sync {
    type Field: FieldId;
    type Step: StepId<Field = Self::Field>;
    type Output: Send + Sync;

    /// Stable form name, also used to namespace drafts.
    fn name(&self) -> &'static str;

    fn steps(&self) -> Vec<FormStep<Self::Step>> {
        Self::Step::all()
            .iter()
            .copied()
            .map(FormStep::from_id)
            .collect()
    }

    fn describe(&self, field: Self::Field) -> FieldDescriptor<Self::Field>;

    fn cross_field_rules(&self) -> Vec<CrossFieldRule<Self::Field>> {
        Vec::new()
    }

    /// Initial values for a fresh session.
    fn defaults(&self) -> FormValues<Self::Field> {
        FormValues::new()
    }

    /// Pricing inputs derived from the current values, when complete enough.
    fn pricing_input(&self, _values: &FormValues<Self::Field>) -> Option<PricingInput> {
        None
    }

    /// Converts validated values into the record handed to persistence.
    fn commit(
        &self,
        values: &FormValues<Self::Field>,
    ) -> Result<Self::Output, FieldErrors<Self::Field>>;
}
