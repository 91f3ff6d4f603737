//! Ordered step definitions for a multi-step form.

use std::collections::BTreeMap;
use std::fmt::Debug;

use thiserror::Error;

/// Closed set of field identifiers belonging to one form.
pub trait FieldId: Copy + Ord + Debug + Send + Sync + 'static {
    /// Every field of the form, in declaration order.
    fn all() -> &'static [Self];

    /// Stable string key used for drafts and the command surface.
    fn key(self) -> &'static str;

    fn from_key(key: &str) -> Option<Self> {
        let wanted = key.trim().to_ascii_lowercase().replace('-', "_");
        Self::all().iter().copied().find(|field| field.key() == wanted)
    }
}

/// Closed set of step identifiers; each step statically names its fields.
pub trait StepId: Copy + Eq + Debug + Send + Sync + 'static {
    type Field: FieldId;

    fn all() -> &'static [Self];
    fn key(self) -> &'static str;
    fn title(self) -> &'static str;
    fn description(self) -> &'static str;
    fn fields(self) -> &'static [Self::Field];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a form needs at least one step")]
    Empty,
    #[error("step `{0}` owns no fields")]
    StepWithoutFields(&'static str),
    #[error("field `{field}` is owned by both `{first}` and `{second}`")]
    FieldOwnedTwice {
        field: &'static str,
        first: &'static str,
        second: &'static str,
    },
}

/// One page of the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormStep<S: StepId> {
    pub id: S,
    pub title: &'static str,
    pub description: &'static str,
    pub fields: Vec<S::Field>,
}

impl<S: StepId> FormStep<S> {
    pub fn from_id(id: S) -> Self {
        Self {
            id,
            title: id.title(),
            description: id.description(),
            fields: id.fields().to_vec(),
        }
    }

    pub fn owns(&self, field: S::Field) -> bool {
        self.fields.contains(&field)
    }
}

/// Immutable ordered list of steps with field ownership resolved up front.
#[derive(Debug, Clone)]
pub struct StepRegistry<S: StepId> {
    steps: Vec<FormStep<S>>,
    owners: BTreeMap<S::Field, usize>,
}

impl<S: StepId> StepRegistry<S> {
    /// Builds a registry, rejecting empty forms, empty steps, and fields
    /// claimed by more than one step.
    pub fn new(steps: Vec<FormStep<S>>) -> Result<Self, RegistryError> {
        if steps.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut owners = BTreeMap::new();
        for (index, step) in steps.iter().enumerate() {
            if step.fields.is_empty() {
                return Err(RegistryError::StepWithoutFields(step.id.key()));
            }
            for field in &step.fields {
                if let Some(previous) = owners.insert(*field, index) {
                    return Err(RegistryError::FieldOwnedTwice {
                        field: field.key(),
                        first: steps[previous].id.key(),
                        second: step.id.key(),
                    });
                }
            }
        }
        Ok(Self { steps, owners })
    }

    /// Registry holding every declared step in declaration order.
    pub fn from_all() -> Result<Self, RegistryError> {
        Self::new(S::all().iter().copied().map(FormStep::from_id).collect())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&FormStep<S>> {
        self.steps.get(index)
    }

    pub fn fields_of(&self, index: usize) -> &[S::Field] {
        self.steps
            .get(index)
            .map(|step| step.fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_of(&self, id: S) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }

    /// Index of the step that owns `field`, if any step does.
    pub fn owner_of(&self, field: S::Field) -> Option<usize> {
        self.owners.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormStep<S>> {
        self.steps.iter()
    }
}
