//! Multi-step form engine and the concrete property and booking wizards.

pub mod booking_form;
pub mod draft;
pub mod fields;
pub mod orchestrator;
pub mod property_form;
pub mod registry;
pub mod schema;
pub mod validation;

pub use booking_form::{BookingField, BookingForm, BookingStep};
pub use draft::{DebounceTimer, Draft, DraftPersistence};
pub use fields::{FieldDescriptor, FieldKind, ValidationError, Validator};
pub use orchestrator::{
    FieldView, FormOrchestrator, FormState, StepTransition, SubmitMode, SubmitOutcome,
    SubmitRequest, SubmitStart, WizardPhase, WizardView,
};
pub use property_form::{PropertyField, PropertyForm, PropertyStep};
pub use registry::{FieldId, FormStep, RegistryError, StepId, StepRegistry};
pub use schema::FormSchema;
pub use validation::{validate_step, CrossFieldRule, FieldErrors, FormValues};
