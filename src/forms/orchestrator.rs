//! Step-by-step wizard state machine.
//!
//! The orchestrator owns the current step and values, gates forward
//! navigation on the validation gate, mirrors every edit into debounced draft
//! storage, and keeps derived pricing in sync. Submission is split in two so
//! callers can run the persistence call wherever they like:
//! [`FormOrchestrator::begin_submit`] hands out a [`SubmitRequest`] and flips
//! the phase to `Submitting`, and [`FormOrchestrator::complete_submit`]
//! records the outcome. While `Submitting`, every other transition is a
//! no-op.

use std::collections::BTreeMap;
use std::fmt;

use super::draft::{Draft, DraftPersistence};
use super::registry::{FieldId, FormStep, RegistryError, StepId, StepRegistry};
use super::schema::FormSchema;
use super::validation::{validate_step, FieldErrors, FormValues};
use crate::core::repository::{MutationResponse, RecordRepository, RepositoryError};
use crate::pricing::{compute_pricing, PricingResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    Editing,
    Submitting,
    Submitted { id: Option<String> },
    Failed,
    Cancelled,
}

impl WizardPhase {
    fn accepts_input(&self) -> bool {
        matches!(self, WizardPhase::Editing | WizardPhase::Failed)
    }
}

impl fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WizardPhase::Editing => "editing",
            WizardPhase::Submitting => "submitting",
            WizardPhase::Submitted { .. } => "submitted",
            WizardPhase::Failed => "failed",
            WizardPhase::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Whether a submission creates a new record or updates an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update { id: String },
}

impl SubmitMode {
    /// Storage key for this session's draft; edits are namespaced per record.
    pub fn draft_key(&self, form: &str) -> String {
        match self {
            SubmitMode::Create => format!("draft:{form}"),
            SubmitMode::Update { id } => format!("draft:{form}:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState<F: FieldId> {
    pub values: FormValues<F>,
    pub current_step: usize,
    pub is_dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTransition {
    Advanced { from: usize, to: usize },
    Retreated { from: usize, to: usize },
    /// Validation failed; the errors are attached to the orchestrator.
    Blocked { step: usize, errors: usize },
    AtBoundary,
    Ignored,
}

/// Validated record ready for the persistence collaborator.
#[derive(Debug, Clone)]
pub struct SubmitRequest<O> {
    pub mode: SubmitMode,
    pub record: O,
}

impl<O> SubmitRequest<O> {
    pub fn dispatch<R>(&self, repository: &R) -> Result<MutationResponse, RepositoryError>
    where
        R: RecordRepository<O> + ?Sized,
    {
        match &self.mode {
            SubmitMode::Create => repository.create(&self.record),
            SubmitMode::Update { id } => repository.update(id, &self.record),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SubmitStart<O> {
    Ready(SubmitRequest<O>),
    NotOnLastStep,
    Blocked { step: usize, errors: usize },
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted { id: Option<String>, message: String },
    Rejected { message: String },
    NotOnLastStep,
    Blocked { step: usize, errors: usize },
    Ignored,
}

/// One field as the UI should render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub key: &'static str,
    pub label: &'static str,
    pub value: Option<String>,
    pub error: Option<String>,
    pub required: bool,
    pub help: Option<&'static str>,
}

/// Snapshot exposed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardView {
    pub form: &'static str,
    pub values: BTreeMap<String, String>,
    pub field_errors: BTreeMap<String, String>,
    pub root_error: Option<String>,
    pub step_key: &'static str,
    pub step_title: &'static str,
    pub step_description: &'static str,
    pub step_index: usize,
    pub step_count: usize,
    pub fields: Vec<FieldView>,
    pub phase: String,
    /// Set only while a synchronous validation pass runs, so snapshots read `false`.
    pub is_validating: bool,
    pub is_submitting: bool,
    pub is_dirty: bool,
    pub can_go_next: bool,
    pub can_go_previous: bool,
    pub can_submit: bool,
    pub pricing: Option<PricingResult>,
}

pub struct FormOrchestrator<S: FormSchema> {
    schema: S,
    registry: StepRegistry<S::Step>,
    mode: SubmitMode,
    state: FormState<S::Field>,
    errors: FieldErrors<S::Field>,
    root_error: Option<String>,
    phase: WizardPhase,
    validating: bool,
    pricing: Option<PricingResult>,
    drafts: Option<DraftPersistence>,
}

impl<S: FormSchema> FormOrchestrator<S> {
    pub fn new(schema: S, mode: SubmitMode) -> Result<Self, RegistryError> {
        let registry = StepRegistry::new(schema.steps())?;
        let values = schema.defaults();
        let mut orchestrator = Self {
            schema,
            registry,
            mode,
            state: FormState {
                values,
                current_step: 0,
                is_dirty: false,
            },
            errors: FieldErrors::new(),
            root_error: None,
            phase: WizardPhase::Editing,
            validating: false,
            pricing: None,
            drafts: None,
        };
        orchestrator.refresh_pricing();
        Ok(orchestrator)
    }

    /// Attaches draft storage and hydrates from any usable stored draft.
    pub fn with_drafts(mut self, drafts: DraftPersistence) -> Self {
        if let Some(draft) = drafts.load_draft() {
            self.hydrate(draft);
        }
        self.drafts = Some(drafts);
        self
    }

    /// Restores values and step from a draft. Unknown keys are dropped; a
    /// draft pointing past the last step is discarded entirely. Refused once
    /// the form has left the editable phases.
    pub fn hydrate(&mut self, draft: Draft) -> bool {
        if !self.phase.accepts_input() {
            return false;
        }
        if draft.step_index >= self.registry.len() {
            tracing::warn!(
                form = self.schema.name(),
                step = draft.step_index,
                "discarding draft with out-of-range step"
            );
            return false;
        }
        let (restored, unknown) = FormValues::<S::Field>::from_keyed(&draft.values);
        if !unknown.is_empty() {
            tracing::debug!(form = self.schema.name(), ?unknown, "dropping unknown draft fields");
        }
        let mut values = self.schema.defaults();
        for (field, value) in restored.iter() {
            values.set(field, value);
        }
        self.state = FormState {
            values,
            current_step: draft.step_index,
            is_dirty: true,
        };
        self.errors = FieldErrors::new();
        self.refresh_pricing();
        tracing::info!(form = self.schema.name(), step = draft.step_index, "draft restored");
        true
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn registry(&self) -> &StepRegistry<S::Step> {
        &self.registry
    }

    pub fn mode(&self) -> &SubmitMode {
        &self.mode
    }

    pub fn state(&self) -> &FormState<S::Field> {
        &self.state
    }

    pub fn values(&self) -> &FormValues<S::Field> {
        &self.state.values
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn step(&self) -> Option<&FormStep<S::Step>> {
        self.registry.get(self.state.current_step)
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn errors(&self) -> &FieldErrors<S::Field> {
        &self.errors
    }

    pub fn root_error(&self) -> Option<&str> {
        self.root_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == WizardPhase::Submitting
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step == self.registry.last_index()
    }

    pub fn derived_pricing(&self) -> Option<&PricingResult> {
        self.pricing.as_ref()
    }

    pub fn drafts(&self) -> Option<&DraftPersistence> {
        self.drafts.as_ref()
    }

    /// Updates one value. Returns `false` when the form is not editable or
    /// the value did not change.
    pub fn set_field(&mut self, field: S::Field, value: impl Into<String>) -> bool {
        if !self.prepare_edit() {
            return false;
        }
        if !self.state.values.set(field, value) {
            return false;
        }
        self.after_edit(field);
        true
    }

    pub fn clear_field(&mut self, field: S::Field) -> bool {
        if !self.prepare_edit() {
            return false;
        }
        if !self.state.values.remove(field) {
            return false;
        }
        self.after_edit(field);
        true
    }

    pub fn next(&mut self) -> StepTransition {
        if !self.phase.accepts_input() {
            return StepTransition::Ignored;
        }
        if self.is_last_step() {
            return StepTransition::AtBoundary;
        }
        let from = self.state.current_step;
        if let Err(errors) = self.run_validation(from) {
            let count = errors.len();
            self.errors = errors;
            return StepTransition::Blocked {
                step: from,
                errors: count,
            };
        }
        self.errors = FieldErrors::new();
        self.move_to(from + 1);
        StepTransition::Advanced { from, to: from + 1 }
    }

    pub fn previous(&mut self) -> StepTransition {
        if !self.phase.accepts_input() {
            return StepTransition::Ignored;
        }
        let from = self.state.current_step;
        if from == 0 {
            return StepTransition::AtBoundary;
        }
        self.move_to(from - 1);
        StepTransition::Retreated { from, to: from - 1 }
    }

    /// Jumps back to an earlier step without validation. Forward jumps are
    /// refused so every step is validated on the way to submission.
    pub fn go_to(&mut self, index: usize) -> StepTransition {
        if !self.phase.accepts_input() || index >= self.state.current_step {
            return StepTransition::Ignored;
        }
        let from = self.state.current_step;
        self.move_to(index);
        StepTransition::Retreated { from, to: index }
    }

    /// Validates and commits the form. On success the phase becomes
    /// `Submitting` and the caller owns dispatching the request.
    pub fn begin_submit(&mut self) -> SubmitStart<S::Output> {
        if !self.phase.accepts_input() {
            tracing::debug!(form = self.schema.name(), phase = %self.phase, "submit ignored");
            return SubmitStart::Ignored;
        }
        if !self.is_last_step() {
            return SubmitStart::NotOnLastStep;
        }

        let last = self.registry.last_index();
        let mut order: Vec<usize> = vec![last];
        order.extend(0..last);
        for index in order {
            if let Err(errors) = self.run_validation(index) {
                return self.block_on(index, errors);
            }
        }

        let record = match self.schema.commit(&self.state.values) {
            Ok(record) => record,
            Err(errors) => {
                let step = errors
                    .fields()
                    .filter_map(|field| self.registry.owner_of(field))
                    .min()
                    .unwrap_or(last);
                return self.block_on(step, errors);
            }
        };

        self.errors = FieldErrors::new();
        self.root_error = None;
        self.phase = WizardPhase::Submitting;
        tracing::info!(form = self.schema.name(), mode = ?self.mode, "submitting form");
        SubmitStart::Ready(SubmitRequest {
            mode: self.mode.clone(),
            record,
        })
    }

    /// Records the persistence outcome of a request from [`begin_submit`].
    ///
    /// [`begin_submit`]: FormOrchestrator::begin_submit
    pub fn complete_submit(
        &mut self,
        result: Result<MutationResponse, RepositoryError>,
    ) -> SubmitOutcome {
        match self.phase {
            WizardPhase::Submitting => {}
            WizardPhase::Cancelled => {
                if matches!(&result, Ok(response) if response.success) {
                    self.clear_draft();
                }
                tracing::debug!(form = self.schema.name(), "late submit completion ignored");
                return SubmitOutcome::Ignored;
            }
            _ => return SubmitOutcome::Ignored,
        }

        match result {
            Ok(response) if response.success => {
                tracing::info!(form = self.schema.name(), id = ?response.id, "form submitted");
                self.clear_draft();
                self.state.is_dirty = false;
                self.phase = WizardPhase::Submitted {
                    id: response.id.clone(),
                };
                SubmitOutcome::Submitted {
                    id: response.id,
                    message: response.message,
                }
            }
            Ok(response) => {
                tracing::info!(form = self.schema.name(), message = %response.message, "submission rejected");
                self.fail_with(response.message)
            }
            Err(err) => {
                tracing::warn!(form = self.schema.name(), error = %err, "submission failed");
                self.fail_with(err.to_string())
            }
        }
    }

    /// Runs the whole submit cycle against `repository`.
    pub fn submit<R>(&mut self, repository: &R) -> SubmitOutcome
    where
        R: RecordRepository<S::Output> + ?Sized,
    {
        match self.begin_submit() {
            SubmitStart::Ready(request) => {
                let result = request.dispatch(repository);
                self.complete_submit(result)
            }
            SubmitStart::NotOnLastStep => SubmitOutcome::NotOnLastStep,
            SubmitStart::Blocked { step, errors } => SubmitOutcome::Blocked { step, errors },
            SubmitStart::Ignored => SubmitOutcome::Ignored,
        }
    }

    /// Discards the session and its draft. Returns `false` once submitted.
    pub fn cancel(&mut self) -> bool {
        match self.phase {
            WizardPhase::Submitted { .. } | WizardPhase::Cancelled => return false,
            WizardPhase::Submitting => {
                tracing::info!(form = self.schema.name(), "cancelled while submitting");
            }
            _ => tracing::info!(form = self.schema.name(), "form cancelled"),
        }
        self.clear_draft();
        self.state = FormState {
            values: self.schema.defaults(),
            current_step: 0,
            is_dirty: false,
        };
        self.errors = FieldErrors::new();
        self.root_error = None;
        self.phase = WizardPhase::Cancelled;
        self.refresh_pricing();
        true
    }

    /// Drives the draft debounce timer. Returns whether a save was attempted.
    pub fn tick(&mut self) -> bool {
        self.drafts.as_mut().map(|drafts| drafts.tick()).unwrap_or(false)
    }

    pub fn flush_draft(&mut self) -> bool {
        self.drafts.as_mut().map(|drafts| drafts.flush()).unwrap_or(false)
    }

    pub fn clear_draft(&mut self) {
        if let Some(drafts) = self.drafts.as_mut() {
            drafts.clear_draft();
        }
    }

    pub fn view(&self) -> WizardView {
        let index = self.state.current_step;
        let step = self.registry.get(index);
        let fields = self
            .registry
            .fields_of(index)
            .iter()
            .map(|field| {
                let descriptor = self.schema.describe(*field);
                FieldView {
                    key: field.key(),
                    label: descriptor.label,
                    value: self.state.values.raw(*field).map(str::to_string),
                    error: self.errors.get(*field).map(str::to_string),
                    required: descriptor.required,
                    help: descriptor.help,
                }
            })
            .collect();
        let editable = self.phase.accepts_input();

        WizardView {
            form: self.schema.name(),
            values: self.state.values.to_keyed(),
            field_errors: self.errors.to_keyed(),
            root_error: self.root_error.clone(),
            step_key: step.map(|s| s.id.key()).unwrap_or_default(),
            step_title: step.map(|s| s.title).unwrap_or_default(),
            step_description: step.map(|s| s.description).unwrap_or_default(),
            step_index: index,
            step_count: self.registry.len(),
            fields,
            phase: self.phase.to_string(),
            is_validating: self.validating,
            is_submitting: self.is_submitting(),
            is_dirty: self.state.is_dirty,
            can_go_next: editable && !self.is_last_step(),
            can_go_previous: editable && index > 0,
            can_submit: editable && self.is_last_step(),
            pricing: self.pricing.clone(),
        }
    }

    fn prepare_edit(&mut self) -> bool {
        match self.phase {
            WizardPhase::Editing => true,
            WizardPhase::Failed => {
                self.phase = WizardPhase::Editing;
                self.root_error = None;
                true
            }
            _ => false,
        }
    }

    fn after_edit(&mut self, field: S::Field) {
        self.state.is_dirty = true;
        self.errors.remove(field);
        self.refresh_pricing();
        self.schedule_draft();
    }

    fn move_to(&mut self, index: usize) {
        tracing::debug!(form = self.schema.name(), from = self.state.current_step, to = index, "step changed");
        self.state.current_step = index;
        if self.phase == WizardPhase::Failed {
            self.phase = WizardPhase::Editing;
            self.root_error = None;
        }
        self.schedule_draft();
    }

    fn run_validation(&mut self, index: usize) -> Result<(), FieldErrors<S::Field>> {
        self.validating = true;
        let result = validate_step(&self.schema, &self.registry, &self.state.values, index);
        self.validating = false;
        result
    }

    fn block_on(&mut self, step: usize, errors: FieldErrors<S::Field>) -> SubmitStart<S::Output> {
        let count = errors.len();
        if step != self.state.current_step {
            self.move_to(step);
        }
        self.errors = errors;
        SubmitStart::Blocked {
            step,
            errors: count,
        }
    }

    fn fail_with(&mut self, message: String) -> SubmitOutcome {
        self.phase = WizardPhase::Failed;
        self.root_error = Some(message.clone());
        SubmitOutcome::Rejected { message }
    }

    fn schedule_draft(&mut self) {
        if let Some(drafts) = self.drafts.as_mut() {
            drafts.save_draft(self.state.values.to_keyed(), self.state.current_step);
        }
    }

    fn refresh_pricing(&mut self) {
        self.pricing = self
            .schema
            .pricing_input(&self.state.values)
            .and_then(|input| compute_pricing(&input).ok());
    }
}

impl<S: FormSchema> fmt::Debug for FormOrchestrator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormOrchestrator")
            .field("form", &self.schema.name())
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("current_step", &self.state.current_step)
            .field("is_dirty", &self.state.is_dirty)
            .finish()
    }
}
