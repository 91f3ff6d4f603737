//! Type-erased handle over whichever wizard the shell is running.

use crate::core::catalog::Catalog;
use crate::core::repository::RecordRepository;
use crate::forms::{
    FieldId, FormOrchestrator, FormSchema, StepTransition, SubmitOutcome, WizardView,
};

use super::errors::CommandError;

pub trait WizardSession {
    fn form_name(&self) -> &'static str;
    fn draft_key(&self) -> Option<String>;
    fn field_keys(&self) -> Vec<&'static str>;
    fn set(&mut self, key: &str, value: &str) -> Result<bool, CommandError>;
    fn clear(&mut self, key: &str) -> Result<bool, CommandError>;
    fn next(&mut self) -> StepTransition;
    fn previous(&mut self) -> StepTransition;
    fn go_to(&mut self, index: usize) -> StepTransition;
    fn submit(&mut self, catalog: &Catalog) -> SubmitOutcome;
    fn cancel(&mut self) -> bool;
    fn tick(&mut self) -> bool;
    fn flush_draft(&mut self) -> bool;
    fn clear_draft(&mut self);
    fn view(&self) -> WizardView;
}

impl<S> WizardSession for FormOrchestrator<S>
where
    S: FormSchema,
    Catalog: RecordRepository<S::Output>,
{
    fn form_name(&self) -> &'static str {
        self.schema().name()
    }

    fn draft_key(&self) -> Option<String> {
        self.drafts().map(|drafts| drafts.key().to_string())
    }

    fn field_keys(&self) -> Vec<&'static str> {
        S::Field::all().iter().map(|field| field.key()).collect()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<bool, CommandError> {
        let field = resolve_field::<S::Field>(key)?;
        Ok(self.set_field(field, value))
    }

    fn clear(&mut self, key: &str) -> Result<bool, CommandError> {
        let field = resolve_field::<S::Field>(key)?;
        Ok(self.clear_field(field))
    }

    fn next(&mut self) -> StepTransition {
        FormOrchestrator::next(self)
    }

    fn previous(&mut self) -> StepTransition {
        FormOrchestrator::previous(self)
    }

    fn go_to(&mut self, index: usize) -> StepTransition {
        FormOrchestrator::go_to(self, index)
    }

    fn submit(&mut self, catalog: &Catalog) -> SubmitOutcome {
        FormOrchestrator::submit(self, catalog)
    }

    fn cancel(&mut self) -> bool {
        FormOrchestrator::cancel(self)
    }

    fn tick(&mut self) -> bool {
        FormOrchestrator::tick(self)
    }

    fn flush_draft(&mut self) -> bool {
        FormOrchestrator::flush_draft(self)
    }

    fn clear_draft(&mut self) {
        FormOrchestrator::clear_draft(self)
    }

    fn view(&self) -> WizardView {
        FormOrchestrator::view(self)
    }
}

fn resolve_field<F: FieldId>(key: &str) -> Result<F, CommandError> {
    F::from_key(key).ok_or_else(|| {
        let mut ranked: Vec<(usize, &str)> = F::all()
            .iter()
            .map(|field| (strsim::levenshtein(&key.to_lowercase(), field.key()), field.key()))
            .collect();
        ranked.sort_by_key(|(distance, _)| *distance);
        let hint = match ranked.first() {
            Some((distance, best)) if *distance <= 3 => format!(" Did you mean `{}`?", best),
            _ => String::new(),
        };
        CommandError::InvalidArguments(format!("Unknown field `{}`.{}", key, hint))
    })
}
