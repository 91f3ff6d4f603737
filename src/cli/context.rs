use std::path::PathBuf;
use std::sync::Arc;

use dialoguer::{theme::ColorfulTheme, Confirm};
use strsim::levenshtein;

use crate::config::{Config, ConfigManager};
use crate::core::catalog::Catalog;
use crate::core::time::{Clock, SystemClock};
use crate::forms::{DraftPersistence, FormOrchestrator, FormSchema, SubmitMode};
use crate::storage::{JsonFileStore, KeyValueStore};
use crate::utils::drafts_dir_in;

use super::errors::{CliError, CommandError, CommandResult};
use super::output::{self, OutputPreferences};
use super::registry::{CommandEntry, CommandRegistry};
use super::session::WizardSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub data_dir: PathBuf,
    pub catalog: Catalog,
    pub drafts: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub wizard: Option<Box<dyn WizardSession>>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        Self::with_config_manager(mode, config_manager)
    }

    pub fn with_config_manager(mode: CliMode, config_manager: ConfigManager) -> Result<Self, CliError> {
        let config = config_manager.load()?;
        output::set_preferences(OutputPreferences {
            color: config.ui_color_enabled && mode == CliMode::Interactive,
            quiet: false,
        });

        let data_dir = config.resolve_data_dir(config_manager.base_dir());
        let catalog = Catalog::open_in(&data_dir)?;
        let drafts = JsonFileStore::new(drafts_dir_in(&data_dir)).map_err(crate::errors::PropertyError::from)?;

        let mut registry = CommandRegistry::new();
        super::commands::register_all(&mut registry);

        tracing::debug!(data_dir = %data_dir.display(), ?mode, "shell context ready");
        Ok(Self {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            data_dir,
            catalog,
            drafts: Arc::new(drafts),
            clock: Arc::new(SystemClock),
            wizard: None,
            last_command: None,
            running: true,
        })
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    /// Field keys of the open form, empty when none is open.
    pub fn field_keys(&self) -> Vec<&'static str> {
        self.wizard
            .as_ref()
            .map(|wizard| wizard.field_keys())
            .unwrap_or_default()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub fn prompt(&self) -> String {
        match &self.wizard {
            Some(wizard) => {
                let view = wizard.view();
                format!(
                    "property-core [{} {}/{}]> ",
                    view.form,
                    view.step_index + 1,
                    view.step_count
                )
            }
            None => "property-core> ".to_string(),
        }
    }

    pub(crate) fn ensure_no_wizard(&self) -> CommandResult {
        match &self.wizard {
            Some(active) => Err(CommandError::Message(format!(
                "A {} form is already open. Use `submit` or `cancel` first.",
                active.form_name()
            ))),
            None => Ok(()),
        }
    }

    /// Builds a draft-backed session for `schema`, restoring any draft saved under `key`.
    pub(crate) fn open_wizard<S>(&mut self, schema: S, mode: SubmitMode, key: String) -> CommandResult
    where
        S: FormSchema + 'static,
        FormOrchestrator<S>: WizardSession,
    {
        self.ensure_no_wizard()?;
        let form = schema.name();
        let drafts = self.draft_persistence(form, key);
        let orchestrator = FormOrchestrator::new(schema, mode)
            .map_err(crate::errors::PropertyError::from)?
            .with_drafts(drafts);
        if orchestrator.state().is_dirty {
            output::info(format!(
                "Restored your unfinished {} form (step {}).",
                form,
                orchestrator.current_step() + 1
            ));
        }
        self.wizard = Some(Box::new(orchestrator));
        Ok(())
    }

    pub(crate) fn draft_persistence(&self, form: &str, key: String) -> DraftPersistence {
        DraftPersistence::new(form, key, self.drafts.clone(), self.clock.clone())
            .with_window(self.config.draft_debounce())
    }

    pub(crate) fn wizard_mut(&mut self) -> Result<&mut Box<dyn WizardSession>, CommandError> {
        self.wizard.as_mut().ok_or(CommandError::NoActiveForm)
    }

    pub(crate) fn wizard_ref(&self) -> Result<&dyn WizardSession, CommandError> {
        self.wizard.as_deref().ok_or(CommandError::NoActiveForm)
    }

    /// Lets an elapsed debounce window write the draft.
    pub(crate) fn pump_drafts(&mut self) {
        if let Some(wizard) = self.wizard.as_mut() {
            wizard.tick();
        }
    }

    /// Writes any pending draft before the shell exits.
    pub(crate) fn shutdown(&mut self) {
        if let Some(wizard) = self.wizard.as_mut() {
            if wizard.flush_draft() {
                output::info("Saved your unfinished form; it will be restored next time.");
            }
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let result = match self.registry.handler(command) {
            Some(handler) => match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            },
            None => {
                self.suggest_command(raw);
                Ok(LoopControl::Continue)
            }
        };
        self.pump_drafts();
        result
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let lowered = input.to_lowercase();
        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &lowered), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()
            .map_err(|err| CliError::Command(err.to_string()))
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            other => {
                output::error(other);
                Ok(())
            }
        }
    }
}
