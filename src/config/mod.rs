use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::BillingUnit;
use crate::errors::PropertyError;
use crate::forms::draft::DEFAULT_DEBOUNCE_MS;
use crate::storage::json_backend::save_text_atomic;
use crate::utils::{app_data_dir, config_file_in};

const MAX_DEBOUNCE_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for PropertyError {
    fn from(err: ConfigError) -> Self {
        PropertyError::Config(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    /// Idle window before a draft is written.
    pub draft_debounce_ms: u64,
    pub default_billing_unit: BillingUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub ui_color_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "EUR".into(),
            draft_debounce_ms: DEFAULT_DEBOUNCE_MS as u64,
            default_billing_unit: BillingUnit::Night,
            data_dir: None,
            ui_color_enabled: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currency.trim().len() != 3 {
            return Err(ConfigError::Invalid(format!(
                "currency `{}` must be a three-letter code",
                self.currency
            )));
        }
        if self.draft_debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Invalid(format!(
                "draft_debounce_ms cannot exceed {}",
                MAX_DEBOUNCE_MS
            )));
        }
        Ok(())
    }

    pub fn draft_debounce(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.draft_debounce_ms as i64)
    }

    /// Data directory for catalog and drafts, falling back to `base`.
    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| base.to_path_buf())
    }
}

/// Loads and saves `config.json` under the application directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: config_file_in(&base),
            base,
        })
    }

    /// Reads the stored configuration or the defaults when none exists.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let config: Config = match fs::read_to_string(&self.path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Config::default(),
            Err(err) => return Err(err.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        save_text_atomic(&self.path, &json)?;
        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
