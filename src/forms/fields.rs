//! Declarative field descriptions and the built-in validators.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use super::registry::FieldId;

/// Largest rate or fee a form accepts; keeps every computed price inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Supported data kinds for form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    DateTime,
    Choice(Vec<String>),
}

type ValidatorCallback = dyn Fn(&str) -> Result<(), String> + Send + Sync;

/// Built-in validation helpers applied to non-empty raw input.
#[derive(Clone)]
pub enum Validator {
    None,
    NonEmpty,
    PositiveInteger,
    NonNegativeDecimal,
    DateTime,
    Email,
    MaxLength(usize),
    OneOf(Vec<String>),
    Custom(Arc<ValidatorCallback>),
}

impl Validator {
    pub fn custom(check: impl Fn(&str) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Validator::Custom(Arc::new(check))
    }

    pub fn validate(&self, input: &str) -> Result<(), ValidationError> {
        let trimmed = input.trim();
        match self {
            Validator::None => Ok(()),
            Validator::NonEmpty => {
                if trimmed.is_empty() {
                    Err(ValidationError::new("Value cannot be empty"))
                } else {
                    Ok(())
                }
            }
            Validator::PositiveInteger => match trimmed.parse::<u32>() {
                Ok(0) => Err(ValidationError::new("Value must be at least 1")),
                Ok(_) => Ok(()),
                Err(_) => Err(ValidationError::new("Enter a whole number (1 or greater)")),
            },
            Validator::NonNegativeDecimal => match parse_amount(trimmed) {
                Some(value) if value.is_sign_negative() && !value.is_zero() => {
                    Err(ValidationError::new("Amount must be zero or positive"))
                }
                Some(value) if value > MAX_AMOUNT => Err(ValidationError::new(format!(
                    "Amount cannot exceed {}",
                    MAX_AMOUNT
                ))),
                Some(_) => Ok(()),
                None => Err(ValidationError::new("Enter a numeric amount (e.g., 120.50)")),
            },
            Validator::DateTime => parse_datetime(trimmed)
                .map(|_| ())
                .ok_or_else(|| ValidationError::new("Use YYYY-MM-DD or YYYY-MM-DDTHH:MM format")),
            Validator::Email => {
                let valid = trimmed
                    .split_once('@')
                    .map(|(local, domain)| {
                        !local.is_empty()
                            && domain.contains('.')
                            && !domain.starts_with('.')
                            && !domain.ends_with('.')
                    })
                    .unwrap_or(false);
                if valid && !trimmed.contains(char::is_whitespace) {
                    Ok(())
                } else {
                    Err(ValidationError::new("Enter a valid email address"))
                }
            }
            Validator::MaxLength(max_len) => {
                let len = trimmed.chars().count();
                if len > *max_len {
                    Err(ValidationError::new(format!(
                        "Cannot exceed {} characters (got {})",
                        max_len, len
                    )))
                } else {
                    Ok(())
                }
            }
            Validator::OneOf(options) => {
                if resolve_choice(options, trimmed).is_some() {
                    Ok(())
                } else {
                    Err(ValidationError::new(format!(
                        "Value must be one of: {}",
                        options.join(", ")
                    )))
                }
            }
            Validator::Custom(func) => func(trimmed).map_err(ValidationError::new),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::None => f.write_str("None"),
            Validator::NonEmpty => f.write_str("NonEmpty"),
            Validator::PositiveInteger => f.write_str("PositiveInteger"),
            Validator::NonNegativeDecimal => f.write_str("NonNegativeDecimal"),
            Validator::DateTime => f.write_str("DateTime"),
            Validator::Email => f.write_str("Email"),
            Validator::MaxLength(len) => write!(f, "MaxLength({len})"),
            Validator::OneOf(options) => write!(f, "OneOf({options:?})"),
            Validator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Declarative description of a single form field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor<F: FieldId> {
    pub id: F,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub help: Option<&'static str>,
    pub validator: Validator,
}

impl<F: FieldId> FieldDescriptor<F> {
    pub fn new(id: F, label: &'static str, kind: FieldKind, validator: Validator) -> Self {
        Self {
            id,
            label,
            kind,
            required: true,
            help: None,
            validator,
        }
    }

    pub fn with_optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    /// Choice field whose validator accepts any option, case-insensitively.
    pub fn choice(id: F, label: &'static str, options: Vec<String>) -> Self {
        let validator = Validator::OneOf(options.clone());
        Self::new(id, label, FieldKind::Choice(options), validator)
    }
}

/// Matches `input` against `options` ignoring case, returning the canonical option.
pub fn resolve_choice<'a>(options: &'a [String], input: &str) -> Option<&'a str> {
    let normalized = input.trim().to_lowercase();
    options
        .iter()
        .find(|candidate| candidate.to_lowercase() == normalized)
        .map(String::as_str)
}

/// Parses a stay instant: either `YYYY-MM-DD` (midnight) or a date with time.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(value);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn parse_amount(input: &str) -> Option<Decimal> {
    input.trim().parse::<Decimal>().ok()
}

pub fn parse_count(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok()
}

/// Renders a decimal without trailing zeros (e.g. `120.5`, `3500`).
pub fn format_amount(value: Decimal) -> String {
    value.normalize().to_string()
}
