use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Booking, Property};

/// Result of a create/update call. `success == false` is a business
/// rejection the user can fix; transport failures are `Err` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MutationResponse {
    pub fn ok(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            id: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        RepositoryError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Storage(err.to_string())
    }
}

/// External create/update collaborator invoked at the end of a wizard.
pub trait RecordRepository<T>: Send + Sync {
    fn create(&self, record: &T) -> Result<MutationResponse, RepositoryError>;
    fn update(&self, id: &str, record: &T) -> Result<MutationResponse, RepositoryError>;
}

pub trait PropertyRepository: RecordRepository<Property> {
    fn properties(&self) -> Result<Vec<Property>, RepositoryError>;
    fn property(&self, id: Uuid) -> Result<Option<Property>, RepositoryError>;
}

pub trait BookingRepository: RecordRepository<Booking> {
    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError>;
    fn bookings_for(&self, property_id: Uuid) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self
            .bookings()?
            .into_iter()
            .filter(|booking| booking.property_id == property_id)
            .collect())
    }
}

/// Parses a record id passed as a string.
pub fn parse_record_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}
