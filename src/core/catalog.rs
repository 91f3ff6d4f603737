//! JSON-file-backed catalog of properties and bookings.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repository::{
    parse_record_id, BookingRepository, MutationResponse, PropertyRepository, RecordRepository,
    RepositoryError,
};
use crate::domain::{Booking, NamedEntity, Property};
use crate::errors::{PropertyError, Result};
use crate::storage::json_backend::save_text_atomic;

pub const CATALOG_FILE: &str = "catalog.json";
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

impl Default for CatalogData {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            properties: Vec::new(),
            bookings: Vec::new(),
        }
    }
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl CatalogData {
    pub fn property(&self, id: Uuid) -> Option<&Property> {
        self.properties.iter().find(|property| property.id == id)
    }

    fn property_mut(&mut self, id: Uuid) -> Option<&mut Property> {
        self.properties.iter_mut().find(|property| property.id == id)
    }

    fn name_taken(&self, candidate: &str, exclude: Option<Uuid>) -> bool {
        let normalized = candidate.trim().to_lowercase();
        self.properties.iter().any(|property| {
            property.name().trim().to_lowercase() == normalized
                && exclude.map_or(true, |id| property.id != id)
        })
    }

    fn booking_conflict(&self, booking: &Booking, exclude: Option<Uuid>) -> Option<&Booking> {
        if !booking.blocks_calendar() {
            return None;
        }
        self.bookings.iter().find(|existing| {
            existing.property_id == booking.property_id
                && existing.blocks_calendar()
                && exclude.map_or(true, |id| existing.id != id)
                && existing.overlaps(booking.check_in, booking.check_out)
        })
    }

    fn check_booking(&self, booking: &Booking, exclude: Option<Uuid>) -> Option<String> {
        let property = match self.property(booking.property_id) {
            Some(property) => property,
            None => return Some("Property not found".into()),
        };
        if booking.check_out <= booking.check_in {
            return Some("Check-out must be after check-in".into());
        }
        if booking.guests > property.max_guests {
            return Some(format!(
                "`{}` hosts at most {} guests",
                property.name, property.max_guests
            ));
        }
        self.booking_conflict(booking, exclude).map(|conflict| {
            format!(
                "`{}` is already booked from {} to {}",
                property.name,
                conflict.check_in.format("%Y-%m-%d"),
                conflict.check_out.format("%Y-%m-%d")
            )
        })
    }
}

/// Catalog persisted as one JSON document. Every successful mutation is
/// written atomically before it becomes visible to readers.
#[derive(Debug)]
pub struct Catalog {
    path: Option<PathBuf>,
    data: Mutex<CatalogData>,
}

impl Catalog {
    /// Opens the catalog at `path`, starting empty when the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == ErrorKind::NotFound => CatalogData::default(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), "catalog opened");
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    /// Opens `catalog.json` inside `dir`.
    pub fn open_in(dir: &Path) -> Result<Self> {
        Self::open(dir.join(CATALOG_FILE))
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(CatalogData::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> std::result::Result<CatalogData, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    /// Resolves a property by full id, id prefix, or case-insensitive name.
    pub fn find_property(&self, query: &str) -> Result<Property> {
        let data = self
            .lock()
            .map_err(|err| PropertyError::Storage(err.to_string()))?;
        let query = query.trim();
        if let Some(id) = parse_record_id(query) {
            if let Some(property) = data.property(id) {
                return Ok(property.clone());
            }
        }
        let lowered = query.to_lowercase();
        let by_name = data
            .properties
            .iter()
            .find(|property| property.name.to_lowercase() == lowered);
        if let Some(property) = by_name {
            return Ok(property.clone());
        }
        let by_prefix: Vec<&Property> = if lowered.len() >= 4 {
            data.properties
                .iter()
                .filter(|property| property.id.to_string().starts_with(&lowered))
                .collect()
        } else {
            Vec::new()
        };
        match by_prefix.as_slice() {
            [single] => Ok((*single).clone()),
            [] => Err(PropertyError::NotFound(format!("property `{}`", query))),
            _ => Err(PropertyError::InvalidInput(format!(
                "`{}` matches several properties",
                query
            ))),
        }
    }

    pub fn booking(&self, id: Uuid) -> std::result::Result<Option<Booking>, RepositoryError> {
        Ok(self
            .lock()?
            .bookings
            .iter()
            .find(|booking| booking.id == id)
            .cloned())
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, CatalogData>, RepositoryError> {
        self.data
            .lock()
            .map_err(|_| RepositoryError::Unavailable("catalog lock poisoned".into()))
    }

    fn mutate<F>(&self, apply: F) -> std::result::Result<MutationResponse, RepositoryError>
    where
        F: FnOnce(&mut CatalogData) -> MutationResponse,
    {
        let mut data = self.lock()?;
        let mut next = data.clone();
        let response = apply(&mut next);
        if !response.success {
            return Ok(response);
        }
        self.persist(&next)?;
        *data = next;
        Ok(response)
    }

    fn persist(&self, data: &CatalogData) -> std::result::Result<(), RepositoryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(data)?;
        save_text_atomic(path, &json)?;
        tracing::debug!(path = %path.display(), "catalog saved");
        Ok(())
    }
}

impl RecordRepository<Property> for Catalog {
    fn create(&self, record: &Property) -> std::result::Result<MutationResponse, RepositoryError> {
        self.mutate(|data| {
            if data.name_taken(&record.name, None) {
                return MutationResponse::rejected(format!(
                    "Property `{}` already exists",
                    record.name
                ));
            }
            let mut property = record.clone();
            if data.property(property.id).is_some() {
                property.id = Uuid::new_v4();
            }
            let id = property.id.to_string();
            data.properties.push(property);
            MutationResponse::ok(format!("Property `{}` created", record.name), Some(id))
        })
    }

    fn update(
        &self,
        id: &str,
        record: &Property,
    ) -> std::result::Result<MutationResponse, RepositoryError> {
        let Some(uuid) = parse_record_id(id) else {
            return Ok(MutationResponse::rejected("Property not found"));
        };
        self.mutate(|data| {
            if data.name_taken(&record.name, Some(uuid)) {
                return MutationResponse::rejected(format!(
                    "Property `{}` already exists",
                    record.name
                ));
            }
            let Some(existing) = data.property_mut(uuid) else {
                return MutationResponse::rejected("Property not found");
            };
            let created_at = existing.created_at;
            *existing = record.clone();
            existing.id = uuid;
            existing.created_at = created_at;
            existing.updated_at = Utc::now();
            MutationResponse::ok(
                format!("Property `{}` updated", record.name),
                Some(uuid.to_string()),
            )
        })
    }
}

impl RecordRepository<Booking> for Catalog {
    fn create(&self, record: &Booking) -> std::result::Result<MutationResponse, RepositoryError> {
        self.mutate(|data| {
            if let Some(reason) = data.check_booking(record, None) {
                return MutationResponse::rejected(reason);
            }
            let mut booking = record.clone();
            if data.bookings.iter().any(|existing| existing.id == booking.id) {
                booking.id = Uuid::new_v4();
            }
            let id = booking.id.to_string();
            data.bookings.push(booking);
            MutationResponse::ok(format!("Booking for {} created", record.guest.name), Some(id))
        })
    }

    fn update(
        &self,
        id: &str,
        record: &Booking,
    ) -> std::result::Result<MutationResponse, RepositoryError> {
        let Some(uuid) = parse_record_id(id) else {
            return Ok(MutationResponse::rejected("Booking not found"));
        };
        self.mutate(|data| {
            if let Some(reason) = data.check_booking(record, Some(uuid)) {
                return MutationResponse::rejected(reason);
            }
            let Some(existing) = data.bookings.iter_mut().find(|b| b.id == uuid) else {
                return MutationResponse::rejected("Booking not found");
            };
            let created_at = existing.created_at;
            *existing = record.clone();
            existing.id = uuid;
            existing.created_at = created_at;
            MutationResponse::ok(
                format!("Booking for {} updated", record.guest.name),
                Some(uuid.to_string()),
            )
        })
    }
}

impl PropertyRepository for Catalog {
    fn properties(&self) -> std::result::Result<Vec<Property>, RepositoryError> {
        Ok(self.lock()?.properties.clone())
    }

    fn property(&self, id: Uuid) -> std::result::Result<Option<Property>, RepositoryError> {
        Ok(self.lock()?.property(id).cloned())
    }
}

impl BookingRepository for Catalog {
    fn bookings(&self) -> std::result::Result<Vec<Booking>, RepositoryError> {
        Ok(self.lock()?.bookings.clone())
    }
}
