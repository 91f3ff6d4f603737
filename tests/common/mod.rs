#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use property_core::core::repository::{MutationResponse, RecordRepository, RepositoryError};
use property_core::core::ManualClock;
use property_core::domain::{Address, BillingUnit, Fee, PricingEntry, Property, PropertyKind};
use property_core::storage::MemoryStore;
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the calling test.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_time()))
}

pub fn memory_drafts() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub fn amount(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Two-bedroom flat: 120/night (2 to 30 nights), 700/week, 40 cleaning fee.
pub fn harbour_loft() -> Property {
    Property::new(
        "Harbour Loft",
        PropertyKind::Apartment,
        Address::new("1 Quay St", "Lisbon", "1100-001", "PT"),
    )
    .with_capacity(2, 4)
    .with_rate(
        BillingUnit::Night,
        PricingEntry::new(amount(120)).with_limits(Some(2), Some(30)),
    )
    .with_rate(BillingUnit::Week, PricingEntry::new(amount(700)))
    .with_fee(Fee::new("Cleaning fee", amount(40)))
}

/// Repository double that counts calls and answers with a fixed result.
pub struct ScriptedRepository {
    calls: AtomicUsize,
    answer: fn() -> Result<MutationResponse, RepositoryError>,
}

impl ScriptedRepository {
    pub fn accepting() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            answer: || Ok(MutationResponse::ok("Saved", Some("rec-1".into()))),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            answer: || Ok(MutationResponse::rejected("Property `Harbour Loft` already exists")),
        }
    }

    pub fn offline() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            answer: || Err(RepositoryError::Unavailable("connection refused".into())),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T> RecordRepository<T> for ScriptedRepository {
    fn create(&self, _record: &T) -> Result<MutationResponse, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.answer)()
    }

    fn update(&self, _id: &str, _record: &T) -> Result<MutationResponse, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.answer)()
    }
}
