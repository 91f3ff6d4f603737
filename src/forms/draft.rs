//! Debounced, best-effort persistence of in-progress form values.
//!
//! Saves are coalesced: each request replaces the pending one and pushes its
//! deadline out by the debounce window. Nothing is written until [`tick`]
//! observes an elapsed deadline or [`flush`] forces it. Storage failures are
//! logged and swallowed so the wizard keeps working without a draft.
//!
//! [`tick`]: DraftPersistence::tick
//! [`flush`]: DraftPersistence::flush

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::time::Clock;
use crate::storage::KeyValueStore;

pub const DEFAULT_DEBOUNCE_MS: i64 = 500;
const DRAFT_VERSION: u32 = 1;

/// Snapshot of raw values and the step the user was on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub values: BTreeMap<String, String>,
    pub step_index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct DraftEnvelope {
    version: u32,
    form: String,
    step_index: usize,
    values: BTreeMap<String, String>,
    saved_at: DateTime<Utc>,
}

/// Handle for a scheduled save. A newer schedule supersedes older handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTimer {
    pub due_at: DateTime<Utc>,
    generation: u64,
}

#[derive(Debug)]
struct PendingSave {
    timer: DebounceTimer,
    draft: Draft,
}

pub struct DraftPersistence {
    form: String,
    key: String,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
    pending: Option<PendingSave>,
    generation: u64,
}

impl DraftPersistence {
    pub fn new(
        form: impl Into<String>,
        key: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            form: form.into(),
            key: key.into(),
            store,
            clock,
            window: Duration::milliseconds(DEFAULT_DEBOUNCE_MS),
            pending: None,
            generation: 0,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedules a save, replacing any pending one and restarting the window.
    pub fn save_draft(&mut self, values: BTreeMap<String, String>, step_index: usize) -> DebounceTimer {
        self.generation += 1;
        let timer = DebounceTimer {
            due_at: self.clock.now() + self.window,
            generation: self.generation,
        };
        self.pending = Some(PendingSave {
            timer,
            draft: Draft { values, step_index },
        });
        timer
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether `timer` is still the one that will fire.
    pub fn is_current(&self, timer: &DebounceTimer) -> bool {
        self.pending
            .as_ref()
            .map(|pending| pending.timer.generation == timer.generation)
            .unwrap_or(false)
    }

    /// Writes the pending draft if its window has elapsed. Returns whether a
    /// write was attempted.
    pub fn tick(&mut self) -> bool {
        let due = self
            .pending
            .as_ref()
            .map(|pending| self.clock.now() >= pending.timer.due_at)
            .unwrap_or(false);
        if due {
            self.flush()
        } else {
            false
        }
    }

    /// Writes the pending draft immediately, regardless of the window.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                self.write(&pending.draft);
                true
            }
            None => false,
        }
    }

    pub fn cancel_pending(&mut self) {
        if self.pending.take().is_some() {
            tracing::debug!(key = %self.key, "pending draft save cancelled");
        }
    }

    /// Loads the stored draft; unreadable or foreign drafts read as absent.
    pub fn load_draft(&self) -> Option<Draft> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "failed to read draft");
                return None;
            }
        };
        let envelope: DraftEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "ignoring unreadable draft");
                return None;
            }
        };
        if envelope.version != DRAFT_VERSION || envelope.form != self.form {
            tracing::warn!(
                key = %self.key,
                version = envelope.version,
                form = %envelope.form,
                "ignoring draft written for a different form"
            );
            return None;
        }
        Some(Draft {
            values: envelope.values,
            step_index: envelope.step_index,
        })
    }

    /// Cancels any pending save and removes the stored draft.
    pub fn clear_draft(&mut self) {
        self.cancel_pending();
        if let Err(err) = self.store.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %err, "failed to clear draft");
        }
    }

    fn write(&self, draft: &Draft) {
        let envelope = DraftEnvelope {
            version: DRAFT_VERSION,
            form: self.form.clone(),
            step_index: draft.step_index,
            values: draft.values.clone(),
            saved_at: self.clock.now(),
        };
        let result = serde_json::to_string(&envelope)
            .map_err(crate::errors::StorageError::from)
            .and_then(|json| self.store.set(&self.key, &json));
        match result {
            Ok(()) => tracing::debug!(key = %self.key, step = draft.step_index, "draft saved"),
            Err(err) => tracing::warn!(key = %self.key, error = %err, "failed to save draft"),
        }
    }
}

impl Drop for DraftPersistence {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::ManualClock;
    use crate::storage::MemoryStore;

    fn setup() -> (DraftPersistence, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let drafts = DraftPersistence::new("property", "draft:property", store.clone(), clock.clone());
        (drafts, store, clock)
    }

    fn values(name: &str) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        values.insert("name".to_string(), name.to_string());
        values
    }

    #[test]
    fn rapid_saves_coalesce_into_one_write() {
        let (mut drafts, store, clock) = setup();
        for (i, name) in ["L", "Lo", "Lof", "Loft"].iter().enumerate() {
            drafts.save_draft(values(name), i % 2);
            clock.advance(Duration::milliseconds(100));
            assert!(!drafts.tick());
        }
        clock.advance(Duration::milliseconds(400));
        assert!(drafts.tick());
        assert_eq!(store.write_count(), 1);

        let loaded = drafts.load_draft().unwrap();
        assert_eq!(loaded.values.get("name").map(String::as_str), Some("Loft"));
        assert_eq!(loaded.step_index, 1);
    }

    #[test]
    fn newer_schedule_supersedes_older_timer() {
        let (mut drafts, _store, _clock) = setup();
        let first = drafts.save_draft(values("a"), 0);
        let second = drafts.save_draft(values("b"), 0);
        assert!(!drafts.is_current(&first));
        assert!(drafts.is_current(&second));
    }

    #[test]
    fn clear_wins_over_pending_save() {
        let (mut drafts, store, clock) = setup();
        drafts.save_draft(values("Loft"), 0);
        drafts.flush();
        drafts.save_draft(values("Loft 2"), 0);
        drafts.clear_draft();
        clock.advance(Duration::seconds(5));
        assert!(!drafts.tick());
        assert!(drafts.load_draft().is_none());
        assert_eq!(store.get("draft:property").unwrap(), None);
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let store = Arc::new(MemoryStore::with_quota(4));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let mut drafts = DraftPersistence::new("property", "draft:property", store.clone(), clock);
        drafts.save_draft(values("Harbour Loft"), 0);
        assert!(drafts.flush());
        assert!(!drafts.has_pending());
        assert!(drafts.load_draft().is_none());
    }

    #[test]
    fn foreign_or_corrupt_drafts_read_as_absent() {
        let (drafts, store, _clock) = setup();
        store.set("draft:property", "not json").unwrap();
        assert!(drafts.load_draft().is_none());

        let foreign = serde_json::json!({
            "version": 1,
            "form": "booking",
            "step_index": 0,
            "values": {},
            "saved_at": Utc::now(),
        });
        store.set("draft:property", &foreign.to_string()).unwrap();
        assert!(drafts.load_draft().is_none());
    }
}
