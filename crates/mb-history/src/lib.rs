//! Chronological views over the persistent store's history logs.

use mb_core::DayKey;
use mb_core::Destination;
use mb_core::HistoryEntry;
use mb_core::ShellError;
use mb_core::ShellResult;
use mb_core::now_unix_seconds;
use mb_store::HistoryReadOutcome;
use mb_store::PersistentStore;

/// Per-day navigation history built on the store's append-only log files.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    store: PersistentStore,
}

impl HistoryLog {
    pub fn new(store: PersistentStore) -> Self {
        Self { store }
    }

    /// Appends a navigation commit stamped with the current time.
    pub fn record(&self, destination: &Destination) -> ShellResult<()> {
        self.record_at(destination, now_unix_seconds())
    }

    /// Appends a navigation commit at an explicit timestamp. The day key is
    /// derived from the timestamp so an entry always lands in the log of the
    /// day it happened on.
    pub fn record_at(&self, destination: &Destination, timestamp: i64) -> ShellResult<()> {
        let day = DayKey::from_unix_seconds(timestamp).ok_or_else(|| {
            ShellError::new(
                "history.timestamp_out_of_range",
                format!("timestamp {timestamp} is outside the representable date range"),
            )
        })?;

        let entry = HistoryEntry::new(destination.clone(), timestamp);
        self.store.append_history_entry(day, &entry)
    }

    /// Full history for display: days most recent first, entries within a
    /// day in original append order. A day whose log has a malformed tail
    /// still contributes its valid prefix, flagged as truncated.
    pub fn render(&self) -> ShellResult<Vec<(DayKey, HistoryReadOutcome)>> {
        let mut rendered = Vec::new();
        for day in self.store.list_history_days()? {
            rendered.push((day, self.store.read_history_log(day)?));
        }

        Ok(rendered)
    }
}
