//! Bounded in-memory event log.
//!
//! Newest-first, capped at [`LOG_CAPACITY`] entries; the oldest entry is
//! silently dropped beyond the cap. Entries are immutable after creation.
//! Every push is mirrored to the `log` facade so the daemon's stderr log
//! and the in-memory history stay in step.

use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;

pub const LOG_CAPACITY: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Alert,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub id: u64,
    /// Human-readable local time of day.
    pub time: String,
    pub message: String,
    pub severity: Severity,
}

pub struct EventLog {
    entries: VecDeque<LogEntry>,
    next_id: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(LOG_CAPACITY),
            next_id: 1,
        }
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) -> &LogEntry {
        let message = message.into();
        match severity {
            Severity::Error => log::error!("{}", message),
            Severity::Warning => log::warn!("{}", message),
            _ => log::info!("{}", message),
        }

        let entry = LogEntry {
            id: self.next_id,
            time: Local::now().format("%H:%M:%S").to_string(),
            message,
            severity,
        };
        self.next_id += 1;

        self.entries.push_front(entry);
        self.entries.truncate(LOG_CAPACITY);
        &self.entries[0]
    }

    /// Entries newest-first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_is_first() {
        let mut log = EventLog::new();
        log.push(Severity::Info, "first");
        log.push(Severity::Alert, "second");
        assert_eq!(log.latest().unwrap().message, "second");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn ids_are_monotonic() {
        let mut log = EventLog::new();
        let a = log.push(Severity::Info, "a").id;
        let b = log.push(Severity::Info, "b").id;
        assert!(b > a);
    }

    #[test]
    fn cap_drops_oldest_and_preserves_order() {
        let mut log = EventLog::new();
        for i in 0..101 {
            log.push(Severity::Info, format!("entry {i}"));
        }
        assert_eq!(log.len(), LOG_CAPACITY);
        // Entry 0 (the oldest) fell off; entry 100 leads.
        assert_eq!(log.latest().unwrap().message, "entry 100");
        let oldest = log.entries().last().unwrap();
        assert_eq!(oldest.message, "entry 1");
        // Strictly descending ids = newest-first ordering held.
        let ids: Vec<u64> = log.entries().map(|e| e.id).collect();
        assert!(ids.windows(2).all(|w| w[0] > w[1]));
    }
}
