//! User-visible activity log
//!
//! Outcomes of ledger transactions the UI may want to show. Every entry is
//! also emitted through `tracing`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Entry severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Completed normally
    Info,
    /// Worth attention
    Warning,
    /// Failed
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Sequence number
    pub id: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Severity
    pub severity: Severity,
    /// Message
    pub message: String,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    entries: Vec<Activity>,
}

/// Append-only activity log
#[derive(Debug, Default)]
pub struct ActivityLog {
    inner: Mutex<Inner>,
}

impl ActivityLog {
    /// Empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; returns its id
    pub fn record(&self, severity: Severity, message: impl Into<String>) -> u64 {
        let message = message.into();
        match severity {
            Severity::Info => tracing::info!("{}", message),
            Severity::Warning => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }

        let mut guard = self.inner.lock();
        let id = guard.next_id;
        guard.next_id += 1;
        guard.entries.push(Activity {
            id,
            timestamp: now_millis(),
            severity,
            message,
        });
        id
    }

    /// All entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<Activity> {
        self.inner.lock().entries.clone()
    }

    /// Entries at or above `severity`
    #[must_use]
    pub fn at_least(&self, severity: Severity) -> Vec<Activity> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|a| a.severity >= severity)
            .cloned()
            .collect()
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<Activity> {
        self.inner.lock().entries.last().cloned()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// No entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Drop every entry; ids keep counting
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
