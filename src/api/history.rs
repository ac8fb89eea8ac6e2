//! Append-only log of the requests a session has issued.
//!
//! The log is an audit trail, not a cache: entries are never evicted and
//! nothing is ever served from it.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::Result;

/// One successful round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the response was received (Unix timestamp).
    pub timestamp: u64,
    /// Full URL including the query string.
    pub url: String,
    pub status: u16,
    /// `Last-Modified-Version` reported by the service.
    pub version: Option<String>,
    pub content_type: Option<String>,
}

/// Ordered request log. Appends are serialized behind a mutex.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl RequestLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Never fails, even after another thread panicked
    /// while holding the log.
    pub fn record(&self, entry: LogEntry) {
        trace!(url = %entry.url, status = entry.status, "Recorded request");
        self.lock().push(entry);
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export the log as a JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries())?)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Request log lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
