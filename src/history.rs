//! Per-session analysis history, kept in memory for the life of the process.
//!
//! Each session holds at most [`MAX_HISTORY`] entries, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

/// Entries kept per session
pub const MAX_HISTORY: usize = 20;

/// What the caller supplies when recording an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub language: String,
    pub score: serde_json::Value,
    pub grade: serde_json::Value,
    pub summary: serde_json::Value,
    pub issue_count: usize,
    pub code_snippet: String,
}

/// A recorded analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: NewEntry,
}

/// Bounded, insertion-ordered history per session.
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    sessions: Mutex<HashMap<String, VecDeque<HistoryEntry>>>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Record an entry as the newest for `session_id`, evicting the oldest
    /// beyond capacity.
    pub fn record(&self, session_id: &str, entry: NewEntry) -> HistoryEntry {
        let recorded = HistoryEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            entry,
        };

        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let log = sessions.entry(session_id.to_string()).or_default();
        log.push_front(recorded.clone());
        log.truncate(self.capacity);

        recorded
    }

    /// Entries for `session_id`, newest first. Unknown sessions are empty.
    pub fn entries(&self, session_id: &str) -> Vec<HistoryEntry> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(session_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(session_id);
    }

    /// Number of entries held for every known session.
    pub fn session_counts(&self) -> HashMap<String, usize> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .iter()
            .map(|(id, log)| (id.clone(), log.len()))
            .collect()
    }
}
