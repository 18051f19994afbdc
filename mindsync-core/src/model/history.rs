//! Bounded undo log of graph snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::graph::{Edge, Node, Viewport};
use crate::{Error, Result};

/// Maximum number of entries kept, newest first
pub const HISTORY_LIMIT: usize = 50;

/// What produced a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Save,
    Commit,
}

/// Frozen copy of the editable graph state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub kind: HistoryKind,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub description: String,
    /// Branch the snapshot was taken from
    #[serde(default = "default_branch")]
    pub branch: String,
    pub snapshot: HistorySnapshot,
}

fn default_branch() -> String {
    crate::model::MAIN_BRANCH.to_string()
}

impl HistoryEntry {
    pub fn new(
        kind: HistoryKind,
        user: impl Into<String>,
        description: impl Into<String>,
        branch: impl Into<String>,
        snapshot: HistorySnapshot,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            timestamp: Utc::now(),
            user: user.into(),
            description: description.into(),
            branch: branch.into(),
            snapshot,
        }
    }
}

/// Newest-first list of history entries, capped at [`HISTORY_LIMIT`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front and drop whatever falls past the cap
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Deep copy of the snapshot stored under `id`
    ///
    /// Does not record anything; the caller decides where the copy goes.
    pub fn restore(&self, id: &str) -> Result<HistorySnapshot> {
        self.get(id)
            .map(|e| e.snapshot.clone())
            .ok_or_else(|| Error::NotFound(format!("history entry '{}'", id)))
    }
}
