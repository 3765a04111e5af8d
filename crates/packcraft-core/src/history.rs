//! Snapshot-based undo/redo over the scene graph.
//!
//! The history is a bounded list of full scene snapshots with a cursor marking
//! the current state. Committing after an undo discards everything past the
//! cursor.

use crate::scene::SceneGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of history entries to keep.
pub const MAX_HISTORY: usize = 50;

/// What kind of edit produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Load,
    Add,
    AddText,
    AddImage,
    AddShape,
    Delete,
    Move,
    Rotate,
    Scale,
    Style,
    Reorder,
    Align,
    Duplicate,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Load => "load",
            ActionKind::Add => "add",
            ActionKind::AddText => "add_text",
            ActionKind::AddImage => "add_image",
            ActionKind::AddShape => "add_shape",
            ActionKind::Delete => "delete",
            ActionKind::Move => "move",
            ActionKind::Rotate => "rotate",
            ActionKind::Scale => "scale",
            ActionKind::Style => "style",
            ActionKind::Reorder => "reorder",
            ActionKind::Align => "align",
            ActionKind::Duplicate => "duplicate",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable snapshot of the scene graph after a committed edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: ActionKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub state: SceneGraph,
}

/// Bounded undo/redo log with branch truncation.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    limit: usize,
}

impl HistoryManager {
    /// Create a history seeded with `initial` as its first (load) entry.
    pub fn new(initial: &SceneGraph, limit: usize) -> Self {
        let mut history = Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        };
        history.reset(initial);
        history
    }

    /// Drop all entries and start over from `state`.
    pub fn reset(&mut self, state: &SceneGraph) {
        self.entries.clear();
        self.entries.push(HistoryEntry {
            kind: ActionKind::Load,
            description: "Load design".to_string(),
            timestamp: Utc::now(),
            state: state.clone(),
        });
        self.cursor = 0;
    }

    /// Record a committed state.
    pub fn commit(
        &mut self,
        state: &SceneGraph,
        kind: ActionKind,
        description: impl Into<String>,
    ) -> &HistoryEntry {
        let discarded = self.entries.len() - (self.cursor + 1);
        if discarded > 0 {
            log::debug!("Discarding {discarded} redo entries");
            self.entries.truncate(self.cursor + 1);
        }

        let description = description.into();
        log::debug!("History commit: {kind} ({description})");
        self.entries.push(HistoryEntry {
            kind,
            description,
            timestamp: Utc::now(),
            state: state.clone(),
        });
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.limit {
            let evicted = self.entries.remove(0);
            self.cursor -= 1;
            log::debug!("Evicted oldest history entry: {}", evicted.kind);
        }

        &self.entries[self.cursor]
    }

    /// Step back one entry and return the state to restore.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        let entry = &self.entries[self.cursor];
        log::debug!("Undo to #{} ({})", self.cursor, entry.kind);
        Some(entry)
    }

    /// Step forward one entry and return the state to restore.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        let entry = &self.entries[self.cursor];
        log::debug!("Redo to #{} ({})", self.cursor, entry.kind);
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: the history holds at least its seed entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementSpec, ShapePayload, Transform};

    fn graph_with(n: usize) -> SceneGraph {
        let mut graph = SceneGraph::default();
        for i in 0..n {
            graph
                .add(ElementSpec::shape(
                    Transform::new(i as f64 * 10.0, 0.0, 5.0, 5.0),
                    ShapePayload::rectangle(),
                ))
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_seeded_with_load_entry() {
        let history = HistoryManager::new(&SceneGraph::default(), MAX_HISTORY);
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.current().kind, ActionKind::Load);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let origin = graph_with(0);
        let mut history = HistoryManager::new(&origin, MAX_HISTORY);
        let one = graph_with(1);
        history.commit(&one, ActionKind::AddShape, "Add rectangle");

        assert_eq!(history.undo().unwrap().state, origin);
        assert!(history.undo().is_none());
        assert_eq!(history.redo().unwrap().state, one);
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_commit_after_undo_truncates() {
        let mut history = HistoryManager::new(&graph_with(0), MAX_HISTORY);
        history.commit(&graph_with(1), ActionKind::Add, "one");
        history.commit(&graph_with(2), ActionKind::Add, "two");
        history.undo();
        history.undo();
        assert!(history.can_redo());

        let branch = graph_with(3);
        history.commit(&branch, ActionKind::Move, "branch");
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
        assert_eq!(history.current().state, branch);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut history = HistoryManager::new(&graph_with(0), MAX_HISTORY);
        for i in 0..60 {
            history.commit(&SceneGraph::new(100.0 + i as f64, 100.0), ActionKind::Style, format!("edit {i}"));
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.cursor(), MAX_HISTORY - 1);
        assert_eq!(history.entries()[0].description, "edit 10");
        assert_eq!(history.current().description, "edit 59");

        let mut undos = 0;
        while history.undo().is_some() {
            undos += 1;
        }
        assert_eq!(undos, MAX_HISTORY - 1);
    }

    #[test]
    fn test_limit_of_one() {
        let mut history = HistoryManager::new(&graph_with(0), 0);
        assert_eq!(history.limit(), 1);
        history.commit(&graph_with(1), ActionKind::Add, "one");
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_reset() {
        let mut history = HistoryManager::new(&graph_with(0), MAX_HISTORY);
        history.commit(&graph_with(1), ActionKind::Add, "one");
        let loaded = graph_with(2);
        history.reset(&loaded);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().state, loaded);
    }

    #[test]
    fn test_action_kind_names() {
        assert_eq!(ActionKind::AddImage.to_string(), "add_image");
        assert_eq!(serde_json::to_string(&ActionKind::AddText).unwrap(), "\"add_text\"");
    }
}
