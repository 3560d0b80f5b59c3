// History - bounded undo/redo stacks of serialized project snapshots
//
// Full-snapshot undo is intentionally simple; at 50 entries the memory
// cost is acceptable for project-sized documents.

use std::collections::VecDeque;

/// Maximum entries kept on each stack
pub const MAX_HISTORY: usize = 50;

/// Two bounded stacks of serialized snapshots. Pushing a new snapshot
/// always clears the redo stack: undone states are unreachable once the
/// user edits again.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: VecDeque<String>,
    redo_stack: VecDeque<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot taken before a mutating action
    pub fn push(&mut self, snapshot: String) {
        self.undo_stack.push_back(snapshot);
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    /// Pop the newest undo snapshot, parking `current` on the redo stack.
    /// Returns None (leaving `current` unrecorded) when there is nothing
    /// to undo.
    pub fn undo(&mut self, current: String) -> Option<String> {
        let snapshot = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(current);
        if self.redo_stack.len() > MAX_HISTORY {
            self.redo_stack.pop_front();
        }
        Some(snapshot)
    }

    /// Mirror of `undo`
    pub fn redo(&mut self, current: String) -> Option<String> {
        let snapshot = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(current);
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.pop_front();
        }
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new();
        history.push("v1".into());

        let restored = history.undo("v2".into()).unwrap();
        assert_eq!(restored, "v1");
        assert!(history.can_redo());

        let redone = history.redo("v1".into()).unwrap();
        assert_eq!(redone, "v2");
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks() {
        let mut history = History::new();
        assert!(history.undo("current".into()).is_none());
        assert!(history.redo("current".into()).is_none());
        // A failed undo must not leak the current state onto redo
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::new();
        history.push("v1".into());
        history.undo("v2".into()).unwrap();
        assert!(history.can_redo());

        history.push("v3".into());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_eviction_at_limit() {
        let mut history = History::new();
        for i in 0..MAX_HISTORY + 10 {
            history.push(format!("v{}", i));
        }
        assert_eq!(history.undo_depth(), MAX_HISTORY);

        // The oldest surviving snapshot is v10
        let mut last = String::new();
        let mut current = "top".to_string();
        while let Some(snapshot) = history.undo(current.clone()) {
            last = snapshot.clone();
            current = snapshot;
        }
        assert_eq!(last, "v10");
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.push("v1".into());
        history.undo("v2".into()).unwrap();
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
