//! Undo/redo manager over serialized document snapshots.
//!
//! The stacks hold serialized values, never live documents, so a restored
//! state can't alias the one currently being edited. Both stacks are
//! bounded and evict their oldest entry on overflow.

use serde_json::Value;

/// Maximum depth of each stack.
pub const MAX_HISTORY: usize = 10;

/// Manages undo/redo with bounded snapshot stacks.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<Value>,
    redo_stack: Vec<Value>,
}

fn push_bounded(stack: &mut Vec<Value>, snapshot: Value) {
    stack.push(snapshot);
    while stack.len() > MAX_HISTORY {
        stack.remove(0);
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a forward change: the previous document's snapshot goes
    /// onto the undo stack and any redo history is invalidated.
    pub fn record_change(&mut self, previous: Value) {
        push_bounded(&mut self.undo_stack, previous);
        self.redo_stack.clear();
    }

    /// Step back: moves `current` onto the redo stack and returns the
    /// snapshot to restore. None when there is nothing to undo.
    pub fn undo(&mut self, current: Value) -> Option<Value> {
        let snapshot = self.undo_stack.pop()?;
        push_bounded(&mut self.redo_stack, current);
        Some(snapshot)
    }

    /// Step forward again: moves `current` onto the undo stack and
    /// returns the snapshot to restore. None when there is nothing to
    /// redo.
    pub fn redo(&mut self, current: Value) -> Option<Value> {
        let snapshot = self.redo_stack.pop()?;
        push_bounded(&mut self.undo_stack, current);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(n: usize) -> Value {
        json!({ "rev": n })
    }

    #[test]
    fn record_grows_until_the_cap_then_evicts_the_oldest() {
        let mut history = History::new();
        for n in 0..MAX_HISTORY {
            history.record_change(snapshot(n));
            assert_eq!(history.undo_depth(), n + 1);
        }

        history.record_change(snapshot(MAX_HISTORY));
        history.record_change(snapshot(MAX_HISTORY + 1));
        assert_eq!(history.undo_depth(), MAX_HISTORY);

        // Walking all the way back lands on the oldest surviving entry.
        let mut restored = None;
        let mut current = snapshot(usize::MAX);
        while let Some(s) = history.undo(current) {
            current = s.clone();
            restored = Some(s);
        }
        assert_eq!(restored, Some(snapshot(2)));
    }

    #[test]
    fn undo_moves_current_onto_the_redo_stack() {
        let mut history = History::new();
        history.record_change(snapshot(0));

        let restored = history.undo(snapshot(1)).unwrap();
        assert_eq!(restored, snapshot(0));
        assert!(!history.can_undo());
        assert!(history.can_redo());

        let forward = history.redo(snapshot(0)).unwrap();
        assert_eq!(forward, snapshot(1));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn a_new_change_clears_the_redo_stack() {
        let mut history = History::new();
        history.record_change(snapshot(0));
        history.undo(snapshot(1)).unwrap();
        assert!(history.can_redo());

        history.record_change(snapshot(0));
        assert!(!history.can_redo());
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut history = History::new();
        assert!(history.undo(snapshot(0)).is_none());
        assert!(history.redo(snapshot(0)).is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.redo_depth(), 0);
    }
}
