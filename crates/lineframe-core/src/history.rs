//! Snapshot-based undo/redo.

use crate::document::{Document, Snapshot};
use std::collections::VecDeque;

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Undo and redo stacks of whole-document snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(MAX_UNDO_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    fn push_bounded(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        if self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
    }

    /// Record the current state (call before making changes).
    pub fn save(&mut self, document: &Document) {
        self.record(document.snapshot());
    }

    /// Record a snapshot taken earlier, once the edit it precedes succeeded.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.push_bounded(snapshot);
        // New changes invalidate the redo branch
        self.redo_stack.clear();
        log::debug!("History saved ({} undo states)", self.undo_stack.len());
    }

    /// Restore the previous state.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self, document: &mut Document) -> bool {
        let Some(snapshot) = self.undo_stack.pop_back() else {
            return false;
        };
        self.redo_stack.push(document.snapshot());
        document.restore(snapshot);
        log::debug!("Undo ({} left)", self.undo_stack.len());
        true
    }

    /// Re-apply the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self, document: &mut Document) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.push_bounded(document.snapshot());
        document.restore(snapshot);
        log::debug!("Redo ({} left)", self.redo_stack.len());
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
