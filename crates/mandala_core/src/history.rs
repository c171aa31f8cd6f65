//! Whole-grid undo/redo timeline.
//!
//! # Responsibility
//! - Own the live grid together with its undo (`past`) and redo (`future`)
//!   snapshot stacks.
//! - Record a snapshot only when an edit actually changed the grid.
//!
//! # Invariants
//! - `past` never holds more than `limit` snapshots; the oldest is evicted.
//! - Any successful `commit` clears `future`.
//! - `undo`/`redo` on an empty stack are no-ops that return `false`.

use crate::model::grid::Grid;
use std::collections::VecDeque;

/// Maximum number of undo snapshots kept.
pub const HISTORY_LIMIT: usize = 50;

/// Live grid plus bounded undo and unbounded redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Grid>,
    current: Grid,
    future: VecDeque<Grid>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Grid::new())
    }
}

impl History {
    /// Starts a timeline at `current` with the default limit.
    pub fn new(current: Grid) -> Self {
        Self::with_limit(current, HISTORY_LIMIT)
    }

    /// Starts a timeline with a custom undo depth (at least 1).
    pub fn with_limit(current: Grid, limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            current,
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn current(&self) -> &Grid {
        &self.current
    }

    /// Mutable access to the live grid.
    ///
    /// Callers snapshot first and hand the snapshot to [`History::commit`]
    /// once the edit is done.
    pub fn current_mut(&mut self) -> &mut Grid {
        &mut self.current
    }

    /// Records `before` as an undo step if it differs from the live grid.
    ///
    /// Returns whether a step was recorded.
    pub fn commit(&mut self, before: Grid) -> bool {
        if before == self.current {
            return false;
        }
        self.past.push_back(before);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
        true
    }

    /// Replaces the live grid wholesale and records the previous one.
    ///
    /// Returns whether a step was recorded (no step when nothing changed).
    pub fn replace(&mut self, next: Grid) -> bool {
        let before = std::mem::replace(&mut self.current, next);
        self.commit(before)
    }

    /// Steps back once. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.current, previous);
        self.future.push_front(current);
        true
    }

    /// Steps forward once. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.current, next);
        self.past.push_back(current);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }
}

/// Snapshot captured when the user starts editing one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    /// Cell the edit started from.
    pub index: usize,
    /// Grid as it was before the first keystroke.
    pub before: Grid,
}

impl EditSession {
    pub fn begin(index: usize, current: &Grid) -> Self {
        Self {
            index,
            before: current.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::History;
    use crate::model::grid::Grid;

    #[test]
    fn commit_of_unchanged_snapshot_is_ignored() {
        let mut history = History::default();
        let before = history.current().clone();
        assert!(!history.commit(before));
        assert!(!history.can_undo());
    }

    #[test]
    fn new_commit_clears_redo() {
        let mut history = History::default();
        let before = history.current().clone();
        history.current_mut().set_cell(0, "a").unwrap();
        history.commit(before);
        history.undo();
        assert!(history.can_redo());

        let before = history.current().clone();
        history.current_mut().set_cell(1, "b").unwrap();
        history.commit(before);
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_and_redo_on_empty_stacks_are_noops() {
        let mut history = History::default();
        assert!(!history.undo());
        assert!(!history.redo());
        assert_eq!(history.current(), &Grid::new());
    }

    #[test]
    fn custom_limit_evicts_oldest() {
        let mut history = History::with_limit(Grid::new(), 2);
        for i in 0..3 {
            let mut next = history.current().clone();
            next.set_cell(i, "x").unwrap();
            history.replace(next);
        }
        assert_eq!(history.undo_depth(), 2);
    }
}
