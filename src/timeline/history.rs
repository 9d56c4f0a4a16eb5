//! Bounded undo/redo history of timeline snapshots
//!
//! Snapshots share their note and obstacle storage, so keeping a hundred of
//! them costs a hundred `Arc` pairs plus whatever each command actually
//! rebuilt.

use std::collections::VecDeque;

use super::command::CommandKind;
use super::entity::Timeline;

/// Maximum number of states kept (the present one included)
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A snapshot and the kind of command that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub snapshot: Timeline,
    pub tag: CommandKind,
}

/// Undo/redo over timeline snapshots.
///
/// Recording after an undo drops the redo branch. Consecutive commands of a
/// coalescing kind fold into the entry the first of them created.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<HistoryEntry>,
    present: HistoryEntry,
    future: Vec<HistoryEntry>,
    limit: usize,
    /// Kind of the coalescing run in progress, if any
    group: Option<CommandKind>,
}

impl History {
    pub fn new(initial: Timeline, limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: HistoryEntry {
                snapshot: initial,
                tag: CommandKind::ClearEntities,
            },
            future: Vec::new(),
            limit: limit.max(1),
            group: None,
        }
    }

    /// Current snapshot
    pub fn present(&self) -> &Timeline {
        &self.present.snapshot
    }

    /// Commit a new snapshot as an undo step (or fold it into the running
    /// group when `coalesce` is set and the run accepts this kind).
    pub fn record(&mut self, snapshot: Timeline, tag: CommandKind, coalesce: bool) {
        let entry = HistoryEntry { snapshot, tag };

        if coalesce && self.group.is_some_and(|group| group.coalesces_with(tag)) {
            self.present = entry;
            self.future.clear();
            return;
        }

        let previous = std::mem::replace(&mut self.present, entry);
        self.past.push_back(previous);
        while self.past.len() + 1 > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
        self.group = if coalesce { Some(tag) } else { None };
    }

    /// Swap the present snapshot without creating an undo step
    pub fn replace_present(&mut self, snapshot: Timeline) {
        self.present.snapshot = snapshot;
    }

    /// Step back. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        self.group = None;
        true
    }

    /// Step forward again. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        self.group = None;
        true
    }

    /// Forget everything and start over from `snapshot`
    pub fn reset(&mut self, snapshot: Timeline) {
        self.past.clear();
        self.future.clear();
        self.group = None;
        self.present = HistoryEntry {
            snapshot,
            tag: CommandKind::ClearEntities,
        };
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

    /// States reachable by undo, plus the present one
    pub fn len(&self) -> usize {
        self.past.len() + 1
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Timeline::new(), DEFAULT_HISTORY_LIMIT)
    }
}
