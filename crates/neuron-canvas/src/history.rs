//! Bounded undo/redo history of graph snapshots.

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::model::{Edge, Layer, NodePositions};

/// Owned copy of the undoable part of the sandbox state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySnapshot {
    pub layers: Vec<Layer>,
    pub edges: Vec<Edge>,
    pub node_positions: NodePositions,
}

/// Snapshots plus a cursor.
///
/// Once anything is recorded, `index` points at the snapshot matching the current state.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistorySnapshot>,
    index: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: None,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[HistorySnapshot] {
        &self.entries
    }

    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.index.and_then(|i| self.entries.get(i))
    }

    /// Records `snapshot` after the cursor, dropping any redo tail and the oldest entry when
    /// the capacity is exceeded.
    pub fn push(&mut self, snapshot: HistorySnapshot) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push(snapshot);
        if self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
        }
        self.index = Some(self.entries.len() - 1);
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.index, Some(i) if i + 1 < self.entries.len())
    }

    /// Moves the cursor back and returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&HistorySnapshot> {
        if !self.can_undo() {
            return None;
        }
        let i = self.index? - 1;
        self.index = Some(i);
        self.entries.get(i)
    }

    pub fn redo(&mut self) -> Option<&HistorySnapshot> {
        if !self.can_redo() {
            return None;
        }
        let i = self.index? + 1;
        self.index = Some(i);
        self.entries.get(i)
    }

    /// Replaces everything with a single entry.
    pub fn reset(&mut self, snapshot: HistorySnapshot) {
        self.entries.clear();
        self.entries.push(snapshot);
        self.index = Some(0);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }
}
