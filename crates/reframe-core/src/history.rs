//! Undo/redo history of accepted edits.
//!
//! `EditHistory` is a linear sequence of entries plus a cursor. Applying an
//! edit while the cursor is behind the tail drops the abandoned branch.
//! The cursor may rest before the first entry (`index() == None`, the "no
//! edit applied" state), which is where `undo` from the first entry lands.
//!
//! Entries are reference counted and never mutated, so truncation builds a
//! fresh sequence from the kept prefix and callers can hold on to entries
//! they received earlier.

use std::sync::Arc;

/// One accepted edit: its result and the input it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry<T> {
    result: T,
    originating_input: Option<T>,
}

impl<T> HistoryEntry<T> {
    pub fn new(result: T, originating_input: Option<T>) -> Self {
        Self {
            result,
            originating_input,
        }
    }

    pub fn result(&self) -> &T {
        &self.result
    }

    /// Input the edit started from; `None` for edits made without a base image.
    pub fn originating_input(&self) -> Option<&T> {
        self.originating_input.as_ref()
    }
}

/// Indexed, branch-truncating edit history.
#[derive(Debug, Clone)]
pub struct EditHistory<T> {
    entries: Vec<Arc<HistoryEntry<T>>>,
    index: Option<usize>,
}

impl<T> Default for EditHistory<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: None,
        }
    }
}

impl<T> EditHistory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new edit after the active one, discarding any redo branch.
    /// Returns the new index.
    pub fn apply_edit(&mut self, entry: HistoryEntry<T>) -> usize {
        let keep = self.index.map_or(0, |index| index + 1);
        let dropped = self.entries.len() - keep;
        if dropped > 0 {
            log::debug!("history: discarding {dropped} undone edit(s)");
        }

        let mut entries = Vec::with_capacity(keep + 1);
        entries.extend(self.entries[..keep].iter().cloned());
        entries.push(Arc::new(entry));
        self.entries = entries;

        let index = self.entries.len() - 1;
        self.index = Some(index);
        index
    }

    /// Step back one edit. Returns `false` when already before the first entry.
    pub fn undo(&mut self) -> bool {
        match self.index {
            Some(index) => {
                self.index = index.checked_sub(1);
                true
            }
            None => false,
        }
    }

    /// Step forward one edit. Returns `false` at the tail.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.index = Some(self.index.map_or(0, |index| index + 1));
        true
    }

    /// Drop every entry.
    pub fn reset(&mut self) {
        self.entries = Vec::new();
        self.index = None;
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some()
    }

    pub fn can_redo(&self) -> bool {
        let next = self.index.map_or(0, |index| index + 1);
        next < self.entries.len()
    }

    /// The entry under the cursor.
    pub fn active_entry(&self) -> Option<&Arc<HistoryEntry<T>>> {
        self.index.and_then(|index| self.entries.get(index))
    }

    pub fn active_result(&self) -> Option<&T> {
        self.active_entry().map(|entry| entry.result())
    }

    /// Input of the active edit. Before the first entry this is the first
    /// entry's input, i.e. what the session started from.
    pub fn active_input(&self) -> Option<&T> {
        match self.index {
            Some(_) => self.active_entry()?.originating_input(),
            None => self.entries.first()?.originating_input(),
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Cursor position with `-1` for the "no edit applied" state.
    pub fn position(&self) -> i64 {
        self.index
            .and_then(|index| i64::try_from(index).ok())
            .unwrap_or(-1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Arc<HistoryEntry<T>>] {
        &self.entries
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
