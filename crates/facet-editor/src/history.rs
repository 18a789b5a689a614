//! Undo history
//!
//! Linear undo/redo over [`Memento`]s. An entry records the state from before
//! a change; undoing swaps it with the current state, which becomes the redo
//! entry, so undo followed by redo lands exactly where it started.

use std::rc::Rc;

use facet_core::CloneResult;
use tracing::{debug, info};

use crate::memento::{Memento, Originator};
use crate::signals::EditorSignals;

/// One labelled snapshot
pub struct HistoryEntry {
    /// Name of the change, for menus
    pub label: String,
    /// State to go back to
    pub memento: Memento,
}

/// Undo and redo stacks
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_entries: Option<usize>,
    signals: Rc<EditorSignals>,
}

impl History {
    /// Create an empty history
    ///
    /// # Arguments
    /// * `max_entries` - Undo depth; the oldest entry is dropped beyond it
    /// * `signals` - Where `history_changed` is dispatched
    pub fn new(max_entries: Option<usize>, signals: Rc<EditorSignals>) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries,
            signals,
        }
    }

    /// Push a snapshot taken before a change
    pub fn record(&mut self, label: impl Into<String>, memento: Memento) {
        let label = label.into();
        debug!(label = %label, "Recording history entry");
        self.undo_stack.push(HistoryEntry { label, memento });
        if let Some(max) = self.max_entries
            && self.undo_stack.len() > max
        {
            let overflow = self.undo_stack.len() - max;
            self.undo_stack.drain(..overflow);
        }
    }

    /// Undo the most recent change
    ///
    /// Returns `Ok(false)` and does nothing when there is nothing to undo.
    pub fn undo(&mut self, originator: &dyn Originator) -> CloneResult<bool> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(false);
        };
        match swap(entry, originator) {
            Ok((label, current)) => {
                info!(label = %label, "Undo");
                self.redo_stack.push(HistoryEntry {
                    label,
                    memento: current,
                });
                self.signals.history_changed.emit();
                Ok(true)
            }
            Err((entry, error)) => {
                self.undo_stack.push(entry);
                Err(error)
            }
        }
    }

    /// Redo the most recently undone change
    pub fn redo(&mut self, originator: &dyn Originator) -> CloneResult<bool> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match swap(entry, originator) {
            Ok((label, current)) => {
                info!(label = %label, "Redo");
                self.undo_stack.push(HistoryEntry {
                    label,
                    memento: current,
                });
                self.signals.history_changed.emit();
                Ok(true)
            }
            Err((entry, error)) => {
                self.redo_stack.push(entry);
                Err(error)
            }
        }
    }

    /// Drop the redo stack, after a fresh change
    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    /// Check if there is anything to undo
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if there is anything to redo
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Labels on the undo stack, oldest first
    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo_stack.iter().map(|e| e.label.as_str()).collect()
    }

    /// Labels on the redo stack, oldest first
    pub fn redo_labels(&self) -> Vec<&str> {
        self.redo_stack.iter().map(|e| e.label.as_str()).collect()
    }
}

type SwapError = (HistoryEntry, facet_core::CloneError);

/// Snapshot the current state, then restore `entry`
fn swap(
    entry: HistoryEntry,
    originator: &dyn Originator,
) -> Result<(String, Memento), SwapError> {
    let current = match originator.save_to_memento() {
        Ok(current) => current,
        Err(error) => return Err((entry, error)),
    };
    if let Err(error) = originator.restore_from_memento(&entry.memento) {
        return Err((entry, error));
    }
    Ok((entry.label, current))
}
