// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of timeline snapshots.
//!
//! Snapshots are shared `Arc`s, so recording an undo point is a pointer copy.

use crate::state::TimelineState;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// Maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// One recorded undo point
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Human-readable description
    pub description: String,
    /// State to restore
    pub state: Arc<TimelineState>,
    /// Restoring brings back zoom and scroll as well
    pub restores_view: bool,
}

/// Undo/redo stacks
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    max_depth: usize,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with a custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state before a change. Clears the redo stack.
    ///
    /// `restores_view` marks changes whose zoom and scroll are part of the
    /// edit, like zoom-to-fit.
    pub fn record(&mut self, description: impl Into<String>, before: Arc<TimelineState>, restores_view: bool) {
        self.redo_stack.clear();
        self.undo_stack.push_back(HistoryEntry {
            description: description.into(),
            state: before,
            restores_view,
        });

        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Step back. `current` is kept for redo; returns the entry to restore.
    pub fn undo(&mut self, current: Arc<TimelineState>) -> Result<HistoryEntry> {
        let entry = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        self.redo_stack.push_back(HistoryEntry {
            description: entry.description.clone(),
            state: current,
            restores_view: entry.restores_view,
        });
        Ok(entry)
    }

    /// Step forward. `current` is kept for undo; returns the entry to restore.
    pub fn redo(&mut self, current: Arc<TimelineState>) -> Result<HistoryEntry> {
        let entry = self.redo_stack.pop_back().ok_or(HistoryError::NothingToRedo)?;
        self.undo_stack.push_back(HistoryEntry {
            description: entry.description.clone(),
            state: current,
            restores_view: entry.restores_view,
        });
        Ok(entry)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.description.as_str())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
