//! Undo/redo log.
//!
//! Two bounded stacks of [`UndoAction`] descriptors. The log only stores and
//! hands back descriptors; interpreting them against the task store is the
//! dashboard's job.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::models::{Status, Task};

/// Maximum number of entries kept on each stack before FIFO eviction.
pub const HISTORY_LIMIT: usize = 50;

/// Handle shared between the task store (which records) and the dashboard
/// (which undoes and redoes).
pub type SharedHistory = Arc<Mutex<UndoRedoLog>>;

/// A past store mutation, with enough state to invert it.
///
/// The embedded task is the snapshot taken before the mutation was applied,
/// except for `Create`, which holds the task as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UndoAction {
    Create {
        task: Task,
    },
    Delete {
        task: Task,
    },
    Toggle {
        task: Task,
        #[serde(rename = "prevStatus")]
        prev_status: Status,
    },
}

impl UndoAction {
    pub fn task(&self) -> &Task {
        match self {
            UndoAction::Create { task }
            | UndoAction::Delete { task }
            | UndoAction::Toggle { task, .. } => task,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UndoAction::Create { .. } => "create",
            UndoAction::Delete { .. } => "delete",
            UndoAction::Toggle { .. } => "toggle",
        }
    }
}

#[derive(Debug, Default)]
pub struct UndoRedoLog {
    undo_stack: VecDeque<UndoAction>,
    redo_stack: VecDeque<UndoAction>,
}

impl UndoRedoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedHistory {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Records a fresh action. Any pending redo branch is discarded.
    pub fn push_action(&mut self, action: UndoAction) {
        tracing::debug!(kind = action.kind(), id = %action.task().id, "recording action");
        push_bounded(&mut self.undo_stack, action);
        self.redo_stack.clear();
    }

    /// Pops the most recent action and moves it to the redo stack.
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<UndoAction> {
        let action = self.undo_stack.pop_back()?;
        push_bounded(&mut self.redo_stack, action.clone());
        Some(action)
    }

    /// Pops the most recently undone action and moves it back to the undo stack.
    pub fn redo(&mut self) -> Option<UndoAction> {
        let action = self.redo_stack.pop_back()?;
        push_bounded(&mut self.undo_stack, action.clone());
        Some(action)
    }

    /// Removes `action` if it is still the newest undo entry.
    ///
    /// Used when the mutation an action describes never reached the backend.
    pub fn retract(&mut self, action: &UndoAction) -> bool {
        if self.undo_stack.back() == Some(action) {
            self.undo_stack.pop_back();
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Undo entries, oldest first.
    pub fn undo_stack(&self) -> impl Iterator<Item = &UndoAction> {
        self.undo_stack.iter()
    }

    /// Redo entries, oldest first.
    pub fn redo_stack(&self) -> impl Iterator<Item = &UndoAction> {
        self.redo_stack.iter()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}

fn push_bounded(stack: &mut VecDeque<UndoAction>, action: UndoAction) {
    stack.push_back(action);
    while stack.len() > HISTORY_LIMIT {
        stack.pop_front();
    }
}
