//! Error types for the task dashboard.
//!
//! Failures carry a human-readable message only; that message is what the
//! store records in its `error` field and what the UI shows.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// A Task Repository call that did not succeed.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Non-2xx answer from the backend.
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Task not found")]
    TaskNotFound(String),

    #[error("Export failed: {0}")]
    Export(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Export(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Export(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum DashboardError {
    // Empty history is a valid state, kept apart from real failures.
    #[error("Nothing to undo.")]
    NothingToUndo,

    #[error("Nothing to redo.")]
    NothingToRedo,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

impl DashboardError {
    /// True for the empty-history signals, which are not failures.
    pub fn is_empty_history(&self) -> bool {
        matches!(self, DashboardError::NothingToUndo | DashboardError::NothingToRedo)
    }
}
