//! Errors surfaced by the task store.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::task::TaskId;

/// Input rejected by `TaskStore::add_task`. Nothing is written when this is
/// returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Title is empty or whitespace only.
    #[error("please enter a title for your task")]
    EmptyTitle,

    /// Start is not strictly before end.
    #[error("start time must be before end time (start {start}, end {end})")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid task: {0}")]
    Validation(#[from] ValidationError),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("id prefix `{prefix}` matches {matches} tasks")]
    AmbiguousId { prefix: String, matches: usize },

    /// Stored value under `key` is not a task list.
    #[error("stored tasks under `{key}` are malformed")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// `load` was called while an optimistic write is still unflushed.
    #[error("tasks under `{key}` have unsaved changes; flush before reloading")]
    UnsavedChanges { key: String },

    /// The persistence collaborator failed to read or write `key`.
    #[error("failed to persist tasks under `{key}`: {cause:#}")]
    Persist { key: String, cause: anyhow::Error },
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
