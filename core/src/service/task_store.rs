use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::date_filter::select_for_day;
use crate::error::{StoreError, ValidationError};
use crate::model::task::{Task, TaskId};
use crate::repository::KeyValueStore;
use crate::usecase::rollover::{roll_over, Rollover, DEFAULT_ANCHOR};

pub const DEFAULT_STORAGE_KEY: &str = "@tasks_storage";

/// Order of the in-memory update relative to the persistence write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Write first; memory changes only once the write succeeded.
    #[default]
    Confirmed,
    /// Update memory first; a failed write marks the store dirty and is
    /// retried by `TaskStore::flush`.
    Optimistic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    pub storage_key: String,
    pub rollover_anchor: NaiveTime,
    pub write_policy: WritePolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            rollover_anchor: DEFAULT_ANCHOR,
            write_policy: WritePolicy::default(),
        }
    }
}

/// Owns the task list and is the only path that mutates or persists it.
///
/// Every mutation builds the next list and hands it to [`TaskStore::save`],
/// which always overwrites the whole stored value.
pub struct TaskStore<S: KeyValueStore> {
    storage: S,
    options: StoreOptions,
    tasks: Vec<Task>,
    dirty: bool,
    last_rollover: Option<NaiveDate>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Loads the stored list. Does not roll anything over.
    pub fn open(storage: S, options: StoreOptions) -> Result<Self, StoreError> {
        let mut store = Self {
            storage,
            options,
            tasks: Vec::new(),
            dirty: false,
            last_rollover: None,
        };
        store.load()?;
        Ok(store)
    }

    /// Startup sequence: load, then one rollover pass relative to `now`.
    pub fn open_at<Tz: TimeZone>(storage: S, options: StoreOptions, now: &DateTime<Tz>) -> Result<Self, StoreError> {
        let mut store = Self::open(storage, options)?;
        store.roll_over_incomplete_tasks(now)?;
        Ok(store)
    }

    /// Replaces the in-memory list with what persistence holds. A missing or
    /// blank value is an empty list; anything else that is not a task list
    /// is `Corrupt` and leaves memory and storage as they were. Fails with
    /// `UnsavedChanges` while the store is dirty.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let key = self.options.storage_key.clone();
        if self.dirty {
            warn!(key = %key, count = self.tasks.len(), "refusing to reload over unsaved tasks");
            return Err(StoreError::UnsavedChanges { key });
        }
        let raw = self
            .storage
            .get(&key)
            .map_err(|cause| StoreError::Persist { key: key.clone(), cause })?;

        let tasks = match raw {
            Some(content) if !content.trim().is_empty() => serde_json::from_str::<Vec<Task>>(&content)
                .map_err(|source| StoreError::Corrupt { key: key.clone(), source })?,
            _ => Vec::new(),
        };

        debug!(key = %key, count = tasks.len(), "loaded tasks");
        self.tasks = tasks;
        self.dirty = false;
        Ok(())
    }

    /// Installs `tasks` as the current list and writes all of it.
    pub fn save(&mut self, tasks: Vec<Task>) -> Result<(), StoreError> {
        let payload = self.encode(&tasks)?;

        match self.options.write_policy {
            WritePolicy::Confirmed => {
                self.write(&payload)?;
                self.tasks = tasks;
                self.dirty = false;
            }
            WritePolicy::Optimistic => {
                self.tasks = tasks;
                match self.write(&payload) {
                    Ok(()) => self.dirty = false,
                    Err(err) => {
                        warn!(error = %err, "keeping unsaved changes in memory");
                        self.dirty = true;
                    }
                }
            }
        }
        Ok(())
    }

    /// Retries the write of the current list after an optimistic failure.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        let payload = self.encode(&self.tasks)?;
        self.write(&payload)?;
        self.dirty = false;
        Ok(())
    }

    fn encode(&self, tasks: &[Task]) -> Result<String, StoreError> {
        serde_json::to_string(tasks).map_err(|err| StoreError::Persist {
            key: self.options.storage_key.clone(),
            cause: err.into(),
        })
    }

    fn write(&mut self, payload: &str) -> Result<(), StoreError> {
        let key = &self.options.storage_key;
        self.storage
            .set(key, payload)
            .map_err(|cause| StoreError::Persist { key: key.clone(), cause })?;
        debug!(key = %key, bytes = payload.len(), "saved tasks");
        Ok(())
    }

    pub fn add_task(&mut self, title: &str, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<Task, StoreError> {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }
        if start_time >= end_time {
            return Err(ValidationError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            }
            .into());
        }

        let task = Task::new(title, start_time, end_time);
        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.save(next)?;
        info!(id = %task.id, "added task");
        Ok(task)
    }

    /// Marks `id` done. Returns `false` when it already was, in which case
    /// nothing is written.
    pub fn mark_as_done(&mut self, id: &TaskId) -> Result<bool, StoreError> {
        let pos = self
            .tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;

        if self.tasks[pos].done {
            debug!(id = %id, "task already done");
            return Ok(false);
        }

        let mut next = self.tasks.clone();
        next[pos].done = true;
        self.save(next)?;
        info!(id = %id, "marked task done");
        Ok(true)
    }

    /// Moves unfinished tasks from earlier days onto `reference`'s day at
    /// the configured anchor. Writes only when something moved.
    pub fn roll_over_incomplete_tasks<Tz: TimeZone>(&mut self, reference: &DateTime<Tz>) -> Result<usize, StoreError> {
        let Rollover { tasks, moved } = roll_over(&self.tasks, reference, self.options.rollover_anchor);
        if moved > 0 {
            self.save(tasks)?;
            info!(moved, "rolled over incomplete tasks");
        }
        self.last_rollover = Some(reference.date_naive());
        Ok(moved)
    }

    /// Runs the rollover unless it already ran for `now`'s calendar day.
    pub fn roll_over_if_new_day<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<usize, StoreError> {
        if self.last_rollover == Some(now.date_naive()) {
            return Ok(0);
        }
        self.roll_over_incomplete_tasks(now)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn tasks_for_day<Tz: TimeZone>(&self, day: &DateTime<Tz>) -> Vec<&Task> {
        select_for_day(&self.tasks, day)
    }

    /// Resolves a full id or a unique id prefix.
    pub fn resolve_id(&self, prefix: &str) -> Result<TaskId, StoreError> {
        if let Some(task) = self.tasks.iter().find(|t| t.id.as_str() == prefix) {
            return Ok(task.id.clone());
        }

        let matches: Vec<&Task> = if prefix.is_empty() {
            Vec::new()
        } else {
            self.tasks.iter().filter(|t| t.id.as_str().starts_with(prefix)).collect()
        };
        match matches.as_slice() {
            [only] => Ok(only.id.clone()),
            [] => Err(StoreError::TaskNotFound(TaskId::from(prefix))),
            _ => Err(StoreError::AmbiguousId {
                prefix: prefix.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// True after an optimistic save whose write failed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
