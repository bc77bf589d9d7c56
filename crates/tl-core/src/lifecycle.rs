//! The start/stop state machine for a task's clock.
//!
//! This is the only place that mutates and persists a time log. Every
//! operation borrows the caller's task, works on a copy, and returns the
//! task as stored by the repository. On failure nothing is persisted and the
//! caller's task is left as it was.

use chrono::Utc;
use thiserror::Error;

use crate::codec::{self, DecodeError};
use crate::interval::TimeInterval;
use crate::repository::{CacheKey, RepositoryError, TaskRepository};
use crate::task::Task;
use crate::types::{EpochSeconds, TaskId};
use crate::validate::{OverlapError, is_running, validate_for_persist};

/// Errors from clock transitions and log saves.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Start was requested while an interval is open.
    #[error("task {task_id} is already running")]
    AlreadyRunning { task_id: TaskId },
    /// Stop was requested while no interval is open.
    #[error("task {task_id} is not running")]
    NotRunning { task_id: TaskId },
    /// The resulting log would contain overlapping intervals.
    #[error(transparent)]
    Overlap(#[from] OverlapError),
    /// The stored log could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The repository rejected or failed the save.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    /// Returns true if repeating the same call could succeed.
    ///
    /// Validation failures are deterministic; only repository transport
    /// failures are worth retrying.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Repository(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// Whether a task's clock is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
}

impl ClockState {
    pub fn of(log: &[TimeInterval]) -> Self {
        if is_running(log) {
            Self::Running
        } else {
            Self::Idle
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

/// Index of the interval a stop would close.
pub fn latest_open(log: &[TimeInterval]) -> Option<usize> {
    log.iter().rposition(TimeInterval::is_open)
}

/// Seconds since the last interval started, or `0` when idle.
pub fn live_elapsed(log: &[TimeInterval], now: EpochSeconds) -> i64 {
    match log.last() {
        Some(last) if is_running(log) => now.saturating_sub(last.start),
        _ => 0,
    }
}

/// Drives clock transitions for tasks stored in a repository.
pub struct TaskLifecycle<'a, R: TaskRepository + ?Sized> {
    repo: &'a mut R,
}

impl<'a, R: TaskRepository + ?Sized> TaskLifecycle<'a, R> {
    pub const fn new(repo: &'a mut R) -> Self {
        Self { repo }
    }

    /// Starts the task's clock now.
    pub fn start(&mut self, task: &Task) -> Result<Task, LifecycleError> {
        self.start_at(task, Utc::now().timestamp())
    }

    /// Starts the task's clock at `now` by appending an open interval.
    pub fn start_at(&mut self, task: &Task, now: EpochSeconds) -> Result<Task, LifecycleError> {
        let mut log = task.time_log()?;
        if is_running(&log) {
            return Err(LifecycleError::AlreadyRunning {
                task_id: task.id.clone(),
            });
        }

        log.push(TimeInterval::open(now));
        let saved = self.persist(task, &log)?;
        tracing::debug!(task_id = %task.id, start = now, "clock started");
        Ok(saved)
    }

    /// Stops the task's clock now.
    pub fn stop(&mut self, task: &Task) -> Result<Task, LifecycleError> {
        self.stop_at(task, Utc::now().timestamp())
    }

    /// Stops the task's clock at `now` by closing the latest open interval.
    pub fn stop_at(&mut self, task: &Task, now: EpochSeconds) -> Result<Task, LifecycleError> {
        let mut log = task.time_log()?;
        let Some(open) = latest_open(&log) else {
            return Err(LifecycleError::NotRunning {
                task_id: task.id.clone(),
            });
        };

        log[open].stop = now;
        if let Err(err) = validate_for_persist(&log) {
            tracing::warn!(task_id = %task.id, error = %err, "refusing to stop clock");
            return Err(err.into());
        }

        let saved = self.persist(task, &log)?;
        tracing::debug!(task_id = %task.id, stop = now, "clock stopped");
        Ok(saved)
    }

    /// Saves a manually edited log.
    ///
    /// `intervals` may come straight from [`codec::decode_for_editing`]; an
    /// untouched placeholder row is dropped before saving.
    pub fn save_log(
        &mut self,
        task: &Task,
        intervals: Vec<TimeInterval>,
    ) -> Result<Task, LifecycleError> {
        let log = codec::strip_untouched_sentinel(intervals);
        if let Err(err) = validate_for_persist(&log) {
            tracing::warn!(task_id = %task.id, error = %err, "refusing to save time log");
            return Err(err.into());
        }

        let saved = self.persist(task, &log)?;
        tracing::debug!(task_id = %task.id, intervals = log.len(), "time log saved");
        Ok(saved)
    }

    fn persist(&mut self, task: &Task, log: &[TimeInterval]) -> Result<Task, LifecycleError> {
        let saved = self.repo.save(&task.with_time_log(log))?;
        for key in CacheKey::affected_by(&saved) {
            self.repo.invalidate(&key);
        }
        Ok(saved)
    }
}
