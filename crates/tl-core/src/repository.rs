//! The storage port the engine persists tasks through.
//!
//! The engine never talks to a database directly. A repository loads and
//! saves whole tasks, and exposes invalidation hooks for any read caches it
//! keeps. Implementations are expected to make a save atomic with respect to
//! the task's `version` token.

use std::fmt;

use thiserror::Error;

use crate::task::Task;
use crate::types::{ProjectId, TaskId};

/// Errors returned by a [`TaskRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The stored task changed since it was read.
    #[error("task {task_id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        task_id: TaskId,
        expected: i64,
        actual: i64,
    },
    /// No task with this ID exists.
    #[error("task not found: {task_id}")]
    NotFound { task_id: TaskId },
    /// The backing store could not be reached or failed.
    #[error("repository unavailable: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Returns true for failures that may succeed on a later attempt.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Cache entries a repository may hold for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The full task listing.
    Tasks,
    /// A single task.
    Task(TaskId),
    /// The task listing of one project.
    ProjectTasks(ProjectId),
}

impl CacheKey {
    /// The keys to invalidate after `task` was written.
    pub fn affected_by(task: &Task) -> Vec<Self> {
        let mut keys = vec![Self::Tasks, Self::Task(task.id.clone())];
        if let Some(project_id) = task.project_id() {
            keys.push(Self::ProjectTasks(project_id.clone()));
        }
        keys
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tasks => write!(f, "tasks"),
            Self::Task(id) => write!(f, "task:{id}"),
            Self::ProjectTasks(id) => write!(f, "tasks?project_tasks={id}"),
        }
    }
}

/// Loads and stores tasks.
pub trait TaskRepository {
    /// Loads a task by ID.
    fn get(&mut self, id: &TaskId) -> Result<Task, RepositoryError>;

    /// Writes a task, returning the stored version.
    ///
    /// Fails with [`RepositoryError::Conflict`] if `task.version` is stale.
    fn save(&mut self, task: &Task) -> Result<Task, RepositoryError>;

    /// Drops any cached data stored under `key`.
    fn invalidate(&mut self, key: &CacheKey);
}
