//! Tasks: units of work that own a time log.

use serde::{Deserialize, Serialize};

use crate::codec::{self, DecodeError};
use crate::interval::TimeInterval;
use crate::types::{ClientId, ProjectId, TaskId};

/// The project a task belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: ProjectId,
    pub name: String,
}

/// A unit of work with a stored time log.
///
/// The time log is kept in its stored text form; use [`Task::time_log`] to
/// decode it. Client, user and status references are opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    /// Hourly rate used to price invoice line items.
    pub rate: f64,
    /// Stored encoding of the time log.
    #[serde(default)]
    pub time_log: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    /// Set once the task has been billed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    /// Concurrency token owned by the repository.
    #[serde(default)]
    pub version: i64,
}

impl Task {
    /// Creates a task with an empty time log.
    pub fn new(id: TaskId, description: impl Into<String>, rate: f64) -> Self {
        Self {
            id,
            description: description.into(),
            rate,
            time_log: String::new(),
            client_id: None,
            project: None,
            assigned_user_id: None,
            status_id: None,
            invoice_id: None,
            version: 0,
        }
    }

    /// Decodes the stored time log.
    pub fn time_log(&self) -> Result<Vec<TimeInterval>, DecodeError> {
        codec::decode(&self.time_log)
    }

    /// Returns a copy of this task carrying `log` as its stored time log.
    pub fn with_time_log(&self, log: &[TimeInterval]) -> Self {
        Self {
            time_log: codec::encode(log),
            ..self.clone()
        }
    }

    /// Returns true once an invoice references this task.
    pub const fn is_invoiced(&self) -> bool {
        self.invoice_id.is_some()
    }

    pub fn project_id(&self) -> Option<&ProjectId> {
        self.project.as_ref().map(|project| &project.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_has_empty_log() {
        let task = Task::new(TaskId::new("t-1").unwrap(), "Design review", 80.0);
        assert!(task.time_log().unwrap().is_empty());
        assert!(!task.is_invoiced());
        assert!(task.project_id().is_none());
    }

    #[test]
    fn with_time_log_encodes_and_leaves_original_untouched() {
        let task = Task::new(TaskId::new("t-1").unwrap(), "Design review", 80.0);
        let updated = task.with_time_log(&[TimeInterval::new(1, 2)]);

        assert_eq!(updated.time_log, "[[1,2]]");
        assert_eq!(updated.id, task.id);
        assert!(task.time_log.is_empty());
    }

    #[test]
    fn task_json_roundtrip() {
        let mut task = Task::new(TaskId::new("t-2").unwrap(), "Support", 50.0);
        task.client_id = Some(ClientId::new("c-1").unwrap());
        task.time_log = "[[10,20]]".to_string();

        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }
}
