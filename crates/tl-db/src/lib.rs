//! Storage layer for tasks and their time logs.
//!
//! Provides a [`TaskRepository`] backed by `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Time Log Storage
//!
//! The `time_log` column holds the task's log in its stored array-of-arrays
//! form, exactly as produced by `tl_core::codec::encode`. The database never
//! interprets it.
//!
//! ## Concurrency
//!
//! Every task row carries a `version` counter. A save only succeeds when the
//! caller's version matches the stored one, and bumps it. Two writers that
//! read the same version cannot both win: the second gets
//! [`RepositoryError::Conflict`].
//!
//! ## Read Cache
//!
//! Task reads are cached under the same [`CacheKey`]s the engine invalidates
//! after a clock transition, so a listing is re-read after any start or stop.

use std::collections::HashMap;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use uuid::Uuid;

use tl_core::{
    CacheKey, ClientId, ProjectId, ProjectRef, RepositoryError, Task, TaskId, TaskRepository,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row violates the task data model.
    #[error("invalid task data for {task_id}: {message}")]
    InvalidTaskData { task_id: String, message: String },
}

impl From<DbError> for RepositoryError {
    fn from(err: DbError) -> Self {
        Self::Network(Box::new(err))
    }
}

/// Fields for a task that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub description: String,
    pub rate: f64,
    pub client_id: Option<ClientId>,
    pub project: Option<ProjectRef>,
    pub assigned_user_id: Option<String>,
    pub status_id: Option<String>,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
    cache: HashMap<CacheKey, Vec<Task>>,
}

const TASK_COLUMNS: &str = "id, description, rate, time_log, client_id, project_id, project_name, \
     assigned_user_id, status_id, invoice_id, version";

/// A task row as stored, before ID validation.
struct TaskRow {
    id: String,
    description: String,
    rate: f64,
    time_log: String,
    client_id: Option<String>,
    project_id: Option<String>,
    project_name: Option<String>,
    assigned_user_id: Option<String>,
    status_id: Option<String>,
    invoice_id: Option<String>,
    version: i64,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            description: row.get(1)?,
            rate: row.get(2)?,
            time_log: row.get(3)?,
            client_id: row.get(4)?,
            project_id: row.get(5)?,
            project_name: row.get(6)?,
            assigned_user_id: row.get(7)?,
            status_id: row.get(8)?,
            invoice_id: row.get(9)?,
            version: row.get(10)?,
        })
    }

    fn into_task(self) -> Result<Task, DbError> {
        let invalid = |message: String| DbError::InvalidTaskData {
            task_id: self.id.clone(),
            message,
        };

        let id = TaskId::new(self.id.clone()).map_err(|e| invalid(e.to_string()))?;
        let client_id = self
            .client_id
            .map(ClientId::new)
            .transpose()
            .map_err(|e| invalid(e.to_string()))?;
        let project = match self.project_id {
            Some(project_id) => Some(ProjectRef {
                id: ProjectId::new(project_id).map_err(|e| invalid(e.to_string()))?,
                name: self.project_name.unwrap_or_default(),
            }),
            None => None,
        };

        Ok(Task {
            id,
            description: self.description,
            rate: self.rate,
            time_log: self.time_log,
            client_id,
            project,
            assigned_user_id: self.assigned_user_id,
            status_id: self.status_id,
            invoice_id: self.invoice_id,
            version: self.version,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            cache: HashMap::new(),
        };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            cache: HashMap::new(),
        };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- time_log: stored array-of-arrays encoding ('' or '[]' when empty)
            -- version: optimistic concurrency token, bumped on every save
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                rate REAL NOT NULL DEFAULT 0,
                time_log TEXT NOT NULL DEFAULT '',
                client_id TEXT,
                project_id TEXT,
                project_name TEXT,
                assigned_user_id TEXT,
                status_id TEXT,
                invoice_id TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_client ON tasks(client_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts a new task with an empty time log.
    pub fn create_task(&mut self, new: NewTask) -> Result<Task, DbError> {
        let id = Uuid::new_v4().to_string();
        let now = format_timestamp();
        let (project_id, project_name) = new
            .project
            .as_ref()
            .map(|p| (p.id.as_str(), p.name.as_str()))
            .unzip();
        self.conn.execute(
            "
            INSERT INTO tasks
            (id, created_at, updated_at, description, rate, time_log, client_id, project_id,
             project_name, assigned_user_id, status_id, invoice_id, version)
            VALUES (?, ?, ?, ?, ?, '', ?, ?, ?, ?, ?, NULL, 0)
            ",
            params![
                id,
                now,
                now,
                new.description,
                new.rate,
                new.client_id.as_ref().map(ClientId::as_str),
                project_id,
                project_name,
                new.assigned_user_id,
                new.status_id,
            ],
        )?;

        let task = self.load_task(&id)?.ok_or_else(|| DbError::InvalidTaskData {
            task_id: id.clone(),
            message: "row missing after insert".to_string(),
        })?;
        for key in CacheKey::affected_by(&task) {
            self.invalidate(&key);
        }
        tracing::debug!(task_id = %task.id, "task created");
        Ok(task)
    }

    /// Lists all tasks ordered by creation time.
    pub fn list_tasks(&mut self) -> Result<Vec<Task>, DbError> {
        if let Some(tasks) = self.cache.get(&CacheKey::Tasks) {
            return Ok(tasks.clone());
        }
        let tasks = self.query_tasks("ORDER BY created_at ASC, rowid ASC", &[])?;
        self.cache.insert(CacheKey::Tasks, tasks.clone());
        Ok(tasks)
    }

    /// Lists the tasks of one project ordered by creation time.
    pub fn list_project_tasks(&mut self, project_id: &ProjectId) -> Result<Vec<Task>, DbError> {
        let key = CacheKey::ProjectTasks(project_id.clone());
        if let Some(tasks) = self.cache.get(&key) {
            return Ok(tasks.clone());
        }
        let tasks = self.query_tasks(
            "WHERE project_id = ? ORDER BY created_at ASC, rowid ASC",
            &[project_id.as_str()],
        )?;
        self.cache.insert(key, tasks.clone());
        Ok(tasks)
    }

    /// Returns true if reads for `key` are currently served from the cache.
    pub fn is_cached(&self, key: &CacheKey) -> bool {
        self.cache.contains_key(key)
    }

    fn query_tasks(&self, clause: &str, args: &[&str]) -> Result<Vec<Task>, DbError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks {clause}");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), TaskRow::from_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?.into_task()?);
        }
        Ok(tasks)
    }

    fn load_task(&self, id: &str) -> Result<Option<Task>, DbError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");
        let row = self
            .conn
            .query_row(&sql, [id], TaskRow::from_row)
            .optional()?;
        row.map(TaskRow::into_task).transpose()
    }

    /// Writes `task` if its version is current, inside one transaction.
    fn save_task(&mut self, task: &Task) -> Result<Task, RepositoryError> {
        let tx = self.conn.transaction().map_err(DbError::from)?;
        let changed = tx
            .execute(
                "
                UPDATE tasks SET
                    updated_at = ?,
                    description = ?,
                    rate = ?,
                    time_log = ?,
                    client_id = ?,
                    project_id = ?,
                    project_name = ?,
                    assigned_user_id = ?,
                    status_id = ?,
                    invoice_id = ?,
                    version = version + 1
                WHERE id = ? AND version = ?
                ",
                params![
                    format_timestamp(),
                    task.description,
                    task.rate,
                    task.time_log,
                    task.client_id.as_ref().map(ClientId::as_str),
                    task.project_id().map(ProjectId::as_str),
                    task.project.as_ref().map(|p| p.name.as_str()),
                    task.assigned_user_id,
                    task.status_id,
                    task.invoice_id,
                    task.id.as_str(),
                    task.version,
                ],
            )
            .map_err(DbError::from)?;

        if changed == 0 {
            let actual: Option<i64> = tx
                .query_row(
                    "SELECT version FROM tasks WHERE id = ?",
                    [task.id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(DbError::from)?;
            return Err(match actual {
                Some(actual) => RepositoryError::Conflict {
                    task_id: task.id.clone(),
                    expected: task.version,
                    actual,
                },
                None => RepositoryError::NotFound {
                    task_id: task.id.clone(),
                },
            });
        }
        tx.commit().map_err(DbError::from)?;

        Ok(Task {
            version: task.version + 1,
            ..task.clone()
        })
    }
}

impl TaskRepository for Database {
    fn get(&mut self, id: &TaskId) -> Result<Task, RepositoryError> {
        let key = CacheKey::Task(id.clone());
        if let Some(task) = self.cache.get(&key).and_then(|tasks| tasks.first()) {
            return Ok(task.clone());
        }
        let task = self
            .load_task(id.as_str())?
            .ok_or_else(|| RepositoryError::NotFound {
                task_id: id.clone(),
            })?;
        self.cache.insert(key, vec![task.clone()]);
        Ok(task)
    }

    fn save(&mut self, task: &Task) -> Result<Task, RepositoryError> {
        let saved = self.save_task(task)?;
        tracing::debug!(task_id = %saved.id, version = saved.version, "task saved");
        Ok(saved)
    }

    fn invalidate(&mut self, key: &CacheKey) {
        if self.cache.remove(key).is_some() {
            tracing::debug!(%key, "cache entry evicted");
        }
    }
}

fn format_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
