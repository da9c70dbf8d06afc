//! SQLite implementation of the TaskRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, ToSql};
use taskbridge_common::storage::SqlitePool;
use taskbridge_core::conflict::assert_no_conflict;
use taskbridge_core::tasks::ports::{AffectedIds, TaskRepository};
use taskbridge_core::tasks::query::{SortField, SortOrder, TaskQuery};
use taskbridge_domain::{BoundaryPolicy, Result, Task, TaskBridgeError};
use tracing::{debug, instrument};

use super::rows::{task_from_row, ts_opt, TASK_COLUMNS};
use crate::errors::to_domain;

/// SQLite implementation of [`TaskRepository`].
pub struct SqliteTaskRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteTaskRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<taskbridge_common::storage::pool::SqliteConnection> {
        self.pool.get().map_err(to_domain)
    }
}

fn load_user_tasks(conn: &Connection, user_id: &str) -> Result<Vec<Task>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1"))
        .map_err(to_domain)?;
    let rows = stmt
        .query_map(params![user_id], task_from_row)
        .map_err(to_domain)?;
    rows.collect::<rusqlite::Result<Vec<Task>>>()
        .map_err(to_domain)
}

fn write_task(conn: &Connection, sql: &str, task: &Task) -> Result<usize> {
    let rule_json = match &task.recurrence_rule {
        Some(rule) => Some(rule.to_json()?),
        None => None,
    };
    let attendees_json = serde_json::to_string(&task.attendees)
        .map_err(to_domain)?;

    conn.execute(
        sql,
        params![
            task.id,
            task.user_id,
            task.name,
            task.description,
            task.location,
            attendees_json,
            super::rows::importance_to_str(task.importance),
            task.reminder,
            ts_opt(task.start_time),
            ts_opt(task.end_time),
            ts_opt(task.due_date),
            super::rows::schedule_type_to_str(task.schedule_type),
            rule_json,
            task.parent_task_id,
            task.completed,
            task.pushed_to_mstodo,
            task.created_at.timestamp(),
            task.updated_at.timestamp(),
        ],
    )
    .map_err(to_domain)
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    /// Insert with write-time conflict re-validation in blocking mode.
    ///
    /// The check and the insert run on one connection without a suspension
    /// point between them, so interleaved admissions observe each other's
    /// committed rows.
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn insert_task(
        &self,
        task: &Task,
        policy: BoundaryPolicy,
        allow_conflict: bool,
    ) -> Result<AffectedIds> {
        let conn = self.conn()?;
        if !allow_conflict {
            let existing = load_user_tasks(&conn, &task.user_id)?;
            assert_no_conflict(&existing, task, policy)?;
        }

        write_task(
            &conn,
            "INSERT INTO tasks (id, user_id, name, description, location, attendees, \
             importance, reminder, start_ts, end_ts, due_ts, schedule_type, recurrence_rule, \
             parent_task_id, completed, pushed_to_mstodo, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            task,
        )?;

        debug!(user_id = %task.user_id, "task inserted");
        Ok(AffectedIds::added(task.id.clone()))
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn update_task(
        &self,
        task: &Task,
        policy: BoundaryPolicy,
        allow_conflict: bool,
    ) -> Result<AffectedIds> {
        let conn = self.conn()?;
        if !allow_conflict {
            // The task's own prior row is excluded by id inside the detector
            let existing = load_user_tasks(&conn, &task.user_id)?;
            assert_no_conflict(&existing, task, policy)?;
        }

        let changed = write_task(
            &conn,
            "UPDATE tasks SET user_id = ?2, name = ?3, description = ?4, location = ?5, \
             attendees = ?6, importance = ?7, reminder = ?8, start_ts = ?9, end_ts = ?10, \
             due_ts = ?11, schedule_type = ?12, recurrence_rule = ?13, parent_task_id = ?14, \
             completed = ?15, pushed_to_mstodo = ?16, created_at = ?17, updated_at = ?18 \
             WHERE id = ?1",
            task,
        )?;
        if changed == 0 {
            return Err(TaskBridgeError::NotFound(format!("task {}", task.id)));
        }

        Ok(AffectedIds::updated(task.id.clone()))
    }

    async fn find_task(&self, user_id: &str, id: &str) -> Result<Option<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 AND id = ?2"
            ))
            .map_err(to_domain)?;

        match stmt.query_row(params![user_id, id], task_from_row) {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(to_domain(e)),
        }
    }

    async fn all_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        let conn = self.conn()?;
        load_user_tasks(&conn, user_id)
    }

    #[instrument(skip(self, query))]
    async fn list_tasks(&self, user_id: &str, query: &TaskQuery) -> Result<Vec<Task>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?");
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.to_string())];

        // Window overlap: end_ts >= start AND start_ts <= end
        if let Some(start) = query.window_start {
            sql.push_str(" AND end_ts >= ?");
            values.push(Box::new(start.timestamp()));
        }
        if let Some(end) = query.window_end {
            sql.push_str(" AND start_ts <= ?");
            values.push(Box::new(end.timestamp()));
        }
        if let Some(completed) = query.completed {
            sql.push_str(" AND completed = ?");
            values.push(Box::new(completed));
        }
        if let Some(text) = query.text.as_deref() {
            sql.push_str(" AND (name LIKE ? OR description LIKE ? OR location LIKE ?)");
            let needle = format!("%{text}%");
            values.push(Box::new(needle.clone()));
            values.push(Box::new(needle.clone()));
            values.push(Box::new(needle));
        }

        // Sort column comes from a fixed allow-list, never from input text
        let column = match query.sort_by {
            SortField::StartTime => "start_ts",
            SortField::EndTime => "end_ts",
            SortField::DueDate => "due_ts",
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
        };
        let direction = match query.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY {column} {direction} LIMIT ? OFFSET ?"));
        values.push(Box::new(query.effective_limit()));
        values.push(Box::new(query.offset));

        let mut stmt =
            conn.prepare(&sql).map_err(to_domain)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter().map(|value| &**value)), task_from_row)
            .map_err(to_domain)?;
        rows.collect::<rusqlite::Result<Vec<Task>>>()
            .map_err(to_domain)
    }

    async fn occurrences_of(&self, user_id: &str, root_id: &str) -> Result<Vec<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks \
                 WHERE user_id = ?1 AND parent_task_id = ?2 ORDER BY start_ts ASC"
            ))
            .map_err(to_domain)?;
        let rows = stmt
            .query_map(params![user_id, root_id], task_from_row)
            .map_err(to_domain)?;
        rows.collect::<rusqlite::Result<Vec<Task>>>()
            .map_err(to_domain)
    }

    #[instrument(skip(self))]
    async fn delete_task(&self, user_id: &str, id: &str) -> Result<AffectedIds> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM tasks WHERE user_id = ?1 AND id = ?2", params![user_id, id])
            .map_err(to_domain)?;

        if removed > 0 {
            Ok(AffectedIds::deleted(vec![id.to_string()]))
        } else {
            Ok(AffectedIds::default())
        }
    }

    #[instrument(skip(self))]
    async fn delete_tasks_by_pattern(
        &self,
        user_id: &str,
        id_pattern: &str,
    ) -> Result<AffectedIds> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT id FROM tasks WHERE user_id = ?1 AND id LIKE ?2")
            .map_err(to_domain)?;
        let ids = stmt
            .query_map(params![user_id, id_pattern], |row| row.get::<_, String>(0))
            .map_err(to_domain)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(to_domain)?;

        conn.execute(
            "DELETE FROM tasks WHERE user_id = ?1 AND id LIKE ?2",
            params![user_id, id_pattern],
        )
        .map_err(to_domain)?;

        debug!(user_id, pattern = id_pattern, removed = ids.len(), "batch retracted");
        Ok(AffectedIds::deleted(ids))
    }

    async fn pending_export(&self, limit: usize) -> Result<Vec<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks \
                 WHERE completed = 1 AND pushed_to_mstodo = 0 \
                 ORDER BY updated_at ASC LIMIT ?1"
            ))
            .map_err(to_domain)?;
        let rows = stmt
            .query_map(params![limit as i64], task_from_row)
            .map_err(to_domain)?;
        rows.collect::<rusqlite::Result<Vec<Task>>>()
            .map_err(to_domain)
    }

    async fn mark_pushed(&self, user_id: &str, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE tasks SET pushed_to_mstodo = 1 WHERE user_id = ?1 AND id = ?2",
                params![user_id, id],
            )
            .map_err(to_domain)?;
        if changed == 0 {
            return Err(TaskBridgeError::NotFound(format!("task {id}")));
        }
        Ok(())
    }
}
