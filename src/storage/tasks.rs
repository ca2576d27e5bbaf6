//! Task operations on the `task` table

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};
use crate::task::{self, NewTask, Task, TaskAction, TaskStatus, TaskSummary};
use crate::{Error, Result};
use super::sqlite::{report, SqliteStore};

const TASK_COLUMNS: &str = "task_id, title, description, status, assigned_to, manager, feedback";

impl SqliteStore {
    // ========== Task Operations ==========

    /// Insert a task in the `Assigned` state, returning its generated id.
    pub fn try_create_task(&self, task: &NewTask) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO task (title, description, status, assigned_to, manager, feedback)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                task.title,
                task.description,
                TaskStatus::Assigned.as_str(),
                task.assigned_to,
                task.manager,
                task.feedback,
            ],
        )?;

        let id = conn.last_insert_rowid();
        info!(id, title = %task.title, "Task created");
        Ok(id)
    }

    pub fn create_task(&self, task: &NewTask) -> bool {
        report("create_task", self.try_create_task(task)).is_some()
    }

    /// Move a task to `status` if the lifecycle allows it from its current state.
    ///
    /// The guard is part of the UPDATE itself, so a concurrent change between
    /// read and write cannot slip an illegal transition through. When nothing
    /// matched, the task is re-read inside the same write transaction only to
    /// explain why.
    pub fn try_set_status(&self, task_id: i64, status: TaskStatus) -> Result<TaskStatus> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let predecessors = status.allowed_predecessors();

        if !predecessors.is_empty() {
            let allowed = predecessors
                .iter()
                .map(|s| format!("'{}'", s.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            let updated = tx.execute(
                &format!("UPDATE task SET status = ?1 WHERE task_id = ?2 AND status IN ({allowed})"),
                params![status.as_str(), task_id],
            )?;
            if updated > 0 {
                tx.commit()?;
                info!(task_id, %status, "Task status updated");
                return Ok(status);
            }
        }

        let current = find_task_on(&tx, task_id)?.map(|task| task.status);
        Err(unchanged_reason(task_id, current, status))
    }

    pub fn set_status(&self, task_id: i64, status: TaskStatus) -> bool {
        report("set_status", self.try_set_status(task_id, status)).is_some()
    }

    /// Apply an employee action (accept, reject, complete)
    pub fn try_apply_action(&self, task_id: i64, action: TaskAction) -> Result<TaskStatus> {
        debug!(task_id, %action, "Applying task action");
        self.try_set_status(task_id, action.target())
    }

    pub fn apply_action(&self, task_id: i64, action: TaskAction) -> bool {
        report("apply_action", self.try_apply_action(task_id, action)).is_some()
    }

    /// Replace every mutable field of a task, keyed by id.
    ///
    /// Administrative override: the status is written as given, without
    /// consulting the lifecycle.
    pub fn try_update_task(&self, task: &Task) -> Result<()> {
        let conn = self.connect()?;
        let updated = conn.execute(
            r#"
            UPDATE task
            SET title = ?1, description = ?2, status = ?3, assigned_to = ?4, manager = ?5, feedback = ?6
            WHERE task_id = ?7
            "#,
            params![
                task.title,
                task.description,
                task.status.as_str(),
                task.assigned_to,
                task.manager,
                task.feedback,
                task.id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::TaskNotFound(task.id));
        }
        info!(task_id = task.id, status = %task.status, "Task updated");
        Ok(())
    }

    pub fn update_task(&self, task: &Task) -> bool {
        report("update_task", self.try_update_task(task)).is_some()
    }

    /// Tasks assigned to `username`, compared case-insensitively
    pub fn try_find_by_assignee(&self, username: &str) -> Result<Vec<Task>> {
        self.find_tasks_where("LOWER(assigned_to) = LOWER(?1)", username)
    }

    pub fn find_by_assignee(&self, username: &str) -> Vec<Task> {
        report("find_by_assignee", self.try_find_by_assignee(username)).unwrap_or_default()
    }

    /// Tasks supervised by `username`, compared case-insensitively
    pub fn try_find_by_manager(&self, username: &str) -> Result<Vec<Task>> {
        self.find_tasks_where("LOWER(manager) = LOWER(?1)", username)
    }

    pub fn find_by_manager(&self, username: &str) -> Vec<Task> {
        report("find_by_manager", self.try_find_by_manager(username)).unwrap_or_default()
    }

    /// Get a task by id
    pub fn try_find_task(&self, task_id: i64) -> Result<Option<Task>> {
        let conn = self.connect()?;
        find_task_on(&conn, task_id)
    }

    pub fn find_task(&self, task_id: i64) -> Option<Task> {
        report("find_task", self.try_find_task(task_id)).flatten()
    }

    pub fn try_delete_task(&self, task_id: i64) -> Result<()> {
        let conn = self.connect()?;
        let deleted = conn.execute("DELETE FROM task WHERE task_id = ?1", [task_id])?;
        if deleted == 0 {
            return Err(Error::TaskNotFound(task_id));
        }
        info!(task_id, "Task deleted");
        Ok(())
    }

    pub fn delete_task(&self, task_id: i64) -> bool {
        report("delete_task", self.try_delete_task(task_id)).is_some()
    }

    /// Every task in storage order, without feedback
    pub fn try_list_tasks(&self) -> Result<Vec<TaskSummary>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT task_id, title, description, status, assigned_to, manager FROM task",
        )?;
        let tasks = stmt
            .query_map([], |row| {
                Ok(TaskSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    status: parse_status(row, 3)?,
                    assigned_to: row.get(4)?,
                    manager: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn list_tasks(&self) -> Vec<TaskSummary> {
        report("list_tasks", self.try_list_tasks()).unwrap_or_default()
    }

    /// Count all tasks
    pub fn count_tasks(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM task", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn find_tasks_where(&self, predicate: &str, value: &str) -> Result<Vec<Task>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE {predicate} ORDER BY task_id"
        ))?;
        let tasks = stmt
            .query_map([value], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }
}

fn find_task_on(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM task WHERE task_id = ?1"),
        [task_id],
        row_to_task,
    )
    .optional()
    .map_err(Into::into)
}

/// Why a guarded status UPDATE matched no row.
///
/// A task sitting in an allowed predecessor state means the row changed
/// between the UPDATE and the re-read, so nothing was written.
fn unchanged_reason(task_id: i64, current: Option<TaskStatus>, requested: TaskStatus) -> Error {
    match current {
        None => Error::TaskNotFound(task_id),
        Some(current) => match task::transition(current, requested) {
            Ok(_) => Error::StatusChanged(task_id),
            Err(e) => e,
        },
    }
}

fn parse_status(row: &Row, idx: usize) -> rusqlite::Result<TaskStatus> {
    let status_str: String = row.get(idx)?;
    status_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Helper to convert a row to a Task
fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: parse_status(row, 3)?,
        assigned_to: row.get(4)?,
        manager: row.get(5)?,
        feedback: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn open() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_path(dir.path().join("hr.db"));
        (dir, store)
    }

    fn sample_task(title: &str) -> NewTask {
        NewTask::new(title, format!("{title} details"), "alice", "hana")
    }

    #[test]
    fn test_create_forces_assigned() {
        let (_dir, store) = open();
        let id = store.try_create_task(&sample_task("Audit").with_feedback("Start Monday")).unwrap();

        let task = store.find_task(id).unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.title, "Audit");
        assert_eq!(task.feedback.as_deref(), Some("Start Monday"));
    }

    #[test]
    fn test_create_allows_duplicates() {
        let (_dir, store) = open();
        assert!(store.create_task(&sample_task("Audit")));
        assert!(store.create_task(&sample_task("Audit")));
        assert_eq!(store.count_tasks().unwrap(), 2);
    }

    #[test]
    fn test_accept_then_complete() {
        let (_dir, store) = open();
        let id = store.try_create_task(&sample_task("Audit")).unwrap();

        assert!(store.set_status(id, TaskStatus::Accepted));
        assert!(store.set_status(id, TaskStatus::Completed));
        assert_eq!(store.find_task(id).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_invalid_transitions_leave_status_alone() {
        let (_dir, store) = open();
        let id = store.try_create_task(&sample_task("Audit")).unwrap();

        let err = store.try_set_status(id, TaskStatus::Completed).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition { from: TaskStatus::Assigned, to: TaskStatus::Completed }
        ));

        assert!(store.apply_action(id, TaskAction::Reject));
        assert!(!store.apply_action(id, TaskAction::Accept));
        assert!(!store.set_status(id, TaskStatus::Assigned));
        assert_eq!(store.find_task(id).unwrap().status, TaskStatus::Rejected);
    }

    #[test]
    fn test_set_status_missing_task() {
        let (_dir, store) = open();
        assert!(matches!(
            store.try_set_status(42, TaskStatus::Accepted),
            Err(Error::TaskNotFound(42))
        ));
        assert!(!store.set_status(42, TaskStatus::Assigned));
    }

    #[test]
    fn test_update_overrides_lifecycle() {
        let (_dir, store) = open();
        let id = store.try_create_task(&sample_task("Audit")).unwrap();
        store.try_set_status(id, TaskStatus::Accepted).unwrap();
        store.try_set_status(id, TaskStatus::Completed).unwrap();

        let replacement = Task {
            id,
            title: "Re-audit".into(),
            description: "Redo the numbers".into(),
            status: TaskStatus::Assigned,
            assigned_to: Some("bob".into()),
            manager: Some("carol".into()),
            feedback: Some("Missed two invoices".into()),
        };
        assert!(store.update_task(&replacement));
        assert_eq!(store.find_task(id).unwrap(), replacement);
    }

    #[test]
    fn test_update_missing_task() {
        let (_dir, store) = open();
        let id = store.try_create_task(&sample_task("Audit")).unwrap();
        let before = store.find_task(id).unwrap();

        let ghost = Task { id: id + 100, ..before.clone() };
        assert!(matches!(store.try_update_task(&ghost), Err(Error::TaskNotFound(_))));
        assert_eq!(store.find_task(id).unwrap(), before);
        assert_eq!(store.count_tasks().unwrap(), 1);
    }

    #[test]
    fn test_lookups_ignore_case() {
        let (_dir, store) = open();
        store.try_create_task(&NewTask::new("A", "a", "alice", "Hana")).unwrap();
        store.try_create_task(&NewTask::new("B", "b", "bob", "hana")).unwrap();

        let mine = store.find_by_assignee("Alice");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "A");

        let managed = store.find_by_manager("HANA");
        assert_eq!(managed.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(store.find_by_assignee("carol").is_empty());
    }

    #[test]
    fn test_delete_task() {
        let (_dir, store) = open();
        let id = store.try_create_task(&sample_task("Audit")).unwrap();

        assert!(!store.delete_task(id + 1));
        assert!(store.delete_task(id));
        assert!(!store.delete_task(id));
        assert!(store.find_task(id).is_none());
    }

    #[test]
    fn test_list_tasks_projection() {
        let (_dir, store) = open();
        store.try_create_task(&sample_task("Audit").with_feedback("hidden")).unwrap();
        store.try_create_task(&sample_task("Report")).unwrap();

        let tasks = store.list_tasks();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().any(|t| t.title == "Audit" && t.status == TaskStatus::Assigned));
        assert_eq!(tasks[0].assigned_to.as_deref(), Some("alice"));
        assert_eq!(tasks[0].manager.as_deref(), Some("hana"));
    }

    #[test]
    fn test_unchanged_reason() {
        assert!(matches!(
            unchanged_reason(7, None, TaskStatus::Accepted),
            Error::TaskNotFound(7)
        ));
        assert!(matches!(
            unchanged_reason(7, Some(TaskStatus::Rejected), TaskStatus::Accepted),
            Error::InvalidTransition { from: TaskStatus::Rejected, to: TaskStatus::Accepted }
        ));

        // Already in a legal predecessor: the row moved under us, nothing was written
        let err = unchanged_reason(7, Some(TaskStatus::Assigned), TaskStatus::Accepted);
        assert!(matches!(err, Error::StatusChanged(7)));
        assert!(err.is_conflict());
    }

    #[test]
    fn test_set_status_after_concurrent_reopen() {
        let (_dir, store) = open();
        let id = store.try_create_task(&sample_task("Audit")).unwrap();
        store.try_apply_action(id, TaskAction::Reject).unwrap();

        // HR reopens the task on another connection and holds the write lock briefly
        let other = Connection::open(store.path()).unwrap();
        other.execute_batch("BEGIN IMMEDIATE").unwrap();
        other
            .execute("UPDATE task SET status = 'Assigned' WHERE task_id = ?1", [id])
            .unwrap();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            other.execute_batch("COMMIT").unwrap();
        });

        let result = store.try_set_status(id, TaskStatus::Accepted);
        writer.join().unwrap();

        assert!(matches!(result, Ok(TaskStatus::Accepted)), "got {result:?}");
        assert_eq!(store.find_task(id).unwrap().status, TaskStatus::Accepted);
    }
}
