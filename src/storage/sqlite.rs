//! SQLite storage implementation

use std::path::{Path, PathBuf};
use rusqlite::Connection;
use crate::config::{self, StoreConfig};
use crate::task::TaskStatus;
use crate::Result;
use super::schema;

/// SQLite-backed store for accounts and tasks.
///
/// The handle only carries configuration. Each operation opens a fresh
/// connection and drops it before returning, so the store can be shared
/// by reference across threads.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    config: StoreConfig,
}

impl SqliteStore {
    /// Create a handle without touching the database
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Create a handle and make sure the schema exists.
    ///
    /// Initialization failures are logged, not returned: the handle is still
    /// usable and later operations report their own failures.
    pub fn open(config: StoreConfig) -> Self {
        let store = Self::new(config);
        if let Err(e) = config::ensure_db_dir(store.path()) {
            tracing::error!(path = %store.path().display(), error = %e, "Could not create database directory");
        }
        match store.initialize() {
            Ok(()) => tracing::debug!(path = %store.path().display(), "Schema ready"),
            Err(e) => tracing::error!(path = %store.path().display(), error = %e, "Error creating tables"),
        }
        store
    }

    /// Open a database file with default settings
    pub fn open_path(path: impl Into<PathBuf>) -> Self {
        Self::open(StoreConfig::new(path))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Open a connection for a single operation
    pub(crate) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.config.path)?;
        conn.busy_timeout(self.config.busy_timeout)?;
        Ok(conn)
    }

    /// Initialize the database schema. Safe to call on every start.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.connect()?;
        let accounts: i64 = conn.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))?;
        let employees: i64 =
            conn.query_row("SELECT COUNT(*) FROM user WHERE role != 'HR'", [], |row| row.get(0))?;

        let mut tasks_by_status = Vec::new();
        for status in TaskStatus::all() {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM task WHERE status = ?1",
                [status.as_str()],
                |row| row.get(0),
            )?;
            tasks_by_status.push((*status, count as usize));
        }

        Ok(DbStats {
            accounts: accounts as usize,
            employees: employees as usize,
            tasks_by_status,
        })
    }
}

/// Collapse a fallible operation into the single failure signal callers see.
///
/// Conflicts (duplicates, missing rows, rejected transitions) are logged as
/// warnings, storage faults as errors.
pub(crate) fn report<T>(operation: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_conflict() => {
            tracing::warn!(operation, error = %e, "Operation rejected");
            None
        }
        Err(e) => {
            tracing::error!(operation, error = %e, "Operation failed");
            None
        }
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DbStats {
    pub accounts: usize,
    pub employees: usize,
    pub tasks_by_status: Vec<(TaskStatus, usize)>,
}

impl DbStats {
    pub fn tasks(&self) -> usize {
        self.tasks_by_status.iter().map(|(_, n)| n).sum()
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Accounts: {} ({} employees)", self.accounts, self.employees)?;
        write!(f, "  Tasks: {}", self.tasks())?;
        for (status, count) in &self.tasks_by_status {
            write!(f, "\n    {}: {}", status, count)?;
        }
        Ok(())
    }
}
