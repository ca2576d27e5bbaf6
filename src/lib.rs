//! # Staffdesk - Employee and Task Store
//!
//! Data-access and task-lifecycle layer for a small HR desk.
//!
//! Staffdesk provides:
//! - Account store: employee and HR accounts with unique usernames and emails
//! - Task store: task assignment, manager lookup, and HR overrides
//! - A guarded task status state machine (`Assigned -> Accepted -> Completed`)
//! - SQLite-backed storage, one connection per operation
//! - An operator console built on the same public API

pub mod account;
pub mod task;
pub mod storage;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use account::{Account, AccountSummary, NewAccount, Role};
pub use task::{NewTask, Task, TaskAction, TaskStatus, TaskSummary};
pub use storage::SqliteStore;
pub use config::{DanglingReferences, StaffdeskConfig, StoreConfig, UsernameMatch};

/// Result type alias for Staffdesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Staffdesk operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("Task {0} changed while its status was being set")]
    StatusChanged(i64),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid task status: {0}")]
    InvalidStatus(String),

    #[error("Storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Conflicts are expected outcomes of a well-formed request (duplicate,
    /// missing target, rejected transition). Everything else is a fault.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Error::DuplicateUsername(_)
                | Error::Constraint(_)
                | Error::AccountNotFound(_)
                | Error::TaskNotFound(_)
                | Error::InvalidTransition { .. }
                | Error::StatusChanged(_)
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Constraint(msg.unwrap_or_else(|| e.to_string()))
            }
            other => Error::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_failures_are_conflicts() {
        let raw = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: user.email".to_string()),
        );
        let err = Error::from(raw);
        assert!(matches!(err, Error::Constraint(ref m) if m.contains("user.email")));
        assert!(err.is_conflict());
    }

    #[test]
    fn test_other_failures_are_faults() {
        let err = Error::from(rusqlite::Error::InvalidQuery);
        assert!(matches!(err, Error::Storage(_)));
        assert!(!err.is_conflict());
        assert!(std::error::Error::source(&err).is_some());
    }
}
