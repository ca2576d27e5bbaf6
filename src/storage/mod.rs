//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - user(user_id, username, password, role, first_name, last_name, department, job_title, email)
//! - task(task_id, title, description, status, assigned_to, manager, feedback)
//!
//! Every operation opens its own connection and issues a single statement.

pub mod schema;
pub mod sqlite;
mod accounts;
mod tasks;

pub use sqlite::{SqliteStore, DbStats};
