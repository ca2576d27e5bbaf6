//! Database schema definitions

/// SQL to create the user table
pub const CREATE_USER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    role TEXT NOT NULL CHECK(role IN ('Employee', 'HR')),
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    department TEXT,
    job_title TEXT,
    email TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the task table
///
/// The foreign keys are declarative only: the store never turns on
/// `PRAGMA foreign_keys`, so deleting a user leaves its task rows intact.
pub const CREATE_TASK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS task (
    task_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('Assigned', 'Accepted', 'Rejected', 'Completed')),
    assigned_to TEXT,
    manager TEXT,
    feedback TEXT,
    FOREIGN KEY (assigned_to) REFERENCES user (username),
    FOREIGN KEY (manager) REFERENCES user (username)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_task_assigned_to ON task(LOWER(assigned_to))",
    "CREATE INDEX IF NOT EXISTS idx_task_manager ON task(LOWER(manager))",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_USER_TABLE, CREATE_TASK_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
