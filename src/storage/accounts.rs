//! Account operations on the `user` table

use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};
use crate::account::{Account, AccountSummary, NewAccount, Role};
use crate::config::{DanglingReferences, UsernameMatch};
use crate::{Error, Result};
use super::sqlite::{report, SqliteStore};

const ACCOUNT_COLUMNS: &str =
    "user_id, username, password, role, first_name, last_name, department, job_title, email";

impl SqliteStore {
    // ========== Account Operations ==========

    /// Insert an account, returning its generated id.
    ///
    /// The case-insensitive username check and the insert are one statement.
    /// A duplicate email is rejected by the UNIQUE constraint.
    pub fn try_create_account(&self, account: &NewAccount) -> Result<i64> {
        let conn = self.connect()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO user (username, password, role, first_name, last_name, department, job_title, email)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
            WHERE NOT EXISTS (SELECT 1 FROM user WHERE LOWER(username) = LOWER(?1))
            "#,
            params![
                account.username,
                account.password,
                account.role.as_str(),
                account.first_name,
                account.last_name,
                account.department,
                account.job_title,
                account.email,
            ],
        )?;

        if inserted == 0 {
            return Err(Error::DuplicateUsername(account.username.clone()));
        }

        let id = conn.last_insert_rowid();
        info!(username = %account.username, id, "Account created");
        Ok(id)
    }

    pub fn create_account(&self, account: &NewAccount) -> bool {
        report("create_account", self.try_create_account(account)).is_some()
    }

    /// Delete one account by username.
    ///
    /// With [`DanglingReferences::Clear`] the account's task references are
    /// nulled in the same transaction; otherwise tasks keep the username.
    pub fn try_delete_account(&self, username: &str) -> Result<()> {
        let mut conn = self.connect()?;

        let deleted = match self.config().on_account_delete {
            DanglingReferences::Preserve => conn.execute(
                &format!("DELETE FROM user WHERE {}", self.username_clause()),
                [username],
            )?,
            DanglingReferences::Clear => {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let stored: Option<(i64, String)> = tx
                    .query_row(
                        &format!("SELECT user_id, username FROM user WHERE {}", self.username_clause()),
                        [username],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                let Some((user_id, stored)) = stored else {
                    return Err(Error::AccountNotFound(username.to_string()));
                };

                let unassigned = tx.execute(
                    "UPDATE task SET assigned_to = NULL WHERE LOWER(assigned_to) = LOWER(?1)",
                    [&stored],
                )?;
                let unmanaged = tx.execute(
                    "UPDATE task SET manager = NULL WHERE LOWER(manager) = LOWER(?1)",
                    [&stored],
                )?;
                let deleted = tx.execute("DELETE FROM user WHERE user_id = ?1", [user_id])?;
                tx.commit()?;
                debug!(username = %stored, unassigned, unmanaged, "Cleared task references");
                deleted
            }
        };

        if deleted == 0 {
            return Err(Error::AccountNotFound(username.to_string()));
        }
        info!(username, "Account deleted");
        Ok(())
    }

    pub fn delete_account(&self, username: &str) -> bool {
        report("delete_account", self.try_delete_account(username)).is_some()
    }

    /// Look up an account by exact username and password.
    pub fn try_find_by_credentials(&self, username: &str, password: &str) -> Result<Option<Account>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM user WHERE username = ?1 AND password = ?2 LIMIT 1"),
            [username, password],
            row_to_account,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn find_by_credentials(&self, username: &str, password: &str) -> Option<Account> {
        report("find_by_credentials", self.try_find_by_credentials(username, password)).flatten()
    }

    /// Look up an account without a password check.
    ///
    /// Administrative lookup: callers must only expose this to HR.
    pub fn try_find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM user WHERE username = ?1 LIMIT 1"),
            [username],
            row_to_account,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn find_by_username(&self, username: &str) -> Option<Account> {
        report("find_by_username", self.try_find_by_username(username)).flatten()
    }

    /// Replace name, role, department, job title and email, keyed by username.
    ///
    /// The password and id are never touched.
    pub fn try_update_account(&self, account: &Account) -> Result<()> {
        let conn = self.connect()?;
        let updated = conn.execute(
            &format!(
                "UPDATE user SET first_name = ?2, last_name = ?3, role = ?4, department = ?5, job_title = ?6, email = ?7 WHERE {}",
                self.username_clause()
            ),
            params![
                account.username,
                account.first_name,
                account.last_name,
                account.role.as_str(),
                account.department,
                account.job_title,
                account.email,
            ],
        )?;

        if updated == 0 {
            return Err(Error::AccountNotFound(account.username.clone()));
        }
        info!(username = %account.username, "Account updated");
        Ok(())
    }

    pub fn update_account(&self, account: &Account) -> bool {
        report("update_account", self.try_update_account(account)).is_some()
    }

    /// Usernames of every non-HR account
    pub fn try_list_employee_usernames(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT username FROM user WHERE role != 'HR'")?;
        let usernames = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(usernames)
    }

    pub fn list_employee_usernames(&self) -> Vec<String> {
        report("list_employee_usernames", self.try_list_employee_usernames()).unwrap_or_default()
    }

    /// Administrative listing of every non-HR account
    pub fn try_list_employee_accounts(&self) -> Result<Vec<AccountSummary>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT username, first_name, last_name, email, role, department, job_title FROM user WHERE role != 'HR'",
        )?;
        let accounts = stmt
            .query_map([], |row| {
                Ok(AccountSummary {
                    username: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    email: row.get(3)?,
                    role: parse_role(row, 4)?,
                    department: row.get(5)?,
                    job_title: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    pub fn list_employee_accounts(&self) -> Vec<AccountSummary> {
        report("list_employee_accounts", self.try_list_employee_accounts()).unwrap_or_default()
    }

    /// Count all accounts
    pub fn count_accounts(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// WHERE clause selecting at most one account by `?1`
    fn username_clause(&self) -> &'static str {
        match self.config().username_match {
            UsernameMatch::Exact => "username = ?1",
            UsernameMatch::CaseInsensitive => {
                "user_id = (SELECT user_id FROM user WHERE LOWER(username) = LOWER(?1) ORDER BY user_id LIMIT 1)"
            }
        }
    }
}

fn parse_role(row: &Row, idx: usize) -> rusqlite::Result<Role> {
    let role_str: String = row.get(idx)?;
    role_str.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Helper to convert a row to an Account
fn row_to_account(row: &Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        role: parse_role(row, 3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        department: row.get(6)?,
        job_title: row.get(7)?,
        email: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::task::NewTask;
    use rusqlite::Connection;
    use std::time::Duration;
    use tempfile::TempDir;

    fn open(config: impl FnOnce(StoreConfig) -> StoreConfig) -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(config(StoreConfig::new(dir.path().join("hr.db"))));
        (dir, store)
    }

    fn alice() -> NewAccount {
        NewAccount::new("alice", "s3cret", Role::Employee, "Alice", "Smith", "alice@example.com")
            .with_department("Finance")
            .with_job_title("Analyst")
    }

    #[test]
    fn test_create_then_login() {
        let (_dir, store) = open(|c| c);
        assert!(store.create_account(&alice()));

        let account = store.find_by_credentials("alice", "s3cret").unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.role, Role::Employee);
        assert_eq!(account.department.as_deref(), Some("Finance"));
        assert_eq!(account.job_title.as_deref(), Some("Analyst"));
        assert_eq!(account.email, "alice@example.com");
    }

    #[test]
    fn test_credentials_are_case_sensitive() {
        let (_dir, store) = open(|c| c);
        store.try_create_account(&alice()).unwrap();

        assert!(store.find_by_credentials("Alice", "s3cret").is_none());
        assert!(store.find_by_credentials("alice", "S3CRET").is_none());
        assert!(store.find_by_credentials("alice", "wrong").is_none());
    }

    #[test]
    fn test_case_variant_username_rejected() {
        let (_dir, store) = open(|c| c);
        store.try_create_account(&alice()).unwrap();

        let variant = NewAccount::new("ALICE", "pw", Role::Employee, "A", "S", "other@example.com");
        let err = store.try_create_account(&variant).unwrap_err();
        assert!(matches!(err, Error::DuplicateUsername(ref u) if u == "ALICE"));
        assert!(!store.create_account(&variant));
        assert_eq!(store.count_accounts().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_email_rejected_by_constraint() {
        let (_dir, store) = open(|c| c);
        store.try_create_account(&alice()).unwrap();

        let clash = NewAccount::new("bob", "pw", Role::Employee, "Bob", "Lee", "alice@example.com");
        let err = store.try_create_account(&clash).unwrap_err();
        assert!(matches!(err, Error::Constraint(_)), "got {err:?}");
        assert!(err.is_conflict());
        assert!(store.find_by_username("bob").is_none());
    }

    #[test]
    fn test_find_by_username_skips_password() {
        let (_dir, store) = open(|c| c);
        store.try_create_account(&alice()).unwrap();

        let account = store.find_by_username("alice").unwrap();
        assert_eq!(account.password, "s3cret");
        assert!(store.find_by_username("nobody").is_none());
    }

    #[test]
    fn test_delete_exact_match() {
        let (_dir, store) = open(|c| c);
        store.try_create_account(&alice()).unwrap();

        assert!(!store.delete_account("Alice"));
        assert!(matches!(
            store.try_delete_account("ghost"),
            Err(Error::AccountNotFound(_))
        ));
        assert_eq!(store.count_accounts().unwrap(), 1);

        assert!(store.delete_account("alice"));
        assert_eq!(store.count_accounts().unwrap(), 0);
        assert!(store.find_by_credentials("alice", "s3cret").is_none());
    }

    #[test]
    fn test_delete_case_insensitive_policy() {
        let (_dir, store) = open(|c| c.with_username_match(UsernameMatch::CaseInsensitive));
        store.try_create_account(&alice()).unwrap();
        store
            .try_create_account(&NewAccount::new("bob", "pw", Role::Employee, "Bob", "Lee", "bob@example.com"))
            .unwrap();

        assert!(store.delete_account("ALICE"));
        assert_eq!(store.count_accounts().unwrap(), 1);
        assert!(store.find_by_username("bob").is_some());
    }

    #[test]
    fn test_update_replaces_profile_fields() {
        let (_dir, store) = open(|c| c);
        store.try_create_account(&alice()).unwrap();

        let mut account = store.find_by_username("alice").unwrap();
        account.first_name = "Alicia".into();
        account.role = Role::Hr;
        account.department = None;
        account.email = "alicia@example.com".into();
        account.password = "ignored".into();
        assert!(store.update_account(&account));

        let stored = store.find_by_username("alice").unwrap();
        assert_eq!(stored.first_name, "Alicia");
        assert_eq!(stored.role, Role::Hr);
        assert_eq!(stored.department, None);
        assert_eq!(stored.email, "alicia@example.com");
        assert_eq!(stored.password, "s3cret");
    }

    #[test]
    fn test_update_username_match_policies() {
        let (_dir, exact) = open(|c| c);
        exact.try_create_account(&alice()).unwrap();
        let mut account = exact.find_by_username("alice").unwrap();
        account.username = "Alice".into();
        account.last_name = "Jones".into();
        assert!(matches!(
            exact.try_update_account(&account),
            Err(Error::AccountNotFound(_))
        ));

        let (_dir2, relaxed) = open(|c| c.with_username_match(UsernameMatch::CaseInsensitive));
        relaxed.try_create_account(&alice()).unwrap();
        assert!(relaxed.update_account(&account));
        assert_eq!(relaxed.find_by_username("alice").unwrap().last_name, "Jones");
    }

    #[test]
    fn test_update_to_taken_email_fails() {
        let (_dir, store) = open(|c| c);
        store.try_create_account(&alice()).unwrap();
        store
            .try_create_account(&NewAccount::new("bob", "pw", Role::Employee, "Bob", "Lee", "bob@example.com"))
            .unwrap();

        let mut bob = store.find_by_username("bob").unwrap();
        bob.email = "alice@example.com".into();
        assert!(!store.update_account(&bob));
        assert_eq!(store.find_by_username("bob").unwrap().email, "bob@example.com");
    }

    #[test]
    fn test_listings_exclude_hr() {
        let (_dir, store) = open(|c| c);
        store.try_create_account(&alice()).unwrap();
        store
            .try_create_account(&NewAccount::new("hana", "pw", Role::Hr, "Hana", "Ross", "hana@example.com"))
            .unwrap();

        assert_eq!(store.list_employee_usernames(), vec!["alice".to_string()]);

        let accounts = store.list_employee_accounts();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].username, "alice");
        assert_eq!(accounts[0].department.as_deref(), Some("Finance"));
        assert!(accounts.iter().all(|a| a.role != Role::Hr));
    }

    #[test]
    fn test_delete_preserves_task_references_by_default() {
        let (_dir, store) = open(|c| c);
        store.try_create_account(&alice()).unwrap();
        store.try_create_task(&NewTask::new("Audit", "Q3", "alice", "hana")).unwrap();

        assert!(store.delete_account("alice"));
        let tasks = store.find_by_assignee("alice");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].assigned_to.as_deref(), Some("alice"));
    }

    #[test]
    fn test_delete_can_clear_task_references() {
        let (_dir, store) = open(|c| c.with_dangling_references(DanglingReferences::Clear));
        store.try_create_account(&alice()).unwrap();
        let assigned = store.try_create_task(&NewTask::new("Audit", "Q3", "Alice", "hana")).unwrap();
        let managed = store.try_create_task(&NewTask::new("Review", "Peer review", "bob", "alice")).unwrap();

        assert!(store.delete_account("alice"));
        assert_eq!(store.find_task(assigned).unwrap().assigned_to, None);
        let review = store.find_task(managed).unwrap();
        assert_eq!(review.manager, None);
        assert_eq!(review.assigned_to.as_deref(), Some("bob"));

        assert!(matches!(
            store.try_delete_account("alice"),
            Err(Error::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_clear_delete_waits_for_other_writer() {
        let (_dir, store) = open(|c| {
            c.with_dangling_references(DanglingReferences::Clear)
                .with_busy_timeout(Duration::from_secs(2))
        });
        store.try_create_account(&alice()).unwrap();
        let id = store.try_create_task(&NewTask::new("Audit", "Q3", "alice", "hana")).unwrap();

        let other = Connection::open(store.path()).unwrap();
        other.execute_batch("BEGIN IMMEDIATE").unwrap();
        other
            .execute("UPDATE task SET feedback = 'Due Friday' WHERE task_id = ?1", [id])
            .unwrap();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            other.execute_batch("COMMIT").unwrap();
        });

        assert!(store.delete_account("alice"));
        writer.join().unwrap();

        let task = store.find_task(id).unwrap();
        assert_eq!(task.assigned_to, None);
        assert_eq!(task.feedback.as_deref(), Some("Due Friday"));
        assert!(store.find_by_username("alice").is_none());
    }
}
