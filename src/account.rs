//! Account types
//!
//! An account is either an `Employee` or an `HR` user. HR accounts manage
//! everything; employees only see and act on their own tasks.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Account role, stored as `'Employee'` or `'HR'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Employee,
    #[serde(rename = "HR")]
    Hr,
}

impl Role {
    /// Get the stored representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Hr => "HR",
        }
    }

    /// Get all roles
    pub fn all() -> &'static [Role] {
        &[Role::Employee, Role::Hr]
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "hr" => Ok(Role::Hr),
            _ => Err(Error::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Generated row id
    pub id: i64,
    pub username: String,
    /// Stored exactly as given
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub email: String,
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields required to create an account. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub email: String,
}

impl NewAccount {
    /// Create a new account request with the required fields
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        role: Role,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role,
            first_name: first_name.into(),
            last_name: last_name.into(),
            department: None,
            job_title: None,
            email: email.into(),
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_job_title(mut self, job_title: impl Into<String>) -> Self {
        self.job_title = Some(job_title.into());
        self
    }
}

/// Row of the administrative account listing (no id, no password).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
    pub job_title: Option<String>,
}
