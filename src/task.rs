//! Task types and the status state machine
//!
//! Employee actions move a task through a small lifecycle:
//! - `Assigned -> Accepted` (accept)
//! - `Assigned -> Rejected` (reject)
//! - `Accepted -> Completed` (complete)
//!
//! `Rejected` and `Completed` are terminal. HR's full update bypasses this
//! table and may set any status.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Task lifecycle status, stored capitalized (`'Assigned'`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Initial state for every new task
    Assigned,
    Accepted,
    Rejected,
    Completed,
}

impl TaskStatus {
    /// Get the stored representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Assigned => "Assigned",
            TaskStatus::Accepted => "Accepted",
            TaskStatus::Rejected => "Rejected",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Get all statuses
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::Assigned,
            TaskStatus::Accepted,
            TaskStatus::Rejected,
            TaskStatus::Completed,
        ]
    }

    /// States from which `self` may be reached by an employee action.
    ///
    /// Inverse of [`transition`]; the store uses it to guard the status
    /// update inside a single statement.
    pub fn allowed_predecessors(&self) -> &'static [TaskStatus] {
        match self {
            TaskStatus::Assigned => &[],
            TaskStatus::Accepted => &[TaskStatus::Assigned],
            TaskStatus::Rejected => &[TaskStatus::Assigned],
            TaskStatus::Completed => &[TaskStatus::Accepted],
        }
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        next.allowed_predecessors().contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Rejected | TaskStatus::Completed)
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "assigned" => Ok(TaskStatus::Assigned),
            "accepted" => Ok(TaskStatus::Accepted),
            "rejected" => Ok(TaskStatus::Rejected),
            "completed" | "complete" | "done" => Ok(TaskStatus::Completed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validate a status change requested through an employee action.
pub fn transition(current: TaskStatus, requested: TaskStatus) -> Result<TaskStatus> {
    if current.can_transition_to(requested) {
        Ok(requested)
    } else {
        Err(Error::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

/// Actions an employee can take on a task assigned to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskAction {
    Accept,
    Reject,
    Complete,
}

impl TaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Accept => "accept",
            TaskAction::Reject => "reject",
            TaskAction::Complete => "complete",
        }
    }

    /// Status the task ends up in after this action
    pub fn target(&self) -> TaskStatus {
        match self {
            TaskAction::Accept => TaskStatus::Accepted,
            TaskAction::Reject => TaskStatus::Rejected,
            TaskAction::Complete => TaskStatus::Completed,
        }
    }

    /// Actions offered for a task in the given status
    pub fn available(status: TaskStatus) -> Vec<TaskAction> {
        [TaskAction::Accept, TaskAction::Reject, TaskAction::Complete]
            .into_iter()
            .filter(|a| status.can_transition_to(a.target()))
            .collect()
    }
}

impl std::fmt::Display for TaskAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Generated row id
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Username of the assignee (not enforced against `user`)
    pub assigned_to: Option<String>,
    /// Username of the supervising manager
    pub manager: Option<String>,
    pub feedback: Option<String>,
}

/// Fields required to create a task. Status is always `Assigned`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assigned_to: Option<String>,
    pub manager: Option<String>,
    pub feedback: Option<String>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        assigned_to: impl Into<String>,
        manager: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            assigned_to: Some(assigned_to.into()),
            manager: Some(manager.into()),
            feedback: None,
        }
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

/// Row of the unfiltered task listing. Feedback is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assigned_to: Option<String>,
    pub manager: Option<String>,
}
