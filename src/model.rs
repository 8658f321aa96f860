//! Domain records: users, tasks, and audit log entries.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A user loaded from the users store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub code: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Task lifecycle status. Advances one step at a time and ends at `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Numeric value stored in the tasks and logs stores.
    pub fn code(self) -> i64 {
        match self {
            TaskStatus::NotStarted => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::NotStarted),
            1 => Some(TaskStatus::InProgress),
            2 => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// The only status this one may advance to.
    pub fn next(self) -> Option<Self> {
        match self {
            TaskStatus::NotStarted => Some(TaskStatus::InProgress),
            TaskStatus::InProgress => Some(TaskStatus::Done),
            TaskStatus::Done => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == TaskStatus::Done
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Human label used in listings.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not started",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return TaskStatus::from_code(code).ok_or_else(|| {
                Error::InvalidArgument(format!("unknown status code '{trimmed}' (expected 0, 1, or 2)"))
            });
        }
        match trimmed.to_lowercase().replace(['-', ' '], "_").as_str() {
            "not_started" => Ok(TaskStatus::NotStarted),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(Error::InvalidArgument(format!(
                "unknown status '{trimmed}' (expected not_started, in_progress, or done)"
            ))),
        }
    }
}

/// A task with its assignee resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub code: i64,
    pub name: String,
    pub status: TaskStatus,
    pub assignee: User,
}

/// One audit line: who moved which task to which status, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub task_code: i64,
    pub user_code: i64,
    pub status: TaskStatus,
    pub date: NaiveDate,
}

/// A task as presented to a particular logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub code: i64,
    pub name: String,
    pub status: TaskStatus,
    pub assignee_code: i64,
    pub assignee_name: String,
    pub assigned_to_you: bool,
    pub assignment: String,
}

impl TaskView {
    pub fn for_user(task: Task, viewer: &User) -> Self {
        let assigned_to_you = task.assignee.code == viewer.code;
        let assignment = if assigned_to_you {
            "assigned to you".to_string()
        } else {
            format!("assigned to {}", task.assignee.name)
        };
        Self {
            code: task.code,
            name: task.name,
            status: task.status,
            assignee_code: task.assignee.code,
            assignee_name: task.assignee.name,
            assigned_to_you,
            assignment,
        }
    }
}
