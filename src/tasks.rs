//! Task repository.
//!
//! Tasks are stored one per line in the tasks store as
//! `Code,Name,Status,Rep_User_Code`. Every task handed out by this module has
//! its assignee resolved through the [`UserDirectory`]; a code that no longer
//! resolves is reported as [`Error::AssigneeNotFound`] rather than papered
//! over, both for single lookups and for full listings.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{Task, TaskStatus, User};
use crate::store::{Record, RecordStore};
use crate::users::UserDirectory;

pub const TASKS_HEADER: &str = "Code,Name,Status,Rep_User_Code";

const COL_CODE: usize = 0;
const COL_NAME: usize = 1;
const COL_STATUS: usize = 2;
const COL_ASSIGNEE: usize = 3;

/// A task row before its assignee is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
struct TaskRow {
    code: i64,
    name: String,
    status: TaskStatus,
    assignee_code: i64,
}

impl TaskRow {
    fn from_record(record: &Record) -> Result<Self> {
        let raw_status = record.int(COL_STATUS, "Status")?;
        let status = TaskStatus::from_code(raw_status)
            .ok_or_else(|| record.parse_error(format!("unknown status {raw_status}")))?;
        Ok(Self {
            code: record.int(COL_CODE, "Code")?,
            name: record.text(COL_NAME, "Name")?.to_string(),
            status,
            assignee_code: record.int(COL_ASSIGNEE, "Rep_User_Code")?,
        })
    }

    fn into_task(self, assignee: User) -> Task {
        Task {
            code: self.code,
            name: self.name,
            status: self.status,
            assignee,
        }
    }
}

fn task_fields(task: &Task) -> Vec<String> {
    vec![
        task.code.to_string(),
        task.name.clone(),
        task.status.code().to_string(),
        task.assignee.code.to_string(),
    ]
}

fn assignee_error(err: Error) -> Error {
    match err {
        Error::UserNotFound(code) => Error::AssigneeNotFound(code),
        other => other,
    }
}

/// Lookup, listing, insert, and update of tasks
#[derive(Debug, Clone)]
pub struct TaskRepository<S> {
    store: S,
    users: UserDirectory<S>,
}

impl<S: RecordStore> TaskRepository<S> {
    pub fn new(store: S, users: UserDirectory<S>) -> Self {
        Self { store, users }
    }

    /// Every task in stored order, assignees resolved.
    pub fn find_all(&self) -> Result<Vec<Task>> {
        let rows = self
            .store
            .read_all()?
            .iter()
            .map(TaskRow::from_record)
            .collect::<Result<Vec<_>>>()?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // First user per code wins, matching a linear scan.
        let mut users: HashMap<i64, User> = HashMap::new();
        for user in self.users.find_all()? {
            users.entry(user.code).or_insert(user);
        }

        rows.into_iter()
            .map(|row| {
                let assignee = users
                    .get(&row.assignee_code)
                    .cloned()
                    .ok_or(Error::AssigneeNotFound(row.assignee_code))?;
                Ok(row.into_task(assignee))
            })
            .collect()
    }

    pub fn find_by_code(&self, code: i64) -> Result<Task> {
        for record in self.store.read_all()? {
            if record.int(COL_CODE, "Code")? != code {
                continue;
            }
            let row = TaskRow::from_record(&record)?;
            let assignee = self
                .users
                .find_by_code(row.assignee_code)
                .map_err(assignee_error)?;
            return Ok(row.into_task(assignee));
        }
        Err(Error::TaskNotFound(code))
    }

    /// Append a new task. Codes are unique within the store.
    pub fn save(&self, task: &Task) -> Result<()> {
        for record in self.store.read_all()? {
            if record.int(COL_CODE, "Code")? == task.code {
                return Err(Error::DuplicateCode {
                    store: self.store.location().display().to_string(),
                    code: task.code,
                });
            }
        }
        self.store.append(&task_fields(task))
    }

    /// Replace the stored row for `task.code` and rewrite the whole store.
    ///
    /// Other rows keep their position and field values.
    pub fn update(&self, task: &Task) -> Result<()> {
        let mut found = false;
        let mut rows = Vec::new();
        for record in self.store.read_all()? {
            if record.int(COL_CODE, "Code")? == task.code {
                found = true;
                rows.push(task_fields(task));
            } else {
                rows.push(record.fields);
            }
        }
        if !found {
            return Err(Error::TaskNotFound(task.code));
        }
        self.store.rewrite(self.store.header(), &rows)
    }

    /// Remove the row for `code` and rewrite the whole store.
    pub fn delete(&self, code: i64) -> Result<()> {
        let mut found = false;
        let mut rows = Vec::new();
        for record in self.store.read_all()? {
            if record.int(COL_CODE, "Code")? == code {
                found = true;
            } else {
                rows.push(record.fields);
            }
        }
        if !found {
            return Err(Error::TaskNotFound(code));
        }
        self.store.rewrite(self.store.header(), &rows)
    }
}
