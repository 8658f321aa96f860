//! Use cases: login, listing, creation, and status transitions.
//!
//! The services are the only place that writes to more than one store. A
//! task creation or transition always writes the task store first and the
//! log store second; there is no rollback if the second write fails.

use chrono::NaiveDate;

use crate::config::StorePaths;
use crate::error::{Error, Result};
use crate::logs::{LogRepository, LOGS_HEADER};
use crate::model::{LogEntry, Task, TaskStatus, TaskView, User};
use crate::store::{FlatFileStore, RecordStore};
use crate::tasks::{TaskRepository, TASKS_HEADER};
use crate::users::{UserDirectory, USERS_HEADER};

/// Source of the calendar date stamped on log entries
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the running machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always returns the same date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct UserService<S> {
    users: UserDirectory<S>,
}

impl<S: RecordStore> UserService<S> {
    pub fn new(users: UserDirectory<S>) -> Self {
        Self { users }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        match self.users.find_by_credentials(email, password) {
            Ok(user) => {
                tracing::info!(user = user.code, "login succeeded");
                Ok(user)
            }
            Err(err) => {
                tracing::warn!(email, error = %err, "login failed");
                Err(err)
            }
        }
    }

    pub fn users(&self) -> Result<Vec<User>> {
        self.users.find_all()
    }
}

#[derive(Debug, Clone)]
pub struct TaskService<S, C = SystemClock> {
    users: UserDirectory<S>,
    tasks: TaskRepository<S>,
    logs: LogRepository<S>,
    clock: C,
}

impl<S: RecordStore + Clone, C: Clock> TaskService<S, C> {
    pub fn new(users: S, tasks: S, logs: S, clock: C) -> Self {
        let users = UserDirectory::new(users);
        Self {
            tasks: TaskRepository::new(tasks, users.clone()),
            logs: LogRepository::new(logs),
            users,
            clock,
        }
    }

    /// Every task, labelled relative to `viewer`.
    pub fn list_tasks(&self, viewer: &User) -> Result<Vec<TaskView>> {
        Ok(self
            .tasks
            .find_all()?
            .into_iter()
            .map(|task| TaskView::for_user(task, viewer))
            .collect())
    }

    pub fn find_task(&self, code: i64) -> Result<Task> {
        self.tasks.find_by_code(code)
    }

    /// Create a task in `NotStarted` and record it in the log.
    pub fn create_task(
        &self,
        code: i64,
        name: &str,
        assignee_code: i64,
        acting: &User,
    ) -> Result<Task> {
        let assignee = self
            .users
            .find_by_code(assignee_code)
            .map_err(|err| match err {
                Error::UserNotFound(code) => Error::AssigneeNotFound(code),
                other => other,
            })?;

        let task = Task {
            code,
            name: name.trim().to_string(),
            status: TaskStatus::NotStarted,
            assignee,
        };
        self.tasks.save(&task)?;
        self.record(&task, acting)?;

        tracing::info!(
            task = task.code,
            assignee = task.assignee.code,
            user = acting.code,
            "created task"
        );
        Ok(task)
    }

    /// Advance a task by exactly one step.
    ///
    /// `new_status` is the raw status value so that out-of-range requests are
    /// rejected the same way as skips and regressions.
    pub fn change_status(&self, code: i64, new_status: i64, acting: &User) -> Result<Task> {
        let mut task = self.tasks.find_by_code(code)?;
        let current = task.status;

        let next = match current.next() {
            Some(next) if next.code() == new_status => next,
            _ => {
                let requested = TaskStatus::from_code(new_status)
                    .map(|status| status.as_str().to_string())
                    .unwrap_or_else(|| new_status.to_string());
                tracing::warn!(
                    task = code,
                    current = %current,
                    requested = %requested,
                    "rejected status change"
                );
                return Err(Error::InvalidTransition {
                    code,
                    current: current.as_str().to_string(),
                    requested,
                });
            }
        };

        task.status = next;
        self.tasks.update(&task)?;
        self.record(&task, acting)?;

        tracing::info!(task = code, from = %current, to = %next, user = acting.code, "changed status");
        Ok(task)
    }

    /// Audit entries for an existing task, oldest first.
    pub fn task_history(&self, code: i64) -> Result<Vec<LogEntry>> {
        self.tasks.find_by_code(code)?;
        self.logs.find_by_task_code(code)
    }

    /// Remove a finished task. Its log entries stay.
    pub fn delete_task(&self, code: i64) -> Result<()> {
        let task = self.tasks.find_by_code(code)?;
        if !task.status.is_terminal() {
            return Err(Error::TaskNotDone {
                code,
                status: task.status.as_str().to_string(),
            });
        }
        self.tasks.delete(code)?;
        tracing::info!(task = code, "deleted task");
        Ok(())
    }

    fn record(&self, task: &Task, acting: &User) -> Result<()> {
        self.logs.save(&LogEntry {
            task_code: task.code,
            user_code: acting.code,
            status: task.status,
            date: self.clock.today(),
        })
    }
}

/// Both services wired to the file stores of one data directory
#[derive(Debug, Clone)]
pub struct Services {
    pub users: UserService<FlatFileStore>,
    pub tasks: TaskService<FlatFileStore, SystemClock>,
}

impl Services {
    /// Open the stores, creating empty task and log stores on first use.
    ///
    /// The users store is never created here; it has to be provisioned
    /// (`taskapp init` writes an empty one).
    pub fn open(paths: &StorePaths) -> Result<Self> {
        let users = FlatFileStore::new(&paths.users, USERS_HEADER);
        if !users.exists() {
            return Err(Error::InvalidConfig(format!(
                "users store not found: {}",
                paths.users.display()
            )));
        }
        let tasks = FlatFileStore::new(&paths.tasks, TASKS_HEADER);
        let logs = FlatFileStore::new(&paths.logs, LOGS_HEADER);
        tasks.init()?;
        logs.init()?;

        Ok(Self {
            users: UserService::new(UserDirectory::new(users.clone())),
            tasks: TaskService::new(users, tasks, logs, SystemClock),
        })
    }
}
