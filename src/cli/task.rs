//! taskapp task command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{load_context, Credentials};
use crate::config::UiConfig;
use crate::error::{Error, Result};
use crate::model::{LogEntry, Task, TaskStatus, TaskView};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::DELIMITER;

pub struct ListOptions {
    pub credentials: Credentials,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct NewOptions {
    pub code: i64,
    pub name: String,
    pub assignee: i64,
    pub credentials: Credentials,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct StatusOptions {
    pub code: i64,
    pub status: String,
    pub credentials: Credentials,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct HistoryOptions {
    pub code: i64,
    pub credentials: Credentials,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<TaskView>,
}

#[derive(Serialize)]
struct TaskHistoryOutput {
    code: i64,
    entries: Vec<LogEntry>,
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let user = options.credentials.login(&ctx)?;
    let tasks = ctx.services.tasks.list_tasks(&user)?;

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", tasks.len().to_string());
    for view in &tasks {
        human.push_detail(format_view(view));
    }

    let output = TaskListOutput {
        total: tasks.len(),
        tasks,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task list",
        &output,
        Some(&human),
    )
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let user = options.credentials.login(&ctx)?;
    validate_code(options.code)?;
    let name = validate_name(&options.name, &ctx.config.ui)?;

    let task = ctx
        .services
        .tasks
        .create_task(options.code, name, options.assignee, &user)?;

    let mut human = HumanOutput::new(format!("Task created: {}", task.name));
    push_task_summary(&mut human, &task);
    human.push_next_step(format!("taskapp task status {} 1", task.code));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task new",
        &task,
        Some(&human),
    )
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let user = options.credentials.login(&ctx)?;
    let status = parse_status_arg(&options.status)?;

    let task = ctx
        .services
        .tasks
        .change_status(options.code, status, &user)?;

    let mut human = HumanOutput::new(format!("Task {} is now {}", task.code, task.status.label()));
    push_task_summary(&mut human, &task);
    if let Some(next) = task.status.next() {
        human.push_next_step(format!("taskapp task status {} {}", task.code, next.code()));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task status",
        &task,
        Some(&human),
    )
}

pub fn run_history(options: HistoryOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    options.credentials.login(&ctx)?;
    let entries = ctx.services.tasks.task_history(options.code)?;

    let mut human = HumanOutput::new(format!("History of task {}", options.code));
    human.push_summary("Entries", entries.len().to_string());
    for entry in &entries {
        human.push_detail(format!(
            "{} {} by user {}",
            entry.date, entry.status, entry.user_code
        ));
    }

    let output = TaskHistoryOutput {
        code: options.code,
        entries,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task history",
        &output,
        Some(&human),
    )
}

pub(crate) fn format_view(view: &TaskView) -> String {
    format!(
        "{}. [{}] {} ({})",
        view.code,
        view.status.label(),
        view.name,
        view.assignment
    )
}

fn push_task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("Code", task.code.to_string());
    human.push_summary("Name", task.name.clone());
    human.push_summary("Status", task.status.as_str());
    human.push_summary(
        "Assignee",
        format!("{} ({})", task.assignee.name, task.assignee.code),
    );
}

/// Task codes are non-negative integers.
pub(crate) fn validate_code(code: i64) -> Result<i64> {
    if code < 0 {
        return Err(Error::InvalidArgument(format!(
            "task code must be a non-negative integer, got {code}"
        )));
    }
    Ok(code)
}

/// Trimmed task name, checked against the length policy and the store format.
pub(crate) fn validate_name<'a>(name: &'a str, ui: &UiConfig) -> Result<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidArgument("task name cannot be empty".to_string()));
    }
    let len = name.chars().count();
    if len > ui.max_task_name_len {
        return Err(Error::InvalidArgument(format!(
            "task name must be at most {} characters, got {len}",
            ui.max_task_name_len
        )));
    }
    if name.contains(DELIMITER) {
        return Err(Error::InvalidArgument(format!(
            "task name cannot contain '{DELIMITER}'"
        )));
    }
    Ok(name)
}

/// Status argument as a raw status value.
///
/// Integers pass through unchecked so the lifecycle rule decides; names map to
/// their status code.
pub(crate) fn parse_status_arg(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if let Ok(code) = trimmed.parse::<i64>() {
        return Ok(code);
    }
    trimmed.parse::<TaskStatus>().map(TaskStatus::code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_policy() {
        let ui = UiConfig::default();
        assert_eq!(validate_name("  Design ", &ui).expect("valid"), "Design");
        assert!(validate_name("exactly10!", &ui).is_ok());
        assert!(validate_name("elevenchars", &ui).is_err());
        assert!(validate_name("a,b", &ui).is_err());
        assert!(validate_name("   ", &ui).is_err());
        // Length counts characters, not bytes.
        assert!(validate_name("タスク管理アプリ", &ui).is_ok());
    }

    #[test]
    fn status_arg_accepts_codes_and_names() {
        assert_eq!(parse_status_arg("1").expect("code"), 1);
        assert_eq!(parse_status_arg("7").expect("raw code"), 7);
        assert_eq!(parse_status_arg("done").expect("name"), 2);
        assert_eq!(parse_status_arg("In Progress").expect("name"), 1);
        assert!(matches!(
            parse_status_arg("soon"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn negative_codes_rejected() {
        assert!(validate_code(0).is_ok());
        assert!(matches!(validate_code(-1), Err(Error::InvalidArgument(_))));
    }
}
