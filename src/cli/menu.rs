//! Interactive menu session.
//!
//! The session reads answers line by line from any `BufRead` and writes
//! prompts to any `Write`, so it runs the same on a terminal and in tests.
//! Every prompt accepts at most `ui.max_attempts` invalid answers before it
//! gives up, and end of input ends the session.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::cli::load_context;
use crate::cli::task::{format_view, validate_code, validate_name};
use crate::config::UiConfig;
use crate::error::{exit_codes, Error, Result};
use crate::model::User;
use crate::service::{Clock, TaskService, UserService};
use crate::store::RecordStore;

pub struct MenuOptions {
    pub dir: Option<PathBuf>,
    pub json: bool,
}

pub fn run(options: MenuOptions) -> Result<()> {
    if options.json {
        return Err(Error::InvalidArgument(
            "menu is interactive and does not support --json".to_string(),
        ));
    }
    let ctx = load_context(options.dir)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut session = Session::new(
        &ctx.services.users,
        &ctx.services.tasks,
        &ctx.config.ui,
        stdin.lock(),
        stdout.lock(),
    );

    match session.run()? {
        SessionEnd::LoginFailed => Err(Error::InvalidCredentials),
        SessionEnd::LoggedOut | SessionEnd::EndOfInput => Ok(()),
    }
}

/// How a session finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    LoggedOut,
    EndOfInput,
    LoginFailed,
}

enum Answer<T> {
    Value(T),
    GaveUp,
    Closed,
}

enum Flow {
    Continue,
    Closed,
}

impl<T> Answer<T> {
    fn into_flow(self) -> Flow {
        match self {
            Answer::Closed => Flow::Closed,
            Answer::Value(_) | Answer::GaveUp => Flow::Continue,
        }
    }
}

/// Errors the user can answer again; anything else ends the session.
fn is_recoverable(err: &Error) -> bool {
    err.exit_code() != exit_codes::OPERATION_FAILED
}

fn parse_number(raw: &str, what: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidArgument(format!("{what} must be a number")))
}

pub struct Session<'a, S, C, R, W> {
    users: &'a UserService<S>,
    tasks: &'a TaskService<S, C>,
    ui: &'a UiConfig,
    input: R,
    output: W,
}

impl<'a, S, C, R, W> Session<'a, S, C, R, W>
where
    S: RecordStore + Clone,
    C: Clock,
    R: BufRead,
    W: Write,
{
    pub fn new(
        users: &'a UserService<S>,
        tasks: &'a TaskService<S, C>,
        ui: &'a UiConfig,
        input: R,
        output: W,
    ) -> Self {
        Self {
            users,
            tasks,
            ui,
            input,
            output,
        }
    }

    pub fn run(&mut self) -> Result<SessionEnd> {
        writeln!(self.output, "Welcome to taskapp!")?;
        let user = match self.login()? {
            Answer::Value(user) => user,
            Answer::GaveUp => {
                writeln!(self.output, "Too many failed login attempts.")?;
                return Ok(SessionEnd::LoginFailed);
            }
            Answer::Closed => return Ok(SessionEnd::EndOfInput),
        };
        writeln!(self.output, "Logged in as {}.", user.name)?;

        loop {
            writeln!(self.output)?;
            writeln!(self.output, "Choose an option (1-3):")?;
            writeln!(self.output, "1. List tasks, 2. New task, 3. Log out")?;
            let Some(choice) = self.prompt("Choice: ")? else {
                return Ok(SessionEnd::EndOfInput);
            };

            let flow = match choice.trim() {
                "1" => self.list_tasks(&user)?,
                "2" => self.new_task(&user)?,
                "3" => {
                    writeln!(self.output, "Logged out.")?;
                    return Ok(SessionEnd::LoggedOut);
                }
                _ => {
                    writeln!(self.output, "Invalid choice, enter a number from 1 to 3.")?;
                    Flow::Continue
                }
            };
            if let Flow::Closed = flow {
                return Ok(SessionEnd::EndOfInput);
            }
        }
    }

    fn login(&mut self) -> Result<Answer<User>> {
        let users = self.users;
        let max_attempts = self.ui.max_attempts;
        for attempt in 1..=max_attempts {
            let Some(email) = self.prompt("Email: ")? else {
                return Ok(Answer::Closed);
            };
            let Some(password) = self.prompt("Password: ")? else {
                return Ok(Answer::Closed);
            };

            match users.login(email.trim(), &password) {
                Ok(user) => return Ok(Answer::Value(user)),
                Err(err) if is_recoverable(&err) => {
                    let left = max_attempts - attempt;
                    writeln!(self.output, "{err} ({left} attempts left)")?;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(Answer::GaveUp)
    }

    fn list_tasks(&mut self, user: &User) -> Result<Flow> {
        let views = match self.tasks.list_tasks(user) {
            Ok(views) => views,
            Err(err) => {
                self.report(err)?;
                return Ok(Flow::Continue);
            }
        };

        if views.is_empty() {
            writeln!(self.output, "No tasks yet.")?;
        }
        for view in &views {
            writeln!(self.output, "{}", format_view(view))?;
        }

        loop {
            writeln!(self.output)?;
            writeln!(self.output, "Choose an option (1-2):")?;
            writeln!(self.output, "1. Change task status, 2. Back to main menu")?;
            let Some(choice) = self.prompt("Choice: ")? else {
                return Ok(Flow::Closed);
            };
            match choice.trim() {
                "1" => return self.change_status(user),
                "2" => return Ok(Flow::Continue),
                _ => writeln!(self.output, "Invalid choice, enter 1 or 2.")?,
            }
        }
    }

    fn new_task(&mut self, user: &User) -> Result<Flow> {
        let users = self.users;
        let tasks = self.tasks;
        let ui = self.ui;

        let code = match self.ask("Task code: ", |raw| {
            let code = validate_code(parse_number(raw, "task code")?)?;
            match tasks.find_task(code) {
                Err(Error::TaskNotFound(_)) => Ok(code),
                Ok(_) | Err(Error::AssigneeNotFound(_)) => Err(Error::InvalidArgument(format!(
                    "task code {code} already exists"
                ))),
                Err(err) => Err(err),
            }
        })? {
            Answer::Value(code) => code,
            other => return Ok(other.into_flow()),
        };

        let name = match self.ask("Task name: ", |raw| validate_name(raw, ui).map(str::to_string))? {
            Answer::Value(name) => name,
            other => return Ok(other.into_flow()),
        };

        let assignee = match self.ask("Assignee user code: ", |raw| {
            let code = parse_number(raw, "user code")?;
            if users.users()?.iter().any(|candidate| candidate.code == code) {
                Ok(code)
            } else {
                Err(Error::UserNotFound(code))
            }
        })? {
            Answer::Value(code) => code,
            other => return Ok(other.into_flow()),
        };

        match tasks.create_task(code, &name, assignee, user) {
            Ok(task) => writeln!(self.output, "Task {} registered.", task.name)?,
            Err(err) => self.report(err)?,
        }
        Ok(Flow::Continue)
    }

    fn change_status(&mut self, user: &User) -> Result<Flow> {
        let tasks = self.tasks;

        let code = match self.ask("Task code to change: ", |raw| {
            let code = parse_number(raw, "task code")?;
            tasks.find_task(code).map(|task| task.code)
        })? {
            Answer::Value(code) => code,
            other => return Ok(other.into_flow()),
        };

        writeln!(self.output, "New status: 1. In progress, 2. Done")?;
        let task = match self.ask("Choice: ", |raw| {
            let status = parse_number(raw, "status")?;
            if status != 1 && status != 2 {
                return Err(Error::InvalidArgument("status must be 1 or 2".to_string()));
            }
            tasks.change_status(code, status, user)
        })? {
            Answer::Value(task) => task,
            other => return Ok(other.into_flow()),
        };

        writeln!(
            self.output,
            "Task {} is now {}.",
            task.code,
            task.status.label()
        )?;
        Ok(Flow::Continue)
    }

    /// Ask until `validate` accepts the answer or the attempts run out.
    fn ask<T>(
        &mut self,
        text: &str,
        mut validate: impl FnMut(&str) -> Result<T>,
    ) -> Result<Answer<T>> {
        for attempt in 1..=self.ui.max_attempts {
            let Some(raw) = self.prompt(text)? else {
                return Ok(Answer::Closed);
            };
            match validate(raw.trim()) {
                Ok(value) => return Ok(Answer::Value(value)),
                Err(err) if is_recoverable(&err) => {
                    tracing::debug!(attempt, error = %err, "rejected menu answer");
                    writeln!(self.output, "error: {err}")?;
                }
                Err(err) => return Err(err),
            }
        }
        writeln!(self.output, "Too many invalid answers, back to the main menu.")?;
        Ok(Answer::GaveUp)
    }

    fn report(&mut self, err: Error) -> Result<()> {
        if !is_recoverable(&err) {
            return Err(err);
        }
        writeln!(self.output, "error: {err}")?;
        Ok(())
    }

    /// `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}
