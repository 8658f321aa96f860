//! Command-line interface for taskapp
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::User;
use crate::service::Services;

mod init;
mod menu;
mod task;
mod user;

pub use menu::{Session, SessionEnd};

/// taskapp - task tracking over flat record files
///
/// Users log in with an email and password, then list, create, and advance
/// tasks. Every status change is appended to an audit log.
#[derive(Parser, Debug)]
#[command(name = "taskapp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding the config and stores (defaults to current directory)
    #[arg(long, global = true, env = "TASKAPP_DIR")]
    pub dir: Option<PathBuf>,

    /// Login email
    #[arg(long, global = true, env = "TASKAPP_EMAIL")]
    pub email: Option<String>,

    /// Login password
    #[arg(long, global = true, env = "TASKAPP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the config file and empty stores
    Init,

    /// Check credentials and show the logged-in user
    Login,

    /// User directory
    #[command(subcommand)]
    User(UserCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Interactive menu session on stdin/stdout
    Menu,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List users
    List,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List all tasks
    List,

    /// Create a task in status not_started
    New {
        /// Task code (unique integer)
        code: i64,

        /// Task name
        name: String,

        /// Code of the user the task is assigned to
        #[arg(long)]
        assignee: i64,
    },

    /// Advance a task to its next status
    Status {
        /// Task code
        code: i64,

        /// New status: 1 / in_progress or 2 / done
        status: String,
    },

    /// Show the status change history of a task
    History {
        /// Task code
        code: i64,
    },
}

/// Config and services for one data directory
pub(crate) struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub services: Services,
}

pub(crate) fn resolve_data_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

pub(crate) fn load_context(dir: Option<PathBuf>) -> Result<Context> {
    let data_dir = resolve_data_dir(dir)?;
    let config = Config::load_from_dir(&data_dir)?;
    let services = Services::open(&config.store_paths(&data_dir))?;
    tracing::debug!(dir = %data_dir.display(), "loaded context");
    Ok(Context {
        data_dir,
        config,
        services,
    })
}

/// Credentials given as options or environment, checked against the users store
#[derive(Debug, Clone, Default)]
pub(crate) struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn login(&self, ctx: &Context) -> Result<User> {
        let email = self.email.as_deref().ok_or_else(|| {
            Error::InvalidArgument("missing --email (or TASKAPP_EMAIL)".to_string())
        })?;
        let password = self.password.as_deref().ok_or_else(|| {
            Error::InvalidArgument("missing --password (or TASKAPP_PASSWORD)".to_string())
        })?;
        ctx.services.users.login(email, password)
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let credentials = Credentials {
            email: self.email,
            password: self.password,
        };

        match self.command {
            Commands::Init => init::run(init::InitOptions {
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Login => user::run_login(user::LoginOptions {
                credentials,
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::User(UserCommands::List) => user::run_list(user::ListOptions {
                dir: self.dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::List => task::run_list(task::ListOptions {
                    credentials,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::New {
                    code,
                    name,
                    assignee,
                } => task::run_new(task::NewOptions {
                    code,
                    name,
                    assignee,
                    credentials,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Status { code, status } => task::run_status(task::StatusOptions {
                    code,
                    status,
                    credentials,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::History { code } => task::run_history(task::HistoryOptions {
                    code,
                    credentials,
                    dir: self.dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Menu => menu::run(menu::MenuOptions {
                dir: self.dir,
                json: self.json,
            }),
        }
    }
}
