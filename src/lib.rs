//! taskapp - task tracking over flat record files
//!
//! Users authenticate against a credential list, then list, create, and
//! transition tasks. Each status change is appended to an audit log.
//!
//! # Core Concepts
//!
//! - **Record stores**: one delimited flat file per entity type, accessed
//!   only through read-all, append, and rewrite
//! - **Status lifecycle**: `not_started -> in_progress -> done`, one step at
//!   a time, terminal at `done`
//! - **Audit log**: one entry per creation and per status change
//!
//! # Module Organization
//!
//! - `store`: `RecordStore` trait with file and in-memory implementations
//! - `users`, `tasks`, `logs`: repositories over the three stores
//! - `service`: login, listing, creation, and status transitions
//! - `model`: users, tasks, statuses, log entries
//! - `config`: configuration loading from `.taskapp.toml`
//! - `error`: error types, exit codes, and result aliases
//! - `output`: human and JSON output for CLI commands
//! - `cli`: command-line interface and interactive menu using clap

pub mod cli;
pub mod config;
pub mod error;
pub mod logs;
pub mod model;
pub mod output;
pub mod service;
pub mod store;
pub mod tasks;
pub mod users;

pub use error::{Error, Result};
