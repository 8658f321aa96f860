//! Error types for taskapp
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (unknown code, bad credentials, bad args)
//! - 3: Rejected by the status lifecycle
//! - 4: Operation failed (store I/O, malformed records)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskapp CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskapp operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("no matching user found: {0}")]
    UserNotFound(i64),

    #[error("assignee not found: {0}")]
    AssigneeNotFound(i64),

    #[error("task code not found: {0}")]
    TaskNotFound(i64),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("code {code} already exists in {store}")]
    DuplicateCode { store: String, code: i64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Lifecycle rejections (exit code 3)
    #[error(
        "invalid status transition for task {code}: {current} -> {requested} (status may only advance one step)"
    )]
    InvalidTransition {
        code: i64,
        current: String,
        requested: String,
    },

    #[error("task {code} must be done before it can be deleted (currently {status})")]
    TaskNotDone { code: i64, status: String },

    // Operation failures (exit code 4)
    #[error("store error at {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {path} at line {line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Wrap an I/O failure on a backing store
    pub fn store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Store {
            path: path.into(),
            source,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::UserNotFound(_)
            | Error::AssigneeNotFound(_)
            | Error::TaskNotFound(_)
            | Error::InvalidCredentials
            | Error::DuplicateCode { .. }
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_) => exit_codes::USER_ERROR,

            // Lifecycle rejections
            Error::InvalidTransition { .. } | Error::TaskNotDone { .. } => exit_codes::REJECTED,

            // Operation failures
            Error::Store { .. }
            | Error::Parse { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Domain-level kind used in JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UserNotFound(_) | Error::AssigneeNotFound(_) | Error::TaskNotFound(_) => {
                "not_found"
            }
            Error::InvalidCredentials => "invalid_credentials",
            Error::InvalidTransition { .. } | Error::TaskNotDone { .. } => "invalid_transition",
            Error::Store { .. } | Error::Parse { .. } | Error::Io(_) => "store_io_error",
            Error::DuplicateCode { .. } | Error::InvalidConfig(_) | Error::InvalidArgument(_) => {
                "user_error"
            }
            Error::Json(_) | Error::TomlParse(_) | Error::TomlSerialize(_) => "operation_failed",
        }
    }

    /// Structured details for JSON output, where the variant carries any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::UserNotFound(code) | Error::AssigneeNotFound(code) | Error::TaskNotFound(code) => {
                Some(serde_json::json!({ "code": code }))
            }
            Error::InvalidTransition {
                code,
                current,
                requested,
            } => Some(serde_json::json!({
                "code": code,
                "current": current,
                "requested": requested,
            })),
            Error::TaskNotDone { code, status } => {
                Some(serde_json::json!({ "code": code, "status": status }))
            }
            Error::DuplicateCode { store, code } => {
                Some(serde_json::json!({ "store": store, "code": code }))
            }
            Error::Parse { path, line, .. } => Some(serde_json::json!({
                "path": path,
                "line": line,
            })),
            Error::Store { path, .. } => Some(serde_json::json!({ "path": path })),
            _ => None,
        }
    }
}

/// Result type alias for taskapp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
