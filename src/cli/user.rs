//! taskapp login and user command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{load_context, Credentials};
use crate::error::Result;
use crate::model::User;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct LoginOptions {
    pub credentials: Credentials,
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct UserListOutput {
    total: usize,
    users: Vec<User>,
}

pub fn run_login(options: LoginOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let user = options.credentials.login(&ctx)?;

    let mut human = HumanOutput::new(format!("Logged in as {}", user.name));
    human.push_summary("Code", user.code.to_string());
    human.push_summary("Email", user.email.clone());
    human.push_summary("Data", ctx.data_dir.display().to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "login",
        &user,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.dir)?;
    let users = ctx.services.users.users()?;

    let mut human = HumanOutput::new("Users");
    human.push_summary("Total", users.len().to_string());
    for user in &users {
        human.push_detail(format!("{} {} <{}>", user.code, user.name, user.email));
    }
    if users.is_empty() {
        human.push_warning("users store is empty");
    }

    let output = UserListOutput {
        total: users.len(),
        users,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user list",
        &output,
        Some(&human),
    )
}
