//! taskapp init command implementation
//!
//! Creates the config file and the three stores in a data directory.

use std::path::PathBuf;

use crate::cli::resolve_data_dir;
use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::logs::LOGS_HEADER;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::FlatFileStore;
use crate::tasks::TASKS_HEADER;
use crate::users::USERS_HEADER;

pub struct InitOptions {
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitReport {
    dir: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    users: bool,
    tasks: bool,
    logs: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let data_dir = resolve_data_dir(options.dir)?;
    if data_dir.exists() && !data_dir.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "not a directory: {}",
            data_dir.display()
        )));
    }
    std::fs::create_dir_all(&data_dir).map_err(|err| Error::store(&data_dir, err))?;

    let config_path = data_dir.join(CONFIG_FILE);
    let created_config = !config_path.exists();
    let config = if created_config {
        let config = Config::default();
        config.save(&config_path)?;
        config
    } else {
        Config::load(&config_path)?
    };

    let paths = config.store_paths(&data_dir);
    let created_users = FlatFileStore::new(&paths.users, USERS_HEADER).init()?;
    let created_tasks = FlatFileStore::new(&paths.tasks, TASKS_HEADER).init()?;
    let created_logs = FlatFileStore::new(&paths.logs, LOGS_HEADER).init()?;

    let report = InitReport {
        dir: data_dir.clone(),
        created: InitCreated {
            config: created_config,
            users: created_users,
            tasks: created_tasks,
            logs: created_logs,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    for (created, path) in [
        (created_users, &paths.users),
        (created_tasks, &paths.tasks),
        (created_logs, &paths.logs),
    ] {
        if created {
            created_items.push(path.display().to_string());
        }
    }

    let header = if created_items.is_empty() {
        "taskapp init: nothing to do"
    } else {
        "taskapp init: initialized data directory"
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("dir", data_dir.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    if created_users {
        human.push_next_step(format!(
            "add users to {} as Code,Name,Email,Password",
            paths.users.display()
        ));
    }
    human.push_next_step("taskapp --email <email> --password <password> task list");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "init",
        &report,
        Some(&human),
    )
}
