#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub const USERS: &str = "Code,Name,Email,Password\n\
1,Alice,alice@example.com,secret\n\
2,Bob,bob@example.com,hunter2\n";

pub const EMPTY_TASKS: &str = "Code,Name,Status,Rep_User_Code\n";
pub const EMPTY_LOGS: &str = "Task_Code,Rep_User_Code,Status,Change_Date\n";

/// A data directory with users Alice (1) and Bob (2) and empty task and log stores
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn seeded() -> std::io::Result<Self> {
        let data = Self::empty()?;
        data.write_file("users.csv", USERS)?;
        data.write_file("tasks.csv", EMPTY_TASKS)?;
        data.write_file("logs.csv", EMPTY_LOGS)?;
        Ok(data)
    }

    pub fn empty() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_file(&self, rel_path: &str) -> String {
        fs::read_to_string(self.dir.path().join(rel_path)).expect("read store file")
    }

    /// Data lines of a store, header excluded
    pub fn records(&self, rel_path: &str) -> Vec<String> {
        self.read_file(rel_path)
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// `taskapp` pointed at this directory, with no credentials
    pub fn cmd(&self) -> Command {
        let mut cmd = taskapp_cmd();
        cmd.env("TASKAPP_DIR", self.dir.path());
        cmd
    }

    /// `taskapp` logged in as Alice
    pub fn alice(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("TASKAPP_EMAIL", "alice@example.com")
            .env("TASKAPP_PASSWORD", "secret");
        cmd
    }
}

pub fn taskapp_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskapp").expect("binary");
    cmd.env_remove("TASKAPP_DIR")
        .env_remove("TASKAPP_EMAIL")
        .env_remove("TASKAPP_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}
