mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestDir;

fn json_stdout(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("json output")
}

fn is_iso_date(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

#[test]
fn init_creates_config_and_stores() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::empty()?;

    data.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("initialized data directory"));

    assert!(data.path().join(".taskapp.toml").is_file());
    assert_eq!(data.read_file("users.csv"), "Code,Name,Email,Password\n");
    assert_eq!(data.read_file("tasks.csv"), support::EMPTY_TASKS);
    assert_eq!(data.read_file("logs.csv"), support::EMPTY_LOGS);

    data.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("nothing to do"));
    Ok(())
}

#[test]
fn init_keeps_existing_users() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::empty()?;
    data.write_file("users.csv", support::USERS)?;

    data.cmd().arg("init").assert().success();
    assert_eq!(data.read_file("users.csv"), support::USERS);
    Ok(())
}

#[test]
fn login_reports_user() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;

    let output = data.alice().args(["login", "--json"]).output()?;
    assert!(output.status.success());
    let value = json_stdout(&output);
    assert_eq!(value["schema_version"], "taskapp.v1");
    assert_eq!(value["command"], "login");
    assert_eq!(value["data"]["name"], "Alice");
    assert!(value["data"].get("password").is_none());
    Ok(())
}

#[test]
fn wrong_password_is_user_error() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;

    data.cmd()
        .args(["--email", "alice@example.com", "--password", "nope", "task", "list"])
        .assert()
        .code(2)
        .stderr(contains("invalid email or password"));
    Ok(())
}

#[test]
fn missing_credentials_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;

    data.cmd()
        .args(["task", "list"])
        .assert()
        .code(2)
        .stderr(contains("missing --email"));
    Ok(())
}

#[test]
fn create_and_advance_task() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;

    data.alice()
        .args(["task", "new", "100", "Design", "--assignee", "1"])
        .assert()
        .success()
        .stdout(contains("Task created: Design"));
    assert_eq!(data.records("tasks.csv"), vec!["100,Design,0,1"]);

    let logs = data.records("logs.csv");
    assert_eq!(logs.len(), 1);
    assert!(logs[0].starts_with("100,1,0,"), "{logs:?}");
    assert!(is_iso_date(logs[0].rsplit(',').next().unwrap_or_default()));

    // Skipping a step is rejected and changes nothing.
    data.alice()
        .args(["task", "status", "100", "2"])
        .assert()
        .code(3)
        .stderr(contains("invalid status transition"));
    assert_eq!(data.records("tasks.csv"), vec!["100,Design,0,1"]);
    assert_eq!(data.records("logs.csv").len(), 1);

    data.alice()
        .args(["task", "status", "100", "in_progress"])
        .assert()
        .success()
        .stdout(contains("Task 100 is now in progress"));
    assert_eq!(data.records("tasks.csv"), vec!["100,Design,1,1"]);

    let logs = data.records("logs.csv");
    assert_eq!(logs.len(), 2);
    assert!(logs[1].starts_with("100,1,1,"), "{logs:?}");
    Ok(())
}

#[test]
fn list_labels_assignments_for_viewer() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;
    data.write_file(
        "tasks.csv",
        "Code,Name,Status,Rep_User_Code\n100,Design,0,1\n101,Build,1,2\n",
    )?;

    data.alice()
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(contains("100. [not started] Design (assigned to you)"))
        .stdout(contains("101. [in progress] Build (assigned to Bob)"));

    let output = data.alice().args(["--json", "task", "list"]).output()?;
    let value = json_stdout(&output);
    assert_eq!(value["data"]["total"], 2);
    assert_eq!(value["data"]["tasks"][0]["assigned_to_you"], true);
    assert_eq!(value["data"]["tasks"][1]["assignee_name"], "Bob");
    assert_eq!(value["data"]["tasks"][1]["status"], "in_progress");
    Ok(())
}

#[test]
fn update_preserves_other_rows() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;
    data.write_file(
        "tasks.csv",
        "Code,Name,Status,Rep_User_Code\n100,Design,0,1\n101,Build,1,2\n102,Ship,2,1\n",
    )?;

    data.alice()
        .args(["task", "status", "101", "done"])
        .assert()
        .success();

    assert_eq!(
        data.read_file("tasks.csv"),
        "Code,Name,Status,Rep_User_Code\n100,Design,0,1\n101,Build,2,2\n102,Ship,2,1\n"
    );
    Ok(())
}

#[test]
fn create_rejections() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;

    data.alice()
        .args(["task", "new", "100", "Design", "--assignee", "9"])
        .assert()
        .code(2)
        .stderr(contains("assignee not found: 9"));

    data.alice()
        .args(["task", "new", "100", "Elevenchars", "--assignee", "1"])
        .assert()
        .code(2)
        .stderr(contains("at most 10 characters"));

    data.alice()
        .args(["task", "new", "100", "a,b", "--assignee", "1"])
        .assert()
        .code(2);

    assert!(data.records("tasks.csv").is_empty());
    assert!(data.records("logs.csv").is_empty());

    data.alice()
        .args(["task", "new", "100", "Design", "--assignee", "2"])
        .assert()
        .success();
    data.alice()
        .args(["task", "new", "100", "Again", "--assignee", "2"])
        .assert()
        .code(2)
        .stderr(contains("already exists"));
    assert_eq!(data.records("tasks.csv"), vec!["100,Design,0,2"]);
    assert_eq!(data.records("logs.csv").len(), 1);
    Ok(())
}

#[test]
fn unknown_task_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;

    let output = data
        .alice()
        .args(["--json", "task", "status", "555", "1"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    let value = json_stdout(&output);
    assert_eq!(value["status"], "error");
    assert_eq!(value["command"], "task status");
    assert_eq!(value["error"]["kind"], "not_found");
    assert_eq!(value["error"]["details"]["code"], 555);
    Ok(())
}

#[test]
fn history_lists_entries_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;
    data.write_file(
        "tasks.csv",
        "Code,Name,Status,Rep_User_Code\n100,Design,2,1\n",
    )?;
    data.write_file(
        "logs.csv",
        "Task_Code,Rep_User_Code,Status,Change_Date\n\
100,1,0,2024-03-01\n101,2,0,2024-03-01\n100,2,1,2024-03-02\n100,1,2,2024-03-05\n",
    )?;

    let output = data
        .alice()
        .args(["--json", "task", "history", "100"])
        .output()?;
    assert!(output.status.success());
    let value = json_stdout(&output);
    let entries = value["data"]["entries"].as_array().expect("entries");
    let statuses: Vec<_> = entries
        .iter()
        .map(|entry| entry["status"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(statuses, vec!["not_started", "in_progress", "done"]);
    assert_eq!(entries[2]["date"], "2024-03-05");
    Ok(())
}

#[test]
fn malformed_store_is_operation_failure() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;
    data.write_file(
        "tasks.csv",
        "Code,Name,Status,Rep_User_Code\n100,Design,0\n",
    )?;

    data.alice()
        .args(["task", "list"])
        .assert()
        .code(4)
        .stderr(contains("line 2"));
    Ok(())
}

#[test]
fn missing_users_store_points_at_init() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::empty()?;

    data.alice()
        .args(["task", "list"])
        .assert()
        .code(2)
        .stderr(contains("users store not found"))
        .stderr(contains("hint: fix .taskapp.toml or run taskapp init"));
    Ok(())
}

#[test]
fn config_relocates_stores() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::empty()?;
    data.write_file(
        ".taskapp.toml",
        "[stores]\nusers = \"db/people.csv\"\ntasks = \"db/tasks.csv\"\nlogs = \"db/audit.csv\"\n",
    )?;
    data.write_file("db/people.csv", support::USERS)?;

    data.alice()
        .args(["task", "new", "7", "Relocate", "--assignee", "2"])
        .assert()
        .success();

    assert_eq!(data.records("db/tasks.csv"), vec!["7,Relocate,0,2"]);
    assert_eq!(data.records("db/audit.csv").len(), 1);
    assert!(!data.path().join("tasks.csv").exists());
    Ok(())
}

#[test]
fn menu_session_over_stdin() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;

    data.cmd()
        .arg("menu")
        .write_stdin("alice@example.com\nsecret\n2\n100\nDesign\n2\n1\n1\n100\n1\n3\n")
        .assert()
        .success()
        .stdout(contains("Logged in as Alice."))
        .stdout(contains("Task Design registered."))
        .stdout(contains("100. [not started] Design (assigned to Bob)"))
        .stdout(contains("Task 100 is now in progress."))
        .stdout(contains("Logged out."));

    assert_eq!(data.records("tasks.csv"), vec!["100,Design,1,2"]);
    assert_eq!(data.records("logs.csv").len(), 2);
    Ok(())
}

#[test]
fn menu_login_failure_exits_with_user_error() -> Result<(), Box<dyn std::error::Error>> {
    let data = TestDir::seeded()?;

    data.cmd()
        .arg("menu")
        .write_stdin("a@x\n1\nb@x\n2\nc@x\n3\n")
        .assert()
        .code(2)
        .stdout(contains("Too many failed login attempts."));
    Ok(())
}
