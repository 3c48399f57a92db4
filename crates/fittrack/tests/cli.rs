#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A command isolated from the user's environment and config files.
fn fittrack_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("fittrack"));
    cmd.env_remove("FITTRACK_DATA_DIR")
        .env_remove("FITTRACK_DATABASE_URL")
        .env_remove("DATABASE_URL")
        .env_remove("RUST_LOG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1");
    cmd
}

struct FileEnv {
    temp: TempDir,
}

impl FileEnv {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn data_dir(&self) -> std::path::PathBuf {
        self.temp.path().join("fit")
    }

    fn cmd(&self) -> Command {
        let mut cmd = fittrack_cmd(self.temp.path());
        cmd.arg("--data-dir").arg(self.data_dir());
        cmd
    }
}

struct DbEnv {
    temp: TempDir,
}

impl DbEnv {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = fittrack_cmd(self.temp.path());
        let db = self.temp.path().join("fit.db");
        cmd.arg("--data-dir")
            .arg(self.temp.path().join("fit"))
            .arg("--database-url")
            .arg(format!("sqlite://{}", db.display()));
        cmd
    }

    fn register(&self, username: &str) {
        self.cmd()
            .args(["register", username, &format!("{}@example.com", username)])
            .args(["--password", "secret1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Registered"));
    }

    fn login(&self, username: &str) {
        self.cmd()
            .args(["login", username, "--password", "secret1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Logged in as"));
    }
}

#[test]
fn test_activity_workflow_on_json_files() {
    let env = FileEnv::new();

    env.cmd()
        .args(["add", "Running", "45", "-i", "high", "-d", "intervals"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged Running for 45m"));
    env.cmd()
        .args(["add", "Yoga", "30", "--date", "2020-01-01"])
        .assert()
        .success();

    assert!(env.data_dir().join("activities.json").exists());

    // The week view hides the old session; the full listing shows both.
    env.cmd()
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running").and(predicate::str::contains("Yoga").not()));
    env.cmd()
        .args(["list", "--period", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running").and(predicate::str::contains("Yoga")));

    env.cmd()
        .args(["edit", "1", "--duration", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated Running"));
    env.cmd()
        .args(["ls", "-p", "week"])
        .assert()
        .success()
        .stdout(predicate::str::contains("50m"));

    env.cmd()
        .args(["delete", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 activity"));
    env.cmd()
        .args(["list", "--period", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Yoga").not());
}

#[test]
fn test_invalid_activity_is_rejected() {
    let env = FileEnv::new();

    env.cmd()
        .args(["add", "Running", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));
    env.cmd()
        .args(["add", "Running", "30", "-i", "extreme"])
        .assert()
        .failure();
    env.cmd()
        .args(["delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No activity at index 1"));

    env.cmd()
        .args(["list", "--period", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No activities found."));
}

#[test]
fn test_weight_and_goal_on_json_files() {
    let env = FileEnv::new();

    env.cmd()
        .args(["weight", "add", "81.0", "--date", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded 81.0 kg"));
    env.cmd()
        .args(["weight", "add", "79.5", "--date", "2024-02-01"])
        .assert()
        .success();
    env.cmd()
        .args(["weight", "add", "900"])
        .assert()
        .failure();

    env.cmd()
        .args(["weight", "edit", "2", "79.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Changed 79.5 kg to 79.0 kg"));

    env.cmd().args(["goal", "75"]).assert().success();
    env.cmd()
        .args(["weight", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("2024-01-01 00:00")
                .and(predicate::str::contains("-2.0"))
                .and(predicate::str::contains("Goal: 75.0 kg")),
        );

    env.cmd().args(["goal", "--clear"]).assert().success();
    env.cmd()
        .args(["goal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No weight goal set."));
}

#[test]
fn test_stats_and_types() {
    let env = FileEnv::new();
    env.cmd().args(["add", "Cycling", "60"]).assert().success();
    env.cmd().args(["add", "Cycling", "30"]).assert().success();

    env.cmd()
        .args(["stats", "--days", "7"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Activities:  2")
                .and(predicate::str::contains("1h 30m"))
                .and(predicate::str::contains("45.0 min")),
        );

    env.cmd()
        .args(["stats", "--days", "200000000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Activities:  2"));

    env.cmd()
        .args(["types"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Back-country Skiing"));
}

#[test]
fn test_account_commands_need_database() {
    let env = FileEnv::new();
    env.cmd()
        .args(["friend", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("database backend"));
}

#[test]
fn test_relational_session_and_friends() {
    let env = DbEnv::new();
    env.register("alice");
    env.register("bob");

    env.cmd()
        .args(["register", "alice", "other@example.com", "--password", "secret1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Username already exists"));

    env.cmd()
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));

    env.cmd()
        .args(["login", "alice", "--password", "wrong-one"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));

    env.login("alice");
    env.cmd()
        .args(["add", "Running", "40", "-a", "Endurance"])
        .assert()
        .success();
    env.cmd()
        .args(["friend", "add", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("You and bob are now friends"));
    env.cmd()
        .args(["friend", "add", "bob"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already friends"));

    env.login("bob");
    env.cmd()
        .args(["list", "--period", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No activities found."));
    env.cmd()
        .args(["friend", "feed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice").and(predicate::str::contains("Running")));
    env.cmd()
        .args(["friend", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice@example.com"));

    env.cmd()
        .args(["prefs", "dark_mode", "on"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dark_mode:           true"));

    env.cmd()
        .args(["logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));
    env.cmd()
        .args(["friend", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_stale_session_is_reported() {
    let env = DbEnv::new();
    env.register("carol");
    env.login("carol");

    let session = env.temp.path().join("fit").join("session.json");
    let raw = fs::read_to_string(&session).unwrap();
    assert!(raw.contains("carol"));
    fs::write(&session, r#"{"username": "carol", "token": "forged"}"#).unwrap();

    env.cmd()
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session expired"));
}
