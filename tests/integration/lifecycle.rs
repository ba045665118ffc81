use std::process::Command as StdCommand;

use predicates::prelude::*;

use crate::common::TestProject;

const COMPOSE: &str = r#"services:
  web:
    image: busybox:latest
    container_name: airweave-itest-web
    command: ["sleep", "300"]
"#;

fn container_exists(name: &str) -> bool {
    let output = StdCommand::new("docker")
        .args(["ps", "-a", "--format", "{{.Names}}"])
        .output()
        .expect("docker ps");
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .any(|line| line.trim() == name)
}

#[test]
fn start_status_stop_round() {
    let project = TestProject::new(COMPOSE);
    project.write_env("BACKEND_PORT=1\nFRONTEND_PORT=1\n");

    project
        .command()
        .args([
            "start",
            "--grace",
            "0s",
            "--health-attempts",
            "1",
            "--health-interval",
            "0s",
            "--skip-prompts",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("degraded"));
    assert!(container_exists("airweave-itest-web"));

    project
        .command()
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"airweave-itest-web\""))
        .stdout(predicate::str::contains("\"state\": \"running\""));

    project
        .command()
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stack stopped."));
    assert!(!container_exists("airweave-itest-web"));
}

#[test]
fn stop_on_empty_stack_is_clean() {
    let project = TestProject::new(COMPOSE);

    project
        .command()
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stack stopped."));
}
