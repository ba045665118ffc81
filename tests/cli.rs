mod common;

use assert_cmd::Command;
use assert_fs::prelude::*;
use common::TestProject;
use predicates::prelude::*;

#[test]
fn help_lists_lifecycle_commands() {
    Command::cargo_bin("stackrig")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("cleanup"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn start_help_shows_health_flags() {
    Command::cargo_bin("stackrig")
        .unwrap()
        .args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--alt-ports"))
        .stdout(predicate::str::contains("--health-attempts"))
        .stdout(predicate::str::contains("--grace"));
}

#[test]
fn completions_bash_generates_output() {
    Command::cargo_bin("stackrig")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stackrig"));
}

#[test]
fn missing_project_dir_fails() {
    Command::cargo_bin("stackrig")
        .unwrap()
        .env_remove("STACKRIG_PROJECT_DIR")
        .args(["start", "--project-dir", "/nonexistent/stackrig-project"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Project directory not found"));
}

#[test]
fn start_without_engine_fails_before_writing_config() {
    let project = assert_fs::TempDir::new().unwrap();
    project
        .child("docker/docker-compose.yml")
        .write_str("services: {}\n")
        .unwrap();
    let empty_path = assert_fs::TempDir::new().unwrap();

    Command::cargo_bin("stackrig")
        .unwrap()
        .env_remove("STACKRIG_PROJECT_DIR")
        .env_remove("STACKRIG_ENV_FILE")
        .env("PATH", empty_path.path())
        .arg("start")
        .arg("--project-dir")
        .arg(project.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No container engine"));

    project.child(".env").assert(predicate::path::missing());
}

#[test]
fn doctor_never_fails() {
    let project = TestProject::new("services: {}\n");
    let empty_path = tempfile::TempDir::new().unwrap();

    project
        .command()
        .env("PATH", empty_path.path())
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("[!!] docker"))
        .stdout(predicate::str::contains("[ok] default-prod"));
}

#[cfg(unix)]
mod with_fake_docker {
    use super::*;
    use common::FakeDocker;

    #[test]
    fn start_configures_and_reports_degraded() {
        let project = TestProject::new("services: {}\n");
        project.write_env("BACKEND_PORT=1\nFRONTEND_PORT=1\n");
        let docker = FakeDocker::install();

        project
            .command()
            .env("PATH", docker.path())
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
            .stdout(predicate::str::contains("WARNING"));

        let env = project.read_env();
        assert!(env.starts_with("BACKEND_PORT=1\nFRONTEND_PORT=1\n"));
        assert!(env.contains("ENCRYPTION_KEY="));
        assert!(env.contains("POSTGRES_PORT=5432\n"));

        let calls = docker.calls();
        assert_eq!(calls[0], "info --format {{.ID}}");
        assert!(calls
            .iter()
            .any(|c| c.starts_with("compose -f") && c.ends_with("up -d")));
    }

    #[test]
    fn start_with_missing_alt_compose_file_fails() {
        let project = TestProject::new("services: {}\n");
        let docker = FakeDocker::install();

        project
            .command()
            .env("PATH", docker.path())
            .args(["start", "--alt-ports", "--grace", "0s", "--skip-prompts"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("compose file not found"));

        assert!(!docker.calls().iter().any(|c| c.ends_with("up -d")));
    }

    #[test]
    fn stop_succeeds_and_prints_summary() {
        let project = TestProject::new("services: {}\n");
        let docker = FakeDocker::install();

        project
            .command()
            .env("PATH", docker.path())
            .arg("stop")
            .assert()
            .success()
            .stdout(predicate::str::contains("Stack stopped."));

        assert!(docker
            .calls()
            .iter()
            .any(|c| c.ends_with("down --remove-orphans")));
    }

    #[test]
    fn declined_cleanup_exits_one_and_touches_nothing() {
        let project = TestProject::new("services: {}\n");
        project.write_env("A=1\n");
        let docker = FakeDocker::install();

        project
            .command()
            .env("PATH", docker.path())
            .arg("cleanup")
            .write_stdin("n\n")
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("cleanup cancelled"));

        assert!(project.env_path().exists());
        // Only runtime detection ran.
        for call in docker.calls() {
            assert!(
                call.starts_with("info ") || call == "compose version",
                "unexpected call: {call}"
            );
        }
    }

    #[test]
    fn wrong_phrase_aborts_cleanup() {
        let project = TestProject::new("services: {}\n");
        project.write_env("A=1\n");
        let docker = FakeDocker::install();

        project
            .command()
            .env("PATH", docker.path())
            .arg("cleanup")
            .write_stdin("y\ndelete everything\n")
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("did not match"));

        assert!(project.env_path().exists());
    }

    #[test]
    fn confirmed_cleanup_removes_env_file() {
        let project = TestProject::new("services: {}\n");
        project.write_env("A=1\n");
        std::fs::create_dir_all(project.root().join("local_storage/blobs")).unwrap();
        let docker = FakeDocker::install();

        project
            .command()
            .env("PATH", docker.path())
            .args(["cleanup", "--countdown", "0s"])
            .write_stdin("yes\nDELETE ALL DATA\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleanup complete."));

        assert!(!project.env_path().exists());
        assert!(!project.root().join("local_storage").exists());
        assert!(docker.calls().iter().any(|c| c == "builder prune -f"));
    }

    #[test]
    fn status_with_no_containers() {
        let project = TestProject::new("services: {}\n");
        let docker = FakeDocker::install();

        project
            .command()
            .env("PATH", docker.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No stack containers found."));
    }
}
