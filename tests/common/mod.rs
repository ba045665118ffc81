#![allow(dead_code)]
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub const COMPOSE_FILE: &str = "docker/docker-compose.yml";

/// A throwaway stack checkout.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    /// Checkout with `docker/docker-compose.yml` holding `compose_yaml`.
    pub fn new(compose_yaml: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let compose = dir.path().join(COMPOSE_FILE);
        std::fs::create_dir_all(compose.parent().unwrap()).unwrap();
        std::fs::write(&compose, compose_yaml).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn env_path(&self) -> PathBuf {
        self.root().join(".env")
    }

    pub fn write_env(&self, content: &str) {
        std::fs::write(self.env_path(), content).unwrap();
    }

    pub fn read_env(&self) -> String {
        std::fs::read_to_string(self.env_path()).unwrap()
    }

    /// `stackrig` pointed at this checkout, isolated from the caller's
    /// environment overrides.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("stackrig").unwrap();
        cmd.env_remove("STACKRIG_PROJECT_DIR")
            .env_remove("STACKRIG_ENV_FILE")
            .env_remove("RUST_LOG")
            .arg("--project-dir")
            .arg(self.root());
        cmd
    }
}

/// A directory holding a fake `docker` executable that records its
/// arguments to `calls.log` and exits 0 with no output.
#[cfg(unix)]
pub struct FakeDocker {
    pub bin: TempDir,
}

#[cfg(unix)]
impl FakeDocker {
    pub fn install() -> Self {
        use std::os::unix::fs::PermissionsExt;

        let bin = TempDir::new().unwrap();
        let log = bin.path().join("calls.log");
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> \"{}\"\nexit 0\n",
            log.display()
        );
        let docker = bin.path().join("docker");
        std::fs::write(&docker, script).unwrap();
        std::fs::set_permissions(&docker, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { bin }
    }

    pub fn path(&self) -> &Path {
        self.bin.path()
    }

    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.bin.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
