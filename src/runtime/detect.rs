use std::time::Duration;

use tracing::{debug, info};

use crate::error::LifecycleError;
use crate::runtime::command::{CommandLine, CommandRunner};

/// How long a single availability check may take before the candidate is
/// considered unresponsive.
const DETECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Container engine whose daemon answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Docker,
    Podman,
}

impl EngineKind {
    /// Detection order.
    pub const ALL: [EngineKind; 2] = [EngineKind::Docker, EngineKind::Podman];

    pub fn binary(self) -> &'static str {
        match self {
            EngineKind::Docker => "docker",
            EngineKind::Podman => "podman",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.binary())
    }
}

/// Compose implementation used for up/down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// `<engine> compose` plugin.
    ComposeV2,
    /// Standalone `docker-compose`.
    ComposeV1,
    /// `podman-compose`.
    PodCompose,
}

impl ToolKind {
    /// Detection priority.
    pub const ALL: [ToolKind; 3] = [ToolKind::ComposeV2, ToolKind::ComposeV1, ToolKind::PodCompose];

    /// Command prefix every compose invocation starts with.
    pub fn base_command(self, engine: EngineKind) -> CommandLine {
        match self {
            ToolKind::ComposeV2 => CommandLine::new(engine.binary()).arg("compose"),
            ToolKind::ComposeV1 => CommandLine::new("docker-compose"),
            ToolKind::PodCompose => CommandLine::new("podman-compose"),
        }
    }

    pub fn label(self, engine: EngineKind) -> String {
        match self {
            ToolKind::ComposeV2 => format!("{} compose", engine.binary()),
            ToolKind::ComposeV1 => "docker-compose".to_string(),
            ToolKind::PodCompose => "podman-compose".to_string(),
        }
    }
}

/// Run `cmd` and report whether it completed successfully in time.
async fn responds(runner: &dyn CommandRunner, cmd: &CommandLine) -> bool {
    match tokio::time::timeout(DETECT_TIMEOUT, runner.run(cmd)).await {
        Ok(Ok(output)) => output.success,
        Ok(Err(e)) => {
            debug!(command = %cmd.display(), error = %e, "not available");
            false
        }
        Err(_) => {
            debug!(command = %cmd.display(), "timed out");
            false
        }
    }
}

/// Check every engine in detection order, reporting which daemons answer.
pub async fn probe_engines(runner: &dyn CommandRunner) -> Vec<(EngineKind, bool)> {
    let mut results = Vec::new();
    for engine in EngineKind::ALL {
        let cmd = CommandLine::new(engine.binary()).args(["info", "--format", "{{.ID}}"]);
        results.push((engine, responds(runner, &cmd).await));
    }
    results
}

/// Check every compose variant in priority order.
pub async fn probe_compose_tools(
    runner: &dyn CommandRunner,
    engine: EngineKind,
) -> Vec<(ToolKind, bool)> {
    let mut results = Vec::new();
    for tool in ToolKind::ALL {
        let cmd = tool.base_command(engine).arg("version");
        results.push((tool, responds(runner, &cmd).await));
    }
    results
}

/// First engine whose daemon is reachable: Docker, then Podman.
pub async fn detect_container_engine(
    runner: &dyn CommandRunner,
) -> Result<EngineKind, LifecycleError> {
    for engine in EngineKind::ALL {
        let cmd = CommandLine::new(engine.binary()).args(["info", "--format", "{{.ID}}"]);
        if responds(runner, &cmd).await {
            info!(engine = %engine, "container engine detected");
            return Ok(engine);
        }
    }
    Err(LifecycleError::DaemonUnavailable)
}

/// First compose variant that answers `version`.
pub async fn detect_compose_tool(
    runner: &dyn CommandRunner,
    engine: EngineKind,
) -> Result<ToolKind, LifecycleError> {
    for tool in ToolKind::ALL {
        let cmd = tool.base_command(engine).arg("version");
        if responds(runner, &cmd).await {
            info!(tool = %tool.label(engine), "compose tool detected");
            return Ok(tool);
        }
    }
    Err(LifecycleError::NoRuntimeAvailable)
}
