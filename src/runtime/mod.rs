//! The container runtime as seen through its CLI.
//!
//! [`RuntimeProbe`] is built once per invocation: it detects the engine and
//! compose tool up front and threads them through every later call. All
//! calls are single-attempt; batch removals isolate failures per name.

pub mod command;
pub mod detect;
pub mod pattern;
pub mod report;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::StackLayout;
use crate::error::LifecycleError;
use crate::profile::ProfileDescriptor;

pub use command::{CommandLine, CommandOutput, CommandRunner, SystemRunner};
pub use detect::{EngineKind, ToolKind};
pub use pattern::{NameFilter, NamePattern};
pub use report::{
    ComposeError, ManagedResource, RemovalError, RemovalReport, ResourceKind, RuntimeError,
};

/// Result of a compose up/down that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeOutcome {
    Applied,
    /// The profile's compose file is not present in this checkout.
    Skipped(String),
}

/// One row of `ps -a` for the status listing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContainerRow {
    pub name: String,
    pub state: String,
    pub status: String,
    pub ports: String,
}

impl ContainerRow {
    fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split('\t');
        let name = fields.next()?.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            state: fields.next().unwrap_or_default().trim().to_string(),
            status: fields.next().unwrap_or_default().trim().to_string(),
            ports: fields.next().unwrap_or_default().trim().to_string(),
        })
    }
}

/// `ps -a` through `engine` directly. Needs no compose tool, so it also
/// serves commands that only inspect.
pub async fn list_container_rows(
    runner: &dyn CommandRunner,
    engine: EngineKind,
    filter: &NameFilter,
) -> Result<Vec<ContainerRow>, RuntimeError> {
    let cmd = CommandLine::new(engine.binary()).args([
        "ps",
        "-a",
        "--format",
        "{{.Names}}\t{{.State}}\t{{.Status}}\t{{.Ports}}",
    ]);
    let output = runner
        .run(&cmd)
        .await
        .map_err(|source| RuntimeError::Spawn {
            command: cmd.display(),
            source,
        })?;
    if !output.success {
        return Err(RuntimeError::Failed {
            command: cmd.display(),
            detail: output.failure_detail(),
        });
    }
    let mut rows: Vec<ContainerRow> = output
        .lines()
        .filter_map(ContainerRow::parse)
        .filter(|row| filter.matches(&row.name))
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
}

pub struct RuntimeProbe {
    runner: Arc<dyn CommandRunner>,
    engine: EngineKind,
    tool: ToolKind,
    layout: StackLayout,
}

impl RuntimeProbe {
    /// Detect the engine (which must answer before anything else runs) and
    /// then the compose tool.
    pub async fn connect(
        runner: Arc<dyn CommandRunner>,
        layout: StackLayout,
    ) -> Result<Self, LifecycleError> {
        let engine = detect::detect_container_engine(runner.as_ref()).await?;
        let tool = detect::detect_compose_tool(runner.as_ref(), engine).await?;
        Ok(Self::new(runner, engine, tool, layout))
    }

    pub fn new(
        runner: Arc<dyn CommandRunner>,
        engine: EngineKind,
        tool: ToolKind,
        layout: StackLayout,
    ) -> Self {
        Self {
            runner,
            engine,
            tool,
            layout,
        }
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn layout(&self) -> &StackLayout {
        &self.layout
    }

    fn engine_command(&self) -> CommandLine {
        CommandLine::new(self.engine.binary())
    }

    fn compose_command(&self, profile: &ProfileDescriptor) -> Option<CommandLine> {
        let file = self.layout.compose_path(profile.compose_file);
        if !file.is_file() {
            return None;
        }
        let mut cmd = self
            .tool
            .base_command(self.engine)
            .arg("-f")
            .arg(file.to_string_lossy());
        if self.layout.env_file.is_file() {
            cmd = cmd
                .arg("--env-file")
                .arg(self.layout.env_file.to_string_lossy());
        }
        Some(cmd.current_dir(&self.layout.root))
    }

    async fn compose(
        &self,
        profile: &ProfileDescriptor,
        action: &'static str,
        args: &[&str],
    ) -> Result<ComposeOutcome, ComposeError> {
        let Some(cmd) = self.compose_command(profile) else {
            debug!(profile = profile.name, file = profile.compose_file, "compose file missing");
            return Ok(ComposeOutcome::Skipped(profile.name.to_string()));
        };
        let cmd = cmd.args(args.iter().copied());
        let output = self
            .runner
            .run(&cmd)
            .await
            .map_err(|source| ComposeError::Spawn {
                profile: profile.name.to_string(),
                source,
            })?;
        if !output.success {
            return Err(ComposeError::Failed {
                profile: profile.name.to_string(),
                action,
                detail: output.failure_detail(),
            });
        }
        info!(profile = profile.name, action, "compose finished");
        Ok(ComposeOutcome::Applied)
    }

    pub async fn compose_up(
        &self,
        profile: &ProfileDescriptor,
    ) -> Result<ComposeOutcome, ComposeError> {
        self.compose(profile, "up", &["up", "-d"]).await
    }

    pub async fn compose_down(
        &self,
        profile: &ProfileDescriptor,
    ) -> Result<ComposeOutcome, ComposeError> {
        self.compose(profile, "down", &["down", "--remove-orphans"])
            .await
    }

    async fn query(&self, args: &[&str]) -> Result<CommandOutput, RuntimeError> {
        let cmd = self.engine_command().args(args.iter().copied());
        let output = self
            .runner
            .run(&cmd)
            .await
            .map_err(|source| RuntimeError::Spawn {
                command: cmd.display(),
                source,
            })?;
        if !output.success {
            return Err(RuntimeError::Failed {
                command: cmd.display(),
                detail: output.failure_detail(),
            });
        }
        Ok(output)
    }

    async fn list_names(
        &self,
        args: &[&str],
        filter: &NameFilter,
    ) -> Result<BTreeSet<String>, RuntimeError> {
        let output = self.query(args).await?;
        Ok(output
            .lines()
            .filter(|name| filter.matches(name))
            .map(str::to_string)
            .collect())
    }

    pub async fn list_containers(
        &self,
        filter: &NameFilter,
    ) -> Result<BTreeSet<String>, RuntimeError> {
        self.list_names(&["ps", "-a", "--format", "{{.Names}}"], filter)
            .await
    }

    pub async fn list_volumes(&self, filter: &NameFilter) -> Result<BTreeSet<String>, RuntimeError> {
        self.list_names(&["volume", "ls", "--format", "{{.Name}}"], filter)
            .await
    }

    pub async fn list_networks(
        &self,
        filter: &NameFilter,
    ) -> Result<BTreeSet<String>, RuntimeError> {
        self.list_names(&["network", "ls", "--format", "{{.Name}}"], filter)
            .await
    }

    /// Image references as `repository:tag`; untagged images are skipped.
    pub async fn list_images(&self, filter: &NameFilter) -> Result<BTreeSet<String>, RuntimeError> {
        let names = self
            .list_names(&["images", "--format", "{{.Repository}}:{{.Tag}}"], filter)
            .await?;
        Ok(names
            .into_iter()
            .filter(|r| !r.starts_with("<none>") && !r.ends_with(":<none>"))
            .collect())
    }

    /// Containers matching `filter` with state and ports, for display.
    pub async fn container_rows(&self, filter: &NameFilter) -> Result<Vec<ContainerRow>, RuntimeError> {
        list_container_rows(self.runner.as_ref(), self.engine, filter).await
    }

    async fn remove_each<'a>(
        &self,
        kind: ResourceKind,
        names: impl IntoIterator<Item = &'a str>,
        args: &[&str],
    ) -> RemovalReport {
        let mut report = RemovalReport::new(kind);
        for name in names {
            let cmd = self.engine_command().args(args.iter().copied()).arg(name);
            let outcome = match self.runner.run(&cmd).await {
                Ok(output) if output.success => Ok(()),
                Ok(output) => Err(RemovalError::classify(&output.failure_detail())),
                Err(e) => Err(RemovalError::Failed(e.to_string())),
            };
            match &outcome {
                Ok(()) => debug!(%kind, name, "removed"),
                Err(e) => warn!(%kind, name, error = %e, "could not remove"),
            }
            report.record(name, outcome);
        }
        report
    }

    /// Stop each container. Already-stopped containers stop successfully.
    pub async fn stop_containers<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> RemovalReport {
        self.remove_each(ResourceKind::Container, names, &["stop"])
            .await
    }

    pub async fn remove_containers<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> RemovalReport {
        self.remove_each(ResourceKind::Container, names, &["rm", "-f"])
            .await
    }

    /// Stop then force-remove each container; the report reflects the
    /// removal, a failed stop is only logged.
    pub async fn stop_and_remove<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str> + Clone,
    ) -> RemovalReport {
        let stopped = self.stop_containers(names.clone()).await;
        for (name, err) in stopped.remaining() {
            debug!(name, error = %err, "stop failed, forcing removal");
        }
        self.remove_containers(names).await
    }

    pub async fn remove_volumes<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> RemovalReport {
        self.remove_each(ResourceKind::Volume, names, &["volume", "rm"])
            .await
    }

    pub async fn remove_networks<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> RemovalReport {
        self.remove_each(ResourceKind::Network, names, &["network", "rm"])
            .await
    }

    pub async fn remove_images<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> RemovalReport {
        self.remove_each(ResourceKind::Image, names, &["rmi", "-f"])
            .await
    }

    pub async fn prune_build_cache(&self) -> Result<(), RuntimeError> {
        self.query(&["builder", "prune", "-f"]).await.map(|_| ())
    }

    pub async fn prune_dangling_images(&self) -> Result<(), RuntimeError> {
        self.query(&["image", "prune", "-f"]).await.map(|_| ())
    }
}
