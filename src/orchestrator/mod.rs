pub mod report;
pub mod state;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::secrets::{generate_encryption_key, mask_value, ENCRYPTION_KEY, OPTIONAL_API_KEYS};
use crate::config::ConfigStore;
use crate::confirm::{ConfirmAbort, ConfirmationGate, Prompter};
use crate::error::{LifecycleError, Result};
use crate::health::{HealthPoller, HealthPolicy, HealthTarget};
use crate::profile::{
    Mode, ProfileResolver, Variant, BACKEND_HEALTH_PATH, FEATURE_FLAG_DEFAULTS,
};
use crate::runtime::{ComposeOutcome, RuntimeError, RuntimeProbe};
use crate::ui::output;

use report::{StartReport, StepReport, TeardownSummary};
use state::{LifecycleState, StateMachine};

pub const STEP_COMPOSE_DOWN: &str = "compose down";
pub const STEP_STOP_CONTAINERS: &str = "stop containers";
pub const STEP_ORPHANS: &str = "orphan containers";
pub const STEP_CONTAINERS: &str = "containers";
pub const STEP_VOLUMES: &str = "volumes";
pub const STEP_IMAGES: &str = "images";
pub const STEP_NETWORKS: &str = "networks";
pub const STEP_LOCAL_FILES: &str = "local files";
pub const STEP_PRUNE: &str = "prune";

/// Parameters of a `start` run.
#[derive(Debug, Clone)]
pub struct StartOptions {
    pub mode: Mode,
    pub variant: Variant,
    pub health: HealthPolicy,
    /// Ask for missing optional API keys.
    pub prompt_api_keys: bool,
}

impl StartOptions {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            variant: Variant::Prod,
            health: HealthPolicy::default(),
            prompt_api_keys: false,
        }
    }
}

#[derive(Debug)]
pub enum CleanupOutcome {
    /// The operator backed out; nothing was touched.
    Aborted(ConfirmAbort),
    Destroyed(TeardownSummary),
}

/// Drives one start, stop or cleanup transition against the runtime.
///
/// The engine and compose tool were resolved when the [`RuntimeProbe`] was
/// connected, so every precondition has already passed by the time a
/// controller exists. Each external call is awaited before the next.
pub struct Controller {
    probe: RuntimeProbe,
    health: HealthPoller,
    prompter: Arc<dyn Prompter>,
    machine: StateMachine,
}

impl Controller {
    pub fn new(probe: RuntimeProbe, health: HealthPoller, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            probe,
            health,
            prompter,
            machine: StateMachine::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.machine.current()
    }

    pub fn history(&self) -> &[LifecycleState] {
        self.machine.history()
    }

    // ------------------------------------------------------------------
    // start
    // ------------------------------------------------------------------

    pub async fn start(&mut self, opts: &StartOptions) -> Result<StartReport> {
        self.observe_existing(opts.mode).await;

        self.machine.advance(LifecycleState::Configuring)?;
        output::section("Configuring environment");
        let store = self.configure(opts).await?;

        self.machine.advance(LifecycleState::Starting)?;
        output::section(&format!("Starting {} stack", opts.mode.label()));
        let profiles = ProfileResolver::bring_up(opts.mode, opts.variant);
        let mut applied = 0;
        for profile in &profiles {
            match self.probe.compose_up(profile).await {
                Ok(ComposeOutcome::Applied) => {
                    applied += 1;
                    output::success(format!("{} is up ({})", profile.name, profile.compose_file))
                }
                Ok(ComposeOutcome::Skipped(name)) => {
                    output::warning(format!("{name} skipped: {} not found", profile.compose_file))
                }
                Err(e) => {
                    output::failure(e.to_string());
                    self.machine.advance(LifecycleState::Degraded)?;
                    return Err(e.into());
                }
            }
        }
        if applied == 0 {
            self.machine.advance(LifecycleState::Degraded)?;
            let missing: Vec<&str> = profiles.iter().map(|p| p.compose_file).collect();
            return Err(LifecycleError::ComposeFailure {
                profile: profiles
                    .iter()
                    .map(|p| p.name)
                    .collect::<Vec<_>>()
                    .join(", "),
                detail: format!("compose file not found: {}", missing.join(", ")),
            });
        }

        self.machine.advance(LifecycleState::HealthChecking)?;
        output::section("Checking service health");
        if !opts.health.grace.is_zero() {
            output::note(format!(
                "Waiting {} for services to settle",
                humantime::format_duration(opts.health.grace)
            ));
            tokio::time::sleep(opts.health.grace).await;
        }

        let backend = HealthTarget::local(
            "backend",
            port_value(&store, opts.mode, opts.mode.backend_port_key()),
            BACKEND_HEALTH_PATH,
        );
        let backend = self
            .health
            .poll(&backend, opts.health.max_attempts, opts.health.interval)
            .await;

        let next = if backend.succeeded {
            output::success(format!(
                "Backend is healthy at {} (attempt {})",
                backend.target.url, backend.attempts
            ));
            LifecycleState::Running
        } else {
            output::warning(format!(
                "Backend did not become healthy after {} attempts",
                backend.attempts
            ));
            LifecycleState::Degraded
        };

        let frontend = HealthTarget::local(
            "frontend",
            port_value(&store, opts.mode, opts.mode.frontend_port_key()),
            "",
        );
        let frontend = self.health.probe_once(&frontend).await;
        if frontend.succeeded {
            output::success(format!("Frontend is reachable at {}", frontend.target.url));
        } else {
            output::warning(format!(
                "Frontend is not responding yet at {}",
                frontend.target.url
            ));
        }

        self.machine.advance(next)?;
        Ok(StartReport {
            mode: opts.mode,
            state: next,
            backend,
            frontend,
        })
    }

    /// Report containers left over from an earlier run; compose reconciles
    /// them during bring-up.
    async fn observe_existing(&self, mode: Mode) {
        let mut filter = crate::runtime::NameFilter::default();
        for profile in ProfileResolver::resolve(mode) {
            for pattern in profile.container_filter().patterns() {
                filter.push(pattern.clone());
            }
        }
        match self.probe.list_containers(&filter).await {
            Ok(existing) if !existing.is_empty() => {
                info!(count = existing.len(), "existing stack containers found");
                output::note(format!(
                    "{} existing {} container(s) found, compose will reconcile them",
                    existing.len(),
                    mode.label()
                ));
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "could not inspect existing containers"),
        }
    }

    async fn configure(&self, opts: &StartOptions) -> Result<ConfigStore> {
        let layout = self.probe.layout();
        let existed = layout.env_file.exists();
        let mut store = ConfigStore::load_or_seed(&layout.env_file, &layout.env_template)?;
        if !existed {
            if layout.env_template.is_file() {
                output::success(format!(
                    "Created {} from {}",
                    display_relative(&layout.env_file, &layout.root),
                    display_relative(&layout.env_template, &layout.root)
                ));
            } else {
                output::success(format!(
                    "Created {}",
                    display_relative(&layout.env_file, &layout.root)
                ));
            }
        }

        store.rotate_secret(ENCRYPTION_KEY, generate_encryption_key);
        output::success(format!("Generated new {ENCRYPTION_KEY}"));

        let mut defaulted = Vec::new();
        for (key, value) in opts.mode.port_defaults().iter().chain(FEATURE_FLAG_DEFAULTS) {
            if store.ensure_default(key, value) {
                defaulted.push(*key);
            }
        }
        if !defaulted.is_empty() {
            output::success(format!("Added defaults for {}", defaulted.join(", ")));
        }

        if opts.prompt_api_keys {
            self.prompt_api_keys(&mut store).await;
        }

        store.save()?;
        output::success(format!(
            "Saved {}",
            display_relative(store.path(), &layout.root)
        ));
        Ok(store)
    }

    async fn prompt_api_keys(&self, store: &mut ConfigStore) {
        for key in OPTIONAL_API_KEYS {
            if store.get(key).is_some_and(|v| !v.trim().is_empty()) {
                continue;
            }
            let question = format!("Enter {key} (optional, press Enter to skip):");
            match self.prompter.ask(&question).await {
                Ok(Some(answer)) if !answer.trim().is_empty() => {
                    store.upsert_quoted(key, &answer);
                    output::success(format!("Set {key} ({})", mask_value(&answer)));
                }
                Ok(Some(_)) => output::note(format!("Skipped {key}")),
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "could not read API key input");
                    break;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // stop
    // ------------------------------------------------------------------

    pub async fn stop(&mut self) -> Result<TeardownSummary> {
        self.machine.advance(LifecycleState::Stopping)?;
        output::section("Stopping stack");

        let mut steps = Vec::new();
        steps.push(self.compose_down_all().await);

        let orphans = match self.probe.list_containers(&ProfileResolver::all_containers()).await {
            Ok(names) => {
                let report = self.probe.stop_and_remove(names.iter().map(String::as_str)).await;
                StepReport::from_removals(STEP_ORPHANS, &report)
            }
            Err(e) => StepReport::failed(STEP_ORPHANS, e.to_string()),
        };
        print_step(&orphans);
        steps.push(orphans);

        steps.push(self.remove_networks().await);

        self.machine.advance(LifecycleState::Stopped)?;
        Ok(TeardownSummary {
            state: LifecycleState::Stopped,
            steps,
        })
    }

    /// `compose down` for every profile, alt-ports first. Failures are
    /// recorded and the walk continues.
    async fn compose_down_all(&self) -> StepReport {
        let mut step = StepReport::new(STEP_COMPOSE_DOWN).as_informational();
        for profile in ProfileResolver::teardown_order() {
            match self.probe.compose_down(profile).await {
                Ok(ComposeOutcome::Applied) => step.removed.push(profile.name.to_string()),
                Ok(ComposeOutcome::Skipped(_)) => {}
                Err(e) => {
                    warn!(profile = profile.name, error = %e, "compose down failed");
                    step.remaining.push((profile.name.to_string(), e.detail()));
                }
            }
        }
        print_step(&step);
        step
    }

    async fn remove_networks(&self) -> StepReport {
        let step = match self.probe.list_networks(&ProfileResolver::all_networks()).await {
            Ok(names) => {
                let report = self.probe.remove_networks(names.iter().map(String::as_str)).await;
                StepReport::from_removals(STEP_NETWORKS, &report)
            }
            Err(e) => StepReport::failed(STEP_NETWORKS, e.to_string()),
        };
        print_step(&step);
        step
    }

    // ------------------------------------------------------------------
    // cleanup
    // ------------------------------------------------------------------

    pub async fn cleanup(&mut self, gate: &ConfirmationGate) -> Result<CleanupOutcome> {
        self.machine.advance(LifecycleState::ConfirmingDestroy)?;
        if let Err(abort) = gate.confirm(&self.doomed()).await {
            self.machine.advance(LifecycleState::Uninitialized)?;
            output::warning(abort.to_string());
            return Ok(CleanupOutcome::Aborted(abort));
        }

        self.machine.advance(LifecycleState::Destroying)?;
        output::section("Destroying stack");

        let mut steps = Vec::new();
        steps.push(self.compose_down_all().await);

        let containers = ProfileResolver::all_containers();
        let stop = match self.probe.list_containers(&containers).await {
            Ok(names) => {
                let report = self.probe.stop_containers(names.iter().map(String::as_str)).await;
                StepReport::from_removals(STEP_STOP_CONTAINERS, &report)
            }
            Err(e) => StepReport::failed(STEP_STOP_CONTAINERS, e.to_string()),
        }
        .as_informational();
        print_step(&stop);
        steps.push(stop);

        let remove = match self.probe.list_containers(&containers).await {
            Ok(names) => {
                let report = self
                    .probe
                    .remove_containers(names.iter().map(String::as_str))
                    .await;
                StepReport::from_removals(STEP_CONTAINERS, &report)
            }
            Err(e) => StepReport::failed(STEP_CONTAINERS, e.to_string()),
        };
        print_step(&remove);
        steps.push(remove);

        steps.push(self.remove_volumes().await);

        let images = match self.probe.list_images(&ProfileResolver::all_images()).await {
            Ok(names) => {
                let report = self.probe.remove_images(names.iter().map(String::as_str)).await;
                StepReport::from_removals(STEP_IMAGES, &report)
            }
            Err(e) => StepReport::failed(STEP_IMAGES, e.to_string()),
        };
        print_step(&images);
        steps.push(images);

        steps.push(self.remove_networks().await);
        steps.push(self.remove_local_files().await);
        steps.push(self.prune().await);

        self.machine.advance(LifecycleState::Destroyed)?;
        Ok(CleanupOutcome::Destroyed(TeardownSummary {
            state: LifecycleState::Destroyed,
            steps,
        }))
    }

    /// Human-readable list of what cleanup wipes. Built without touching
    /// the runtime so a declined confirmation issues no calls.
    fn doomed(&self) -> Vec<String> {
        let layout = self.probe.layout();
        let mut items = vec![
            "All stack containers (default, alt-ports and test)".to_string(),
            "All stack volumes: database, cache and vector data".to_string(),
            "Stack images, including locally built backend/frontend images".to_string(),
            "Stack networks".to_string(),
        ];
        for dir in &layout.storage_dirs {
            items.push(format!("{}/", display_relative(dir, &layout.root)));
        }
        items.push(format!(
            "{} (including {ENCRYPTION_KEY})",
            display_relative(&layout.env_file, &layout.root)
        ));
        items
    }

    /// Everything the runtime lists that matches a known name or the
    /// discovery pattern. Falls back to the static names if listing fails.
    async fn remove_volumes(&self) -> StepReport {
        let names: BTreeSet<String> = match self.probe.list_volumes(&ProfileResolver::all_volumes()).await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "volume listing failed, removing known volumes only");
                ProfileResolver::known_volumes()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            }
        };
        let report = self.probe.remove_volumes(names.iter().map(String::as_str)).await;
        let step = StepReport::from_removals(STEP_VOLUMES, &report);
        print_step(&step);
        step
    }

    async fn remove_local_files(&self) -> StepReport {
        let layout = self.probe.layout();
        let mut step = StepReport::new(STEP_LOCAL_FILES);

        for dir in &layout.storage_dirs {
            let label = format!("{}/", display_relative(dir, &layout.root));
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => step.removed.push(label),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => step.remaining.push((label, e.to_string())),
            }
        }

        let label = display_relative(&layout.env_file, &layout.root);
        match tokio::fs::remove_file(&layout.env_file).await {
            Ok(()) => step.removed.push(label),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => step.remaining.push((label, e.to_string())),
        }

        print_step(&step);
        step
    }

    async fn prune(&self) -> StepReport {
        let mut step = StepReport::new(STEP_PRUNE).as_informational();
        record_prune(&mut step, "build cache", self.probe.prune_build_cache().await);
        record_prune(
            &mut step,
            "dangling images",
            self.probe.prune_dangling_images().await,
        );
        print_step(&step);
        step
    }
}

fn record_prune(step: &mut StepReport, what: &str, result: std::result::Result<(), RuntimeError>) {
    match result {
        Ok(()) => step.removed.push(what.to_string()),
        Err(e) => {
            warn!(what, error = %e, "prune failed");
            step.remaining.push((what.to_string(), e.to_string()));
        }
    }
}

/// Configured value of a port key, or the convention default when unset.
fn port_value<'a>(store: &'a ConfigStore, mode: Mode, key: &str) -> &'a str {
    store
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| mode.default_port(key))
        .unwrap_or_default()
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn print_step(step: &StepReport) {
    if let Some(err) = &step.error {
        output::failure(format!("{}: {err}", step.step));
    } else if step.remaining.is_empty() {
        output::success(format!("{}: {} done", step.step, step.removed.len()));
    } else {
        output::warning(format!(
            "{}: {} done, {} remaining",
            step.step,
            step.removed.len(),
            step.remaining.len()
        ));
    }
}
