use crate::health::HealthCheckResult;
use crate::orchestrator::state::LifecycleState;
use crate::profile::Mode;
use crate::runtime::RemovalReport;

/// What one teardown step achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    pub removed: Vec<String>,
    /// Names left behind and why.
    pub remaining: Vec<(String, String)>,
    /// Set when the step could not run at all (e.g. listing failed).
    pub error: Option<String>,
    /// Counts actions (profiles brought down, containers stopped, caches
    /// pruned) rather than removed resources; left out of the totals.
    pub informational: bool,
}

impl StepReport {
    pub fn new(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            ..Default::default()
        }
    }

    pub fn from_removals(step: impl Into<String>, report: &RemovalReport) -> Self {
        let mut out = Self::new(step);
        out.absorb(report);
        out
    }

    pub fn absorb(&mut self, report: &RemovalReport) {
        self.removed.extend(report.removed().map(str::to_string));
        self.remaining.extend(
            report
                .remaining()
                .map(|(name, err)| (name.to_string(), err.to_string())),
        );
    }

    pub fn failed(step: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(step)
        }
    }

    /// Mark the step as not counting removed resources.
    pub fn as_informational(mut self) -> Self {
        self.informational = true;
        self
    }

    pub fn is_clean(&self) -> bool {
        self.remaining.is_empty() && self.error.is_none()
    }
}

/// Outcome of `stop` or `cleanup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownSummary {
    pub state: LifecycleState,
    pub steps: Vec<StepReport>,
}

impl TeardownSummary {
    fn resource_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.informational)
    }

    /// Resources removed, across the steps that remove resources.
    pub fn total_removed(&self) -> usize {
        self.resource_steps().map(|s| s.removed.len()).sum()
    }

    pub fn total_remaining(&self) -> usize {
        self.resource_steps().map(|s| s.remaining.len()).sum()
    }

    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == name)
    }
}

/// Outcome of `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    pub mode: Mode,
    pub state: LifecycleState,
    pub backend: HealthCheckResult,
    pub frontend: HealthCheckResult,
}
