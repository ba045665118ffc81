use std::path::PathBuf;

use thiserror::Error;

use crate::orchestrator::state::LifecycleState;
use crate::runtime::ComposeError;

/// Errors that terminate a lifecycle transition.
///
/// Everything below this level (per-resource removals, health probes,
/// compose calls during teardown) is recorded in a report instead of being
/// raised, so only preconditions, configuration I/O and a failed bring-up
/// ever reach the caller.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(
        "No compose tool found (tried `docker compose`, `docker-compose`, `podman-compose`)"
    )]
    NoRuntimeAvailable,

    #[error("No container engine daemon is reachable (tried docker, podman). Is Docker or Podman running?")]
    DaemonUnavailable,

    #[error("environment configuration {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compose up failed for profile '{profile}': {detail}")]
    ComposeFailure { profile: String, detail: String },

    #[error("illegal lifecycle transition {from} -> {to}")]
    IllegalTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}

impl LifecycleError {
    pub(crate) fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }
}

impl From<ComposeError> for LifecycleError {
    fn from(err: ComposeError) -> Self {
        Self::ComposeFailure {
            profile: err.profile().to_string(),
            detail: err.detail(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
