use serde::Serialize;
use thiserror::Error;

use crate::profile::ProfileResolver;

/// Kind of runtime resource the stack owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Container,
    Volume,
    Network,
    Image,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Container => "container",
            ResourceKind::Volume => "volume",
            ResourceKind::Network => "network",
            ResourceKind::Image => "image",
        };
        write!(f, "{s}")
    }
}

/// A resource discovered in the live runtime. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedResource {
    pub kind: ResourceKind,
    pub name: String,
    /// Profile that produced the name, when only one profile could have.
    pub profile: Option<&'static str>,
    /// Naming convention the name follows (`default`, `alt-ports`, `test`).
    pub convention: Option<&'static str>,
}

impl ManagedResource {
    /// Attribute `name` by the profile naming conventions. Networks and
    /// images carry no per-profile convention.
    pub fn discovered(kind: ResourceKind, name: impl Into<String>) -> Self {
        let name = name.into();
        let (profile, convention) = match kind {
            ResourceKind::Container => (
                ProfileResolver::attribute_container(&name),
                ProfileResolver::container_convention(&name),
            ),
            ResourceKind::Volume => (
                ProfileResolver::attribute_volume(&name),
                ProfileResolver::volume_convention(&name),
            ),
            ResourceKind::Network | ResourceKind::Image => (None, None),
        };
        Self {
            kind,
            profile: profile.map(|p| p.name),
            convention,
            name,
        }
    }

    /// Orphans match only the generic discovery patterns.
    pub fn is_orphan(&self) -> bool {
        self.convention.is_none()
    }
}

/// Why a single resource could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemovalError {
    #[error("not found")]
    NotFound,
    #[error("in use: {0}")]
    InUse(String),
    #[error("{0}")]
    Failed(String),
}

impl RemovalError {
    /// Classify runtime stderr into a removal error.
    pub fn classify(detail: &str) -> Self {
        let lower = detail.to_ascii_lowercase();
        if lower.contains("no such") || lower.contains("not found") || lower.contains("does not exist")
        {
            RemovalError::NotFound
        } else if lower.contains("in use")
            || lower.contains("being used")
            || lower.contains("has active endpoints")
            || lower.contains("conflict")
        {
            RemovalError::InUse(detail.trim().to_string())
        } else {
            RemovalError::Failed(detail.trim().to_string())
        }
    }
}

/// Per-name outcome of a batch removal. Every name in the input appears
/// exactly once, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalReport {
    pub kind: ResourceKind,
    pub outcomes: Vec<(String, Result<(), RemovalError>)>,
}

impl RemovalReport {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, name: impl Into<String>, outcome: Result<(), RemovalError>) {
        self.outcomes.push((name.into(), outcome));
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(n, _)| n.as_str())
    }

    pub fn remaining(&self) -> impl Iterator<Item = (&str, &RemovalError)> {
        self.outcomes
            .iter()
            .filter_map(|(n, r)| r.as_ref().err().map(|e| (n.as_str(), e)))
    }

    pub fn removed_count(&self) -> usize {
        self.removed().count()
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining().count()
    }
}

/// Failure of a whole runtime call (listing, compose, prune).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {detail}")]
    Failed { command: String, detail: String },
}

/// Failure of a compose up/down for one profile.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("could not run compose for profile '{profile}': {source}")]
    Spawn {
        profile: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compose {action} failed for profile '{profile}': {detail}")]
    Failed {
        profile: String,
        action: &'static str,
        detail: String,
    },
}

impl ComposeError {
    pub fn profile(&self) -> &str {
        match self {
            ComposeError::Spawn { profile, .. } | ComposeError::Failed { profile, .. } => profile,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ComposeError::Spawn { source, .. } => source.to_string(),
            ComposeError::Failed { detail, .. } => detail.clone(),
        }
    }
}
