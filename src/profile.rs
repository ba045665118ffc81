//! Static compose profiles and the naming conventions that go with them.
//!
//! Every profile the stack can run under is enumerated here. Ordinals give
//! the resolution (bring-up) order; teardown walks them in reverse so the
//! narrower alt-ports and test name patterns are handled before the broad
//! default `airweave-*` pattern that also matches them.

use crate::runtime::pattern::{NameFilter, NamePattern};

/// Port convention requested by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Default,
    Alternate,
}

/// Build flavour within a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Prod,
    Dev,
}

/// Stack identifier shared by every resource name.
pub const STACK_ID: &str = "airweave";

/// Container pattern catching anything the stack ever created.
pub const GENERIC_CONTAINER_PATTERN: &str = "airweave*";

/// Volume discovery pattern for cleanup.
pub const STACK_VOLUME_PATTERN: &str = "*airweave*";

/// Network discovery pattern.
pub const STACK_NETWORK_PATTERN: &str = "*airweave*";

/// Volumes created before the `airweave_` prefix existed, when compose
/// still derived names from the `docker/` project directory.
pub const LEGACY_VOLUMES: &[&str] = &[
    "docker_postgres_data",
    "docker_redis_data",
    "docker_qdrant_data",
];

/// Image repositories built by compose under generic service aliases.
pub const GENERIC_IMAGE_ALIASES: &[&str] = &[
    "docker-backend:*",
    "docker-frontend:*",
    "docker_backend:*",
    "docker_frontend:*",
    "*/docker-backend:*",
    "*/docker-frontend:*",
];

/// Liveness path served by the backend.
pub const BACKEND_HEALTH_PATH: &str = "/health";

/// Feature flags defaulted on every start.
pub const FEATURE_FLAG_DEFAULTS: &[(&str, &str)] = &[
    ("LOCAL_DEVELOPMENT", "true"),
    ("AUTH_ENABLED", "false"),
];

const DEFAULT_PORTS: &[(&str, &str)] = &[
    ("POSTGRES_PORT", "5432"),
    ("REDIS_PORT", "6379"),
    ("QDRANT_PORT", "6333"),
    ("EMBEDDINGS_PORT", "9878"),
    ("TEMPORAL_PORT", "7233"),
    ("TEMPORAL_UI_PORT", "8088"),
    ("BACKEND_PORT", "8001"),
    ("FRONTEND_PORT", "8080"),
];

const ALTERNATE_PORTS: &[(&str, &str)] = &[
    ("POSTGRES_PORT_ALT", "5433"),
    ("REDIS_PORT_ALT", "6380"),
    ("QDRANT_PORT_ALT", "6335"),
    ("EMBEDDINGS_PORT_ALT", "9879"),
    ("TEMPORAL_PORT_ALT", "7234"),
    ("TEMPORAL_UI_PORT_ALT", "8089"),
    ("BACKEND_PORT_ALT", "8002"),
    ("FRONTEND_PORT_ALT", "8081"),
];

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::Alternate => "alt-ports",
        }
    }

    /// Port keys and their defaults for this convention.
    pub fn port_defaults(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Mode::Default => DEFAULT_PORTS,
            Mode::Alternate => ALTERNATE_PORTS,
        }
    }

    pub fn backend_port_key(self) -> &'static str {
        match self {
            Mode::Default => "BACKEND_PORT",
            Mode::Alternate => "BACKEND_PORT_ALT",
        }
    }

    pub fn frontend_port_key(self) -> &'static str {
        match self {
            Mode::Default => "FRONTEND_PORT",
            Mode::Alternate => "FRONTEND_PORT_ALT",
        }
    }

    /// Default value of a port key of this convention.
    pub fn default_port(self, key: &str) -> Option<&'static str> {
        self.port_defaults()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }
}

/// A compose profile the stack can be deployed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDescriptor {
    pub name: &'static str,
    pub compose_file: &'static str,
    pub ordinal: u8,
    pub container_pattern: &'static str,
    pub volume_patterns: &'static [&'static str],
    /// None for profiles no start command selects (test).
    pub mode: Option<Mode>,
    pub variant: Variant,
}

impl ProfileDescriptor {
    pub fn container_filter(&self) -> NameFilter {
        NameFilter::from_patterns([self.container_pattern])
    }

    pub fn volume_filter(&self) -> NameFilter {
        NameFilter::from_patterns(self.volume_patterns.iter().copied())
    }

    /// Name-convention family, used to attribute discovered containers.
    pub fn convention(&self) -> &'static str {
        match self.mode {
            Some(mode) => mode.label(),
            None => "test",
        }
    }
}

const DEFAULT_VOLUMES: &[&str] = &[
    "airweave_postgres_data",
    "airweave_redis_data",
    "airweave_qdrant_data",
];

const ALTERNATE_VOLUMES: &[&str] = &[
    "airweave_postgres_data_alt",
    "airweave_redis_data_alt",
    "airweave_qdrant_data_alt",
];

/// Every profile, in resolution order.
pub static PROFILES: [ProfileDescriptor; 5] = [
    ProfileDescriptor {
        name: "default-prod",
        compose_file: "docker/docker-compose.yml",
        ordinal: 0,
        container_pattern: "airweave-*",
        volume_patterns: DEFAULT_VOLUMES,
        mode: Some(Mode::Default),
        variant: Variant::Prod,
    },
    ProfileDescriptor {
        name: "default-dev",
        compose_file: "docker/docker-compose.dev.yml",
        ordinal: 1,
        container_pattern: "airweave-*",
        volume_patterns: DEFAULT_VOLUMES,
        mode: Some(Mode::Default),
        variant: Variant::Dev,
    },
    ProfileDescriptor {
        name: "test",
        compose_file: "docker/docker-compose.test.yml",
        ordinal: 2,
        container_pattern: "airweave-*-test",
        volume_patterns: &["airweave_postgres_data_test"],
        mode: None,
        variant: Variant::Dev,
    },
    ProfileDescriptor {
        name: "alt-ports-prod",
        compose_file: "docker/docker-compose.alt.yml",
        ordinal: 3,
        container_pattern: "airweave-*-alt",
        volume_patterns: ALTERNATE_VOLUMES,
        mode: Some(Mode::Alternate),
        variant: Variant::Prod,
    },
    ProfileDescriptor {
        name: "alt-ports-dev",
        compose_file: "docker/docker-compose.dev.alt.yml",
        ordinal: 4,
        container_pattern: "airweave-*-alt",
        volume_patterns: ALTERNATE_VOLUMES,
        mode: Some(Mode::Alternate),
        variant: Variant::Dev,
    },
];

/// Maps modes to profiles. Pure lookup over [`PROFILES`].
pub struct ProfileResolver;

impl ProfileResolver {
    /// Profiles belonging to `mode`, in resolution order.
    pub fn resolve(mode: Mode) -> Vec<&'static ProfileDescriptor> {
        Self::resolution_order()
            .into_iter()
            .filter(|p| p.mode == Some(mode))
            .collect()
    }

    /// Profiles brought up by `start` for the given mode and variant.
    pub fn bring_up(mode: Mode, variant: Variant) -> Vec<&'static ProfileDescriptor> {
        Self::resolve(mode)
            .into_iter()
            .filter(|p| p.variant == variant)
            .collect()
    }

    /// Every profile, lowest ordinal first.
    pub fn resolution_order() -> Vec<&'static ProfileDescriptor> {
        let mut all: Vec<&'static ProfileDescriptor> = PROFILES.iter().collect();
        all.sort_by_key(|p| p.ordinal);
        all
    }

    /// Every profile, highest ordinal first: alt-ports, then test, then
    /// default.
    pub fn teardown_order() -> Vec<&'static ProfileDescriptor> {
        let mut all = Self::resolution_order();
        all.reverse();
        all
    }

    pub fn by_name(name: &str) -> Option<&'static ProfileDescriptor> {
        PROFILES.iter().find(|p| p.name == name)
    }

    /// First profile, in teardown order, whose container pattern matches.
    /// Prod and dev variants share a pattern, so this settles the naming
    /// convention but not the exact origin.
    fn first_container_match(name: &str) -> Option<&'static ProfileDescriptor> {
        Self::teardown_order()
            .into_iter()
            .find(|p| NamePattern::new(p.container_pattern).matches(name))
    }

    fn first_volume_match(name: &str) -> Option<&'static ProfileDescriptor> {
        Self::teardown_order()
            .into_iter()
            .find(|p| p.volume_filter().matches(name))
    }

    /// The profile that produced container `name`. None when the name is
    /// not the stack's, or when several profiles use the matching pattern.
    pub fn attribute_container(name: &str) -> Option<&'static ProfileDescriptor> {
        let first = Self::first_container_match(name)?;
        let sharing = PROFILES
            .iter()
            .filter(|p| p.container_pattern == first.container_pattern)
            .count();
        (sharing == 1).then_some(first)
    }

    /// Naming convention (`default`, `alt-ports`, `test`) of container `name`.
    pub fn container_convention(name: &str) -> Option<&'static str> {
        Self::first_container_match(name).map(|p| p.convention())
    }

    /// The profile that produced volume `name`, under the same rule as
    /// [`ProfileResolver::attribute_container`].
    pub fn attribute_volume(name: &str) -> Option<&'static ProfileDescriptor> {
        let first = Self::first_volume_match(name)?;
        let sharing = PROFILES
            .iter()
            .filter(|p| p.volume_patterns == first.volume_patterns)
            .count();
        (sharing == 1).then_some(first)
    }

    pub fn volume_convention(name: &str) -> Option<&'static str> {
        Self::first_volume_match(name).map(|p| p.convention())
    }

    /// Filter for every container the stack may own.
    pub fn all_containers() -> NameFilter {
        let mut filter = NameFilter::from_patterns([GENERIC_CONTAINER_PATTERN]);
        for profile in Self::teardown_order() {
            filter.push(NamePattern::new(profile.container_pattern));
        }
        filter
    }

    /// Statically known volume names (all profiles plus legacy names)
    /// unioned with the discovery pattern.
    pub fn all_volumes() -> NameFilter {
        let mut filter = NameFilter::default();
        for profile in Self::teardown_order() {
            for pattern in profile.volume_patterns {
                filter.push(NamePattern::new(pattern));
            }
        }
        for legacy in LEGACY_VOLUMES {
            filter.push(NamePattern::new(legacy));
        }
        filter.push(NamePattern::new(STACK_VOLUME_PATTERN));
        filter
    }

    /// Exact volume names the stack is known to create, used when the
    /// runtime cannot be asked for its volume list.
    pub fn known_volumes() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for profile in Self::teardown_order() {
            for name in profile.volume_patterns {
                if NamePattern::new(name).is_exact() && !names.contains(name) {
                    names.push(*name);
                }
            }
        }
        names.extend_from_slice(LEGACY_VOLUMES);
        names
    }

    pub fn all_networks() -> NameFilter {
        NameFilter::from_patterns([STACK_NETWORK_PATTERN])
    }

    /// Image references owned by the stack, including generic
    /// `backend`/`frontend` aliases compose assigns to locally built images.
    pub fn all_images() -> NameFilter {
        let mut filter = NameFilter::from_patterns([format!("*{STACK_ID}*").as_str()]);
        for alias in GENERIC_IMAGE_ALIASES {
            filter.push(NamePattern::new(alias));
        }
        filter
    }
}
