use std::path::{Path, PathBuf};

/// Default environment file name, relative to the project root.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Template the environment file is seeded from on first start.
pub const ENV_TEMPLATE: &str = ".env.example";

/// Local persisted-storage directories wiped by cleanup.
pub const LOCAL_STORAGE_DIRS: &[&str] = &["local_storage", "backend/local_storage"];

/// Filesystem layout of a stack checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackLayout {
    pub root: PathBuf,
    pub env_file: PathBuf,
    pub env_template: PathBuf,
    pub storage_dirs: Vec<PathBuf>,
}

impl StackLayout {
    /// Layout rooted at `root`. A relative `env_file` is resolved against
    /// the root; an absolute one is used as is.
    pub fn new(root: impl Into<PathBuf>, env_file: &Path) -> Self {
        let root = root.into();
        let env_file = if env_file.is_absolute() {
            env_file.to_path_buf()
        } else {
            root.join(env_file)
        };
        Self {
            env_template: root.join(ENV_TEMPLATE),
            storage_dirs: LOCAL_STORAGE_DIRS.iter().map(|d| root.join(d)).collect(),
            env_file,
            root,
        }
    }

    /// Absolute path of a compose file given relative to the root.
    pub fn compose_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_env_file_is_under_root() {
        let layout = StackLayout::new("/srv/stack", Path::new(DEFAULT_ENV_FILE));
        assert_eq!(layout.env_file, PathBuf::from("/srv/stack/.env"));
        assert_eq!(layout.env_template, PathBuf::from("/srv/stack/.env.example"));
        assert_eq!(
            layout.storage_dirs,
            vec![
                PathBuf::from("/srv/stack/local_storage"),
                PathBuf::from("/srv/stack/backend/local_storage"),
            ]
        );
    }

    #[test]
    fn absolute_env_file_is_kept() {
        let layout = StackLayout::new("/srv/stack", Path::new("/etc/stack.env"));
        assert_eq!(layout.env_file, PathBuf::from("/etc/stack.env"));
    }
}
