use std::path::{Path, PathBuf};

/// Relative path that marks the root of the stack checkout.
pub const PROJECT_MARKER: &str = "docker/docker-compose.yml";

/// Walk up the directory tree from `start`, checking for `marker` at each
/// level. Returns the directory that contains it, or None if the root is
/// reached without finding it.
pub fn find_project_root(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(marker).is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolve the project root. If `cli_dir` is provided, verify it exists and
/// return it. Otherwise, search from the current working directory upward
/// for a directory holding `docker/docker-compose.yml`.
pub fn resolve_project_root(cli_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = cli_dir {
        if dir.is_dir() {
            return Ok(dir.canonicalize()?);
        }
        anyhow::bail!("Project directory not found: {}", dir.display());
    }

    let cwd = std::env::current_dir()?;
    find_project_root(&cwd, PROJECT_MARKER).ok_or_else(|| {
        anyhow::anyhow!(
            "No {} found in {} or any parent directory (use --project-dir)",
            PROJECT_MARKER,
            cwd.display()
        )
    })
}
