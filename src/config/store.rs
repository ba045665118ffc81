use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{LifecycleError, Result};

/// One physical line of an environment file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry {
        key: String,
        value: String,
        raw: String,
    },
    /// Comments, blank lines and anything that is not `KEY=VALUE`.
    Verbatim(String),
}

/// Ordered `KEY=value` mapping backed by the lines of an environment file.
///
/// Comments and unparseable lines are carried through untouched so a
/// rewrite only changes the lines that were actually mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    lines: Vec<Line>,
}

impl Configuration {
    /// Parse `.env` content.
    ///
    /// Supports `KEY=VALUE`, `KEY="VALUE"`, `KEY='VALUE'`, an optional
    /// `export ` prefix, `# comments` and blank lines.
    pub fn parse(content: &str) -> Self {
        let lines = content.lines().map(parse_line).collect();
        Self { lines }
    }

    /// Value for `key`. When a hand-edited file repeats a key the last
    /// occurrence wins, the same as sourcing it from a shell.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k.as_str() == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Distinct keys in first-appearance order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for line in &self.lines {
            if let Line::Entry { key, .. } = line {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set `key` to `value`, written unquoted.
    pub fn upsert(&mut self, key: &str, value: &str) {
        self.set(key, value, format!("{key}={value}"));
    }

    /// Set `key` to `value` wrapped in double quotes. Used for operator
    /// supplied secrets which are written verbatim.
    pub fn upsert_quoted(&mut self, key: &str, value: &str) {
        self.set(key, value, format!("{key}=\"{value}\""));
    }

    /// Set `key` only when it is absent. Returns true if the value was added.
    pub fn ensure_default(&mut self, key: &str, value: &str) -> bool {
        if self.contains_key(key) {
            return false;
        }
        self.upsert(key, value);
        true
    }

    /// Overwrite `key` with a freshly generated value, whatever it held
    /// before. Returns the new value.
    pub fn rotate_secret<F>(&mut self, key: &str, generate: F) -> String
    where
        F: FnOnce() -> String,
    {
        let value = generate();
        self.upsert(key, &value);
        value
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { raw, .. } => out.push_str(raw),
                Line::Verbatim(text) => out.push_str(text),
            }
            out.push('\n');
        }
        out
    }

    /// Replace the first line holding `key` in place and drop any later
    /// duplicates; append when the key is new.
    fn set(&mut self, key: &str, value: &str, raw: String) {
        let mut replaced = false;
        self.lines.retain_mut(|line| match line {
            Line::Entry { key: k, .. } if k.as_str() == key => {
                if replaced {
                    return false;
                }
                *line = Line::Entry {
                    key: key.to_string(),
                    value: value.to_string(),
                    raw: raw.clone(),
                };
                replaced = true;
                true
            }
            _ => true,
        });

        if !replaced {
            self.lines.push(Line::Entry {
                key: key.to_string(),
                value: value.to_string(),
                raw,
            });
        }
    }
}

fn parse_line(line: &str) -> Line {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Verbatim(line.to_string());
    }

    let body = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let Some((key, value)) = body.split_once('=') else {
        return Line::Verbatim(line.to_string());
    };

    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Line::Verbatim(line.to_string());
    }

    let value = value.trim();
    let value = if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        value
    };

    Line::Entry {
        key: key.to_string(),
        value: value.to_string(),
        raw: line.to_string(),
    }
}

/// The persisted environment configuration file.
///
/// All edits happen on the in-memory [`Configuration`]; [`ConfigStore::save`]
/// replaces the file in one rename so readers never observe a truncated file.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Configuration,
}

impl ConfigStore {
    /// Load the file at `path`, or start empty if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let config = match std::fs::read_to_string(path) {
            Ok(content) => Configuration::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Configuration::default(),
            Err(e) => return Err(LifecycleError::config_io(path, e)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    /// Load `path`; when it is absent, seed the contents from `template`
    /// (typically `.env.example`) if that exists.
    pub fn load_or_seed(path: &Path, template: &Path) -> Result<Self> {
        if path.exists() || !template.is_file() {
            return Self::load(path);
        }

        debug!(template = %template.display(), "seeding environment file from template");
        let content = std::fs::read_to_string(template)
            .map_err(|e| LifecycleError::config_io(template, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            config: Configuration::parse(&content),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key)
    }

    pub fn upsert(&mut self, key: &str, value: &str) {
        self.config.upsert(key, value);
    }

    pub fn upsert_quoted(&mut self, key: &str, value: &str) {
        self.config.upsert_quoted(key, value);
    }

    pub fn ensure_default(&mut self, key: &str, value: &str) -> bool {
        self.config.ensure_default(key, value)
    }

    pub fn rotate_secret<F>(&mut self, key: &str, generate: F) -> String
    where
        F: FnOnce() -> String,
    {
        self.config.rotate_secret(key, generate)
    }

    /// Atomic write: write a sibling tmp file, then rename over the target.
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| LifecycleError::config_io(&dir, e))?;

        let file_name = self
            .path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| ".env".to_string());
        let tmp_path = dir.join(format!(".{file_name}.tmp"));

        std::fs::write(&tmp_path, self.config.render())
            .map_err(|e| LifecycleError::config_io(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| LifecycleError::config_io(&self.path, e))?;

        debug!(path = %self.path.display(), keys = self.config.len(), "environment file saved");
        Ok(())
    }
}
