use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Key recording the parent link of a hierarchical environment.
pub const PARENT_KEY: &str = "huv_parent";

/// Key recording the full interpreter version, written by the environment
/// creator as `version_info = X.Y.Z`.
pub const VERSION_KEY: &str = "version_info";

/// Line-oriented view of a `pyvenv.cfg` file.
///
/// The file looks like toml but is not (values are unquoted paths), so it is
/// parsed as ordered `key = value` lines. Unknown keys survive a rewrite
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyvenvCfg {
    entries: Vec<(String, String)>,
}

impl PyvenvCfg {
    pub fn parse(raw: &str) -> Self {
        let mut entries = Vec::new();
        for line in raw.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            entries.push((key.to_string(), value.trim().to_string()));
        }
        Self { entries }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read pyvenv.cfg: {}", path.display()))?;
        Ok(Self::parse(&raw))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces an existing key in place or appends a new line.
    pub fn set(&mut self, key: &str, value: &str) {
        for (entry_key, entry_value) in &mut self.entries {
            if entry_key == key {
                *entry_value = value.to_string();
                return;
            }
        }
        self.entries.push((key.to_string(), value.to_string()));
    }

    pub fn version_info(&self) -> Option<&str> {
        self.get(VERSION_KEY)
    }

    pub fn parent(&self) -> Option<&str> {
        self.get(PARENT_KEY).filter(|value| !value.is_empty())
    }

    /// `X.Y` prefix of `version_info`, the form `uv venv --python` accepts.
    pub fn python_minor_version(&self) -> Option<String> {
        let version = self.version_info()?;
        let mut parts = version.split('.');
        let major = parts.next()?;
        let minor = parts.next()?;
        if major.is_empty() || minor.is_empty() {
            return None;
        }
        Some(format!("{major}.{minor}"))
    }

    pub fn render(&self) -> String {
        let mut rendered = String::new();
        for (key, value) in &self.entries {
            rendered.push_str(&format!("{key} = {value}\n"));
        }
        rendered
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .with_context(|| format!("failed to write pyvenv.cfg: {}", path.display()))
    }
}
