use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use huv_core::VenvLayout;
use huv_resolver::PackageInventory;

/// Handle on the `uv` executable. All real package work is delegated to it
/// as a subprocess; this type only shapes command lines and parses output.
#[derive(Debug, Clone)]
pub struct UvTool {
    executable: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PipListEntry {
    name: String,
    version: String,
}

impl UvTool {
    pub fn locate() -> Result<Self> {
        let executable = which::which("uv").map_err(|_| {
            anyhow!("'uv' not found in PATH; install it first: https://docs.astral.sh/uv/")
        })?;
        Ok(Self { executable })
    }

    /// Bypasses PATH lookup; used by tests and callers with a known binary.
    pub fn from_path(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs `uv` with inherited stdio and reports its exit code. A code of 1
    /// stands in for signal-terminated children, which carry no code.
    pub fn run(&self, args: &[String]) -> Result<i32> {
        let status = Command::new(&self.executable)
            .args(args)
            .status()
            .with_context(|| format!("failed to execute {}", self.executable.display()))?;
        Ok(status.code().unwrap_or(1))
    }

    /// Current package inventory of `env`, lowercased name to version.
    ///
    /// Tries `uv pip list --format=json` against the environment, then the
    /// environment's own `python -m pip`. Every failure path yields an empty
    /// inventory; this lookup is a best-effort signal, never fatal.
    pub fn installed_packages(&self, env: &Path) -> PackageInventory {
        let layout = VenvLayout::new(env);
        if !layout.python_path().exists() {
            return PackageInventory::new();
        }

        let mut uv_list = Command::new(&self.executable);
        uv_list
            .args(["pip", "list", "--format=json"])
            .env("VIRTUAL_ENV", env);

        let mut pip_list = Command::new(layout.python_path());
        pip_list.args(["-m", "pip", "list", "--format=json"]);

        for command in [&mut uv_list, &mut pip_list] {
            let Ok(output) = command.output() else {
                continue;
            };
            if !output.status.success() {
                continue;
            }
            if let Some(inventory) = parse_pip_list(&String::from_utf8_lossy(&output.stdout)) {
                return inventory;
            }
        }

        PackageInventory::new()
    }

    /// Full transitive set a clean install of `specs` would require, via
    /// `uv pip install --dry-run`. `PYTHONPATH` is cleared for the child so
    /// packages visible from ancestors cannot bias the resolution. Returns
    /// an empty map when resolution fails; the planner degrades from there.
    pub fn dependency_closure(&self, specs: &[String], extra_args: &[String]) -> PackageInventory {
        let mut command = Command::new(&self.executable);
        command
            .args(["pip", "install", "--dry-run"])
            .args(specs)
            .args(extra_args)
            .env_remove("PYTHONPATH");

        let Ok(output) = command.output() else {
            return PackageInventory::new();
        };
        if !output.status.success() {
            return PackageInventory::new();
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        parse_dry_run_output(&text)
    }
}

fn parse_pip_list(raw: &str) -> Option<PackageInventory> {
    let entries: Vec<PipListEntry> = serde_json::from_str(raw).ok()?;
    Some(
        entries
            .into_iter()
            .map(|entry| (entry.name.to_ascii_lowercase(), entry.version))
            .collect(),
    )
}

/// Extracts `name==version` pairs from the ` + package==version` lines the
/// dry run prints for every package it would install.
pub(crate) fn parse_dry_run_output(text: &str) -> PackageInventory {
    let mut closure = PackageInventory::new();
    for line in text.lines().map(str::trim) {
        let Some(rest) = line.strip_prefix('+') else {
            continue;
        };
        let Some((name, version)) = rest.trim().split_once("==") else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        closure.insert(name.to_ascii_lowercase(), version.trim().to_string());
    }
    closure
}
