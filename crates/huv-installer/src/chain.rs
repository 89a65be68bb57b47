use std::fs;
use std::path::{Path, PathBuf};

use huv_core::{PyvenvCfg, VenvLayout};
use huv_resolver::ancestor_chain;

const PARENT_MARKER_PREFIX: &str = "PARENT_VENV_PATH=\"";

/// Recovers the parent link of `env` from disk.
///
/// The structured `huv_parent` entry in pyvenv.cfg is authoritative; the
/// quoted marker in the activation script is kept as a fallback for
/// environments wired before the config entry existed. A recorded path that
/// no longer exists is treated as no parent at all; stale links are
/// non-fatal and simply drop the ancestor out of resolution.
pub fn find_parent(env: &Path) -> Option<PathBuf> {
    let layout = VenvLayout::new(env);
    parent_from_cfg(&layout).or_else(|| parent_from_activate(&layout))
}

/// Ordered ancestor chain of `env`, nearest parent first.
pub fn ancestors(env: &Path) -> Vec<PathBuf> {
    ancestor_chain(env, |current| find_parent(current))
}

fn parent_from_cfg(layout: &VenvLayout) -> Option<PathBuf> {
    let cfg = PyvenvCfg::read(&layout.pyvenv_cfg_path()).ok()?;
    existing_dir(cfg.parent()?)
}

fn parent_from_activate(layout: &VenvLayout) -> Option<PathBuf> {
    let script = fs::read_to_string(layout.activate_path()).ok()?;
    existing_dir(&extract_parent_marker(&script)?)
}

/// Exact-match text search for the `PARENT_VENV_PATH="…"` line; the marker
/// is recovered without interpreting the surrounding shell.
pub(crate) fn extract_parent_marker(script: &str) -> Option<String> {
    let start = script.find(PARENT_MARKER_PREFIX)? + PARENT_MARKER_PREFIX.len();
    let rest = &script[start..];
    let end = rest.find('"')?;
    let value = &rest[..end];
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

fn existing_dir(recorded: &str) -> Option<PathBuf> {
    let path = PathBuf::from(recorded);
    if path.is_dir() {
        Some(path)
    } else {
        None
    }
}
