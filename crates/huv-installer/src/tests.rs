use std::fs;
use std::path::Path;

use huv_core::{PyvenvCfg, VenvLayout};

use crate::chain::extract_parent_marker;
use crate::patch::replace_site_packages_section;
use crate::uv::parse_dry_run_output;
use crate::{ancestors, find_parent, patch_activation_scripts, script_path, wire_hierarchy};

const STOCK_ACTIVATE: &str = r#"deactivate () {
    if ! [ -z "${_OLD_VIRTUAL_PATH+_}" ] ; then
        PATH="$_OLD_VIRTUAL_PATH"
        export PATH
        unset _OLD_VIRTUAL_PATH
    fi
    if ! [ -z "${_OLD_VIRTUAL_PYTHONHOME+_}" ] ; then
        PYTHONHOME="$_OLD_VIRTUAL_PYTHONHOME"
        export PYTHONHOME
        unset _OLD_VIRTUAL_PYTHONHOME
    fi

    hash -r 2>/dev/null || true

    if [ ! "${1-}" = "nondestructive" ] ; then
        unset -f deactivate
    fi
}

VIRTUAL_ENV="/envs/child"
export VIRTUAL_ENV

hash -r 2>/dev/null || true
"#;

const STOCK_ACTIVATE_THIS: &str = r#"import os
import site
import sys

bin_dir = os.path.dirname(abs_file)
base = bin_dir[: -len("bin") - 1]

# add the virtual environments libraries to the host python import mechanism
prev_length = len(sys.path)
for lib in "../lib/python3.12/site-packages".split(os.pathsep):
    path = os.path.realpath(os.path.join(bin_dir, lib))
    site.addsitedir(path)
sys.path[:] = sys.path[prev_length:] + sys.path[0:prev_length]

sys.real_prefix = sys.prefix
sys.prefix = base
"#;

fn fake_venv(root: &Path) -> VenvLayout {
    let layout = VenvLayout::new(root);
    fs::create_dir_all(layout.bin_dir()).expect("must create bin dir");
    fs::write(layout.pyvenv_cfg_path(), "home = /usr/bin\nversion_info = 3.12.4\n")
        .expect("must write pyvenv.cfg");
    fs::write(layout.activate_path(), STOCK_ACTIVATE).expect("must write activate");
    fs::write(layout.activate_this_path(), STOCK_ACTIVATE_THIS)
        .expect("must write activate_this.py");
    layout
}

#[test]
fn dry_run_output_yields_lowercased_closure() {
    let text = "Resolved 3 packages in 120ms\nWould install 3 packages\n + Requests==2.32.3\n + charset-normalizer==3.3.2\n + idna==3.7\n";
    let closure = parse_dry_run_output(text);
    assert_eq!(closure.len(), 3);
    assert_eq!(closure.get("requests").map(String::as_str), Some("2.32.3"));
    assert_eq!(closure.get("idna").map(String::as_str), Some("3.7"));
}

#[test]
fn dry_run_output_ignores_unrelated_lines() {
    let text = "Audited 1 package in 4ms\n - removed==1.0\nplus noise\n + ==1.0\n";
    assert!(parse_dry_run_output(text).is_empty());
}

#[test]
fn parent_marker_extraction_matches_quoted_value() {
    let script = "VIRTUAL_ENV=\"/envs/child\"\nPARENT_VENV_PATH=\"/envs/base\"\n";
    assert_eq!(
        extract_parent_marker(script).as_deref(),
        Some("/envs/base")
    );
    assert!(extract_parent_marker("PARENT_VENV_PATH=\"\"\n").is_none());
    assert!(extract_parent_marker("no marker here\n").is_none());
}

#[test]
fn script_path_uses_forward_slashes() {
    assert_eq!(script_path(Path::new("/envs/base")), "/envs/base");
    if cfg!(windows) {
        assert_eq!(script_path(Path::new(r"C:\envs\base")), "C:/envs/base");
    }
}

#[test]
fn wire_hierarchy_round_trips_through_find_parent() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let parent_root = dir.path().join("parent");
    let child_root = dir.path().join("child");
    fake_venv(&parent_root);
    let child = fake_venv(&child_root);

    let warnings = wire_hierarchy(&child, &parent_root).expect("must wire hierarchy");
    assert!(warnings.is_empty());

    let recovered = find_parent(&child_root).expect("must recover parent");
    assert_eq!(recovered, parent_root);
}

#[test]
fn find_parent_falls_back_to_activate_marker() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let parent_root = dir.path().join("parent");
    let child_root = dir.path().join("child");
    fake_venv(&parent_root);
    let child = fake_venv(&child_root);

    // No huv_parent in pyvenv.cfg, only the legacy activate marker.
    patch_activation_scripts(&child, &parent_root).expect("must patch scripts");

    let recovered = find_parent(&child_root).expect("must recover parent");
    assert_eq!(recovered, parent_root);
}

#[test]
fn find_parent_ignores_dangling_links() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let child = fake_venv(&dir.path().join("child"));

    let mut cfg = PyvenvCfg::read(&child.pyvenv_cfg_path()).expect("must read cfg");
    cfg.set(huv_core::PARENT_KEY, "/envs/deleted-long-ago");
    cfg.write(&child.pyvenv_cfg_path()).expect("must write cfg");

    assert!(find_parent(child.root()).is_none());
}

#[test]
fn ancestors_walk_grandparent_chain() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let a_root = dir.path().join("a");
    let b_root = dir.path().join("b");
    let c_root = dir.path().join("c");
    fake_venv(&a_root);
    let b = fake_venv(&b_root);
    let c = fake_venv(&c_root);

    wire_hierarchy(&b, &a_root).expect("must wire b");
    wire_hierarchy(&c, &b_root).expect("must wire c");

    assert_eq!(ancestors(&c_root), vec![b_root, a_root]);
}

#[test]
fn ancestors_stop_on_hand_edited_cycle() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let a_root = dir.path().join("a");
    let b_root = dir.path().join("b");
    let a = fake_venv(&a_root);
    let b = fake_venv(&b_root);

    wire_hierarchy(&a, &b_root).expect("must wire a");
    wire_hierarchy(&b, &a_root).expect("must wire b");

    assert_eq!(ancestors(&a_root), vec![b_root]);
}

#[test]
fn activate_patch_embeds_marker_and_appends_parent_paths() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let parent_root = dir.path().join("parent");
    fake_venv(&parent_root);
    let child = fake_venv(&dir.path().join("child"));

    patch_activation_scripts(&child, &parent_root).expect("must patch scripts");

    let patched = fs::read_to_string(child.activate_path()).expect("must read activate");
    let marker = format!("PARENT_VENV_PATH=\"{}\"", script_path(&parent_root));
    assert_eq!(patched.matches(&marker).count(), 1);
    assert!(patched.contains("PYTHONPATH=\"$PYTHONPATH:$parent_site\""));
    // The hierarchy block lands before the final hash refresh, after the
    // deactivate function body.
    let block_at = patched.find("Hierarchical environment support").expect("block present");
    let last_hash = patched.rfind("hash -r 2>/dev/null || true").expect("hash line present");
    assert!(block_at < last_hash);
    assert!(block_at > patched.find("unset -f deactivate").expect("deactivate body present"));
}

#[test]
fn activate_patch_extends_deactivate_restore_logic() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let parent_root = dir.path().join("parent");
    fake_venv(&parent_root);
    let child = fake_venv(&dir.path().join("child"));

    patch_activation_scripts(&child, &parent_root).expect("must patch scripts");

    let patched = fs::read_to_string(child.activate_path()).expect("must read activate");
    assert!(patched.contains("PYTHONPATH=\"$_OLD_VIRTUAL_PYTHONPATH\""));
    assert!(patched.contains("unset _OLD_VIRTUAL_PYTHONPATH"));
    // The original PYTHONHOME restore stays in place.
    assert!(patched.contains("PYTHONHOME=\"$_OLD_VIRTUAL_PYTHONHOME\""));
}

#[test]
fn activate_this_patch_adds_child_then_parent_site_dirs() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let parent_root = dir.path().join("parent");
    fake_venv(&parent_root);
    let child = fake_venv(&dir.path().join("child"));

    patch_activation_scripts(&child, &parent_root).expect("must patch scripts");

    let patched =
        fs::read_to_string(child.activate_this_path()).expect("must read activate_this.py");
    assert!(patched.contains(&format!(
        "parent_venv_path = \"{}\"",
        script_path(&parent_root)
    )));
    assert!(patched.contains("site.addsitedir"));
    assert!(patched.contains("glob.glob"));
    // The stock sys.path assignment is gone; the preamble survives.
    assert!(!patched.contains("sys.path[:] = sys.path[prev_length:]"));
    assert!(patched.contains("sys.real_prefix = sys.prefix"));
}

#[test]
fn missing_scripts_are_skipped_with_warnings() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let parent_root = dir.path().join("parent");
    fake_venv(&parent_root);

    let child = VenvLayout::new(dir.path().join("child"));
    fs::create_dir_all(child.bin_dir()).expect("must create bin dir");
    fs::write(child.pyvenv_cfg_path(), "version_info = 3.12.4\n").expect("must write cfg");

    let warnings =
        patch_activation_scripts(&child, &parent_root).expect("must succeed without scripts");
    assert!(warnings.iter().any(|w| w.contains("activate script")));
    assert!(warnings.iter().any(|w| w.contains("activate_this.py")));
}

#[test]
fn unrecognized_activate_this_layout_is_left_untouched() {
    let content = "print('not a venv helper')\n";
    assert!(replace_site_packages_section(content, "BLOCK").is_none());
}
