use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use huv_core::{PyvenvCfg, VenvLayout, PARENT_KEY};

const PARENT_PLACEHOLDER: &str = "__HUV_PARENT__";

const POSIX_HASH_LINE: &str = "hash -r 2>/dev/null || true";

/// Stock deactivate() restore block for PYTHONHOME, as the venv activate
/// template writes it. The patch extends it rather than replacing it.
const POSIX_DEACTIVATE_HOME_BLOCK: &str = r#"    if ! [ -z "${_OLD_VIRTUAL_PYTHONHOME+_}" ] ; then
        PYTHONHOME="$_OLD_VIRTUAL_PYTHONHOME"
        export PYTHONHOME
        unset _OLD_VIRTUAL_PYTHONHOME
    fi"#;

/// The home block plus symmetric PYTHONPATH restoration: put back the saved
/// value, or unset the variable when activation introduced it.
const POSIX_DEACTIVATE_RESTORE_BLOCK: &str = r#"    if ! [ -z "${_OLD_VIRTUAL_PYTHONHOME+_}" ] ; then
        PYTHONHOME="$_OLD_VIRTUAL_PYTHONHOME"
        export PYTHONHOME
        unset _OLD_VIRTUAL_PYTHONHOME
    fi
    if ! [ -z "${_OLD_VIRTUAL_PYTHONPATH+_}" ] ; then
        PYTHONPATH="$_OLD_VIRTUAL_PYTHONPATH"
        export PYTHONPATH
        unset _OLD_VIRTUAL_PYTHONPATH
    elif [ ! -z "${PYTHONPATH+_}" ] ; then
        unset PYTHONPATH
    fi"#;

const POSIX_HIERARCHY_BLOCK: &str = r#"
# Hierarchical environment support - include parent libraries
PARENT_VENV_PATH="__HUV_PARENT__"
if [ -d "$PARENT_VENV_PATH" ]; then
    if ! [ -z "${PYTHONPATH+_}" ] ; then
        _OLD_VIRTUAL_PYTHONPATH="$PYTHONPATH"
    fi

    # Parent site-packages are appended, so the child keeps precedence
    for parent_site in "$PARENT_VENV_PATH"/lib/python*/site-packages; do
        if [ -d "$parent_site" ]; then
            if [ -z "${PYTHONPATH+_}" ]; then
                PYTHONPATH="$parent_site"
            else
                PYTHONPATH="$PYTHONPATH:$parent_site"
            fi
        fi
    done
    if [ ! -z "${PYTHONPATH+_}" ]; then
        export PYTHONPATH
    fi
fi

"#;

const ACTIVATE_THIS_SECTION_START: &str = "# add the virtual environments libraries";
const ACTIVATE_THIS_SECTION_END: &str = "sys.path[:";

const ACTIVATE_THIS_HIERARCHY_BLOCK: &str = r#"# add the virtual environments libraries to the host python import mechanism
import glob
prev_length = len(sys.path)

# Child environment libraries first (highest precedence)
child_lib_pattern = os.path.join(bin_dir, "..", "lib", "python*", "site-packages")
for child_site_packages in glob.glob(child_lib_pattern):
    if os.path.exists(child_site_packages):
        site.addsitedir(child_site_packages)

# Parent environment libraries at lower precedence
parent_venv_path = "__HUV_PARENT__"
if os.path.exists(parent_venv_path):
    parent_lib_pattern = os.path.join(parent_venv_path, "lib", "python*", "site-packages")
    for parent_site_packages in glob.glob(parent_lib_pattern):
        if os.path.exists(parent_site_packages):
            site.addsitedir(parent_site_packages)

# Move the new entries to the front, child before parent
new_paths = sys.path[prev_length:]
sys.path[prev_length:] = []
sys.path[:0] = new_paths
"#;

const BAT_HIERARCHY_BLOCK: &str = r#"
rem Hierarchical environment support - include parent libraries
set "PARENT_VENV_PATH=__HUV_PARENT__"
if defined PYTHONPATH (
    set "_OLD_VIRTUAL_PYTHONPATH=%PYTHONPATH%"
    set "PYTHONPATH=%PYTHONPATH%;__HUV_PARENT__/Lib/site-packages"
) else (
    set "PYTHONPATH=__HUV_PARENT__/Lib/site-packages"
)
"#;

/// Path rendering for text embedded in generated scripts: always forward
/// slashes, on every platform.
pub fn script_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// Records the parent link and patches the activation scripts. Runs exactly
/// once, at creation time, after the parent has been validated. Returns
/// warnings for script files that were absent and skipped.
pub fn wire_hierarchy(layout: &VenvLayout, parent: &Path) -> Result<Vec<String>> {
    write_parent_link(layout, parent)?;
    patch_activation_scripts(layout, parent)
}

/// Persists `huv_parent = <resolved parent>` in the child's pyvenv.cfg so
/// the chain walker can recover the link from disk alone.
pub fn write_parent_link(layout: &VenvLayout, parent: &Path) -> Result<()> {
    let path = layout.pyvenv_cfg_path();
    let mut cfg = PyvenvCfg::read(&path)?;
    cfg.set(PARENT_KEY, &script_path(parent));
    cfg.write(&path)
}

/// Splices ancestor search paths into the activation and deactivation logic
/// of every script the environment carries. A missing script is skipped with
/// a warning; the environment is still considered successfully created.
pub fn patch_activation_scripts(layout: &VenvLayout, parent: &Path) -> Result<Vec<String>> {
    let mut warnings = Vec::new();
    patch_posix_activate(layout, parent, &mut warnings)?;
    patch_activate_this(layout, parent, &mut warnings)?;
    patch_windows_activate(layout, parent, &mut warnings)?;
    Ok(warnings)
}

fn patch_posix_activate(
    layout: &VenvLayout,
    parent: &Path,
    warnings: &mut Vec<String>,
) -> Result<()> {
    let path = layout.activate_path();
    if !path.exists() {
        warnings.push(format!(
            "activate script not found at {}, skipping hierarchy patch",
            path.display()
        ));
        return Ok(());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read activate script: {}", path.display()))?;

    let content = content.replace(POSIX_DEACTIVATE_HOME_BLOCK, POSIX_DEACTIVATE_RESTORE_BLOCK);

    // Splice before the final hash command so the block runs at the tail of
    // activation; without the landmark the block is appended instead.
    let hierarchy = POSIX_HIERARCHY_BLOCK.replace(PARENT_PLACEHOLDER, &script_path(parent));
    let content = match content.rfind(POSIX_HASH_LINE) {
        Some(index) => format!(
            "{}{hierarchy}{}",
            &content[..index],
            &content[index..]
        ),
        None => format!("{content}{hierarchy}"),
    };

    fs::write(&path, content)
        .with_context(|| format!("failed to write activate script: {}", path.display()))
}

fn patch_activate_this(
    layout: &VenvLayout,
    parent: &Path,
    warnings: &mut Vec<String>,
) -> Result<()> {
    let path = layout.activate_this_path();
    if !path.exists() {
        warnings.push(format!(
            "activate_this.py not found at {}, skipping hierarchy patch",
            path.display()
        ));
        return Ok(());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read activate_this.py: {}", path.display()))?;

    let block = ACTIVATE_THIS_HIERARCHY_BLOCK.replace(PARENT_PLACEHOLDER, &script_path(parent));
    let Some(content) = replace_site_packages_section(&content, &block) else {
        warnings.push(format!(
            "no site-packages section recognized in {}, skipping hierarchy patch",
            path.display()
        ));
        return Ok(());
    };

    fs::write(&path, content)
        .with_context(|| format!("failed to write activate_this.py: {}", path.display()))
}

fn patch_windows_activate(
    layout: &VenvLayout,
    parent: &Path,
    warnings: &mut Vec<String>,
) -> Result<()> {
    let path = layout.activate_bat_path();
    if !path.exists() {
        // Expected on POSIX hosts; only worth a warning where the batch
        // script should exist.
        if cfg!(windows) {
            warnings.push(format!(
                "activate.bat not found at {}, skipping hierarchy patch",
                path.display()
            ));
        }
        return Ok(());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read activate.bat: {}", path.display()))?;
    let block = BAT_HIERARCHY_BLOCK.replace(PARENT_PLACEHOLDER, &script_path(parent));

    fs::write(&path, format!("{content}{block}"))
        .with_context(|| format!("failed to write activate.bat: {}", path.display()))
}

/// Replaces the stock "add the virtual environments libraries" section of
/// activate_this.py, which ends with a `sys.path[:] = …` assignment, with
/// the hierarchical block. Returns `None` when the section is not found.
pub(crate) fn replace_site_packages_section(content: &str, block: &str) -> Option<String> {
    let start = content.find(ACTIVATE_THIS_SECTION_START)?;
    let assign_offset = content[start..].find(ACTIVATE_THIS_SECTION_END)?;
    let assign_start = start + assign_offset;
    let line_end = match content[assign_start..].find('\n') {
        Some(offset) => assign_start + offset + 1,
        None => content.len(),
    };

    let mut patched = String::with_capacity(content.len() + block.len());
    patched.push_str(&content[..start]);
    patched.push_str(block);
    patched.push_str(&content[line_end..]);
    Some(patched)
}
