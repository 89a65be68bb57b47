use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use huv_core::{PyvenvCfg, VenvLayout};
use huv_installer::{ancestors, wire_hierarchy, UvTool};
use huv_resolver::{
    build_install_plan, build_uninstall_plan, inherited_packages, InstallPlan, PackageInventory,
    UninstallPlan,
};

use crate::render::{current_output_style, finish_spinner, render_status_line, start_spinner};

/// `huv venv <path> [--parent <path>] [uv flags…]`.
///
/// All validation happens before uv is invoked; a failed hierarchy setup
/// after creation leaves the environment in place and exits non-zero.
pub fn run_venv_command(
    uv: &UvTool,
    path: &Path,
    parent: Option<&Path>,
    uv_args: &[String],
) -> Result<i32> {
    let style = current_output_style();
    let root = std::path::absolute(path)
        .with_context(|| format!("failed to resolve path: {}", path.display()))?;
    let layout = VenvLayout::new(&root);

    if root.exists() {
        if layout.is_valid() {
            bail!("virtual environment already exists at '{}'", root.display());
        }
        let has_entries = root
            .read_dir()
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
        if has_entries {
            bail!("directory '{}' exists and is not empty", root.display());
        }
    }

    let parent = parent.map(validate_parent).transpose()?;

    let mut forwarded = uv_args.to_vec();
    if let Some(parent_root) = &parent {
        if !has_python_flag(&forwarded) {
            if let Some(version) = parent_python_version(parent_root) {
                println!("Using parent's Python version: {version}");
                forwarded.push("--python".to_string());
                forwarded.push(version);
            }
        }
    }

    println!(
        "{}",
        render_status_line(
            style,
            "step",
            &format!("creating virtual environment: {}", root.display())
        )
    );
    if let Some(parent_root) = &parent {
        println!(
            "{}",
            render_status_line(
                style,
                "step",
                &format!("parent environment: {}", parent_root.display())
            )
        );
    }

    let mut args = vec!["venv".to_string(), root.display().to_string()];
    args.extend(forwarded);
    let code = uv.run(&args)?;
    if code != 0 {
        eprintln!("error: creating the virtual environment failed with exit code {code}");
        return Ok(code);
    }

    if !layout.activate_path().exists() && !layout.activate_bat_path().exists() {
        bail!("virtual environment creation failed - missing activate script");
    }

    if let Some(parent_root) = &parent {
        println!(
            "{}",
            render_status_line(
                style,
                "step",
                &format!("setting up hierarchy with parent: {}", parent_root.display())
            )
        );
        match wire_hierarchy(&layout, parent_root) {
            Ok(warnings) => {
                for warning in warnings {
                    eprintln!("{}", render_status_line(style, "warn", &warning));
                }
            }
            Err(err) => {
                eprintln!("error: setting up hierarchy failed: {err:#}");
                eprintln!("virtual environment created but hierarchy setup failed");
                return Ok(1);
            }
        }
    }

    println!(
        "{}",
        render_status_line(
            style,
            "ok",
            &format!("virtual environment created at: {}", root.display())
        )
    );
    if let Some(parent_root) = &parent {
        println!(
            "{}",
            render_status_line(
                style,
                "ok",
                &format!("hierarchy configured with parent: {}", parent_root.display())
            )
        );
        if !cfg!(windows) {
            println!("  Use: source {}", layout.activate_path().display());
        }
    }
    Ok(0)
}

/// `huv pip install <specs…> [flags…]` against the active environment.
pub fn run_install_command(uv: &UvTool, specs: &[String], extra: &[String]) -> Result<i32> {
    let style = current_output_style();
    let env_root = active_environment()?;
    if specs.is_empty() {
        bail!("no packages specified for installation");
    }

    let visible = visible_from_ancestors(uv, &env_root);

    println!("{}", render_status_line(style, "step", "analyzing dependencies"));
    let spinner = start_spinner(style, "resolving dependency closure");
    let closure = uv.dependency_closure(specs, extra);
    finish_spinner(spinner);

    if !closure.is_empty() {
        println!(
            "{}",
            render_status_line(
                style,
                "step",
                &format!("found {} package(s) including dependencies", closure.len())
            )
        );
    }

    let plan = build_install_plan(specs, &visible, &closure);
    for line in format_install_plan_lines(&plan) {
        println!("{line}");
    }

    if plan.to_install.is_empty() {
        println!(
            "{}",
            render_status_line(
                style,
                "ok",
                "all requested packages are already available from parent environments"
            )
        );
        return Ok(0);
    }

    println!(
        "{}",
        render_status_line(
            style,
            "step",
            &format!(
                "installing {} package(s), {} inherited from parents",
                plan.to_install.len(),
                plan.skipped.len()
            )
        )
    );

    let mut args = vec!["pip".to_string(), "install".to_string()];
    if plan.use_no_deps() {
        // Letting uv expand dependencies again would re-pull the skipped,
        // parent-satisfied packages into the child.
        println!(
            "{}",
            render_status_line(style, "step", "using --no-deps to respect parent packages")
        );
        args.push("--no-deps".to_string());
    }
    args.extend(plan.to_install.iter().cloned());
    args.extend(extra.iter().cloned());

    let code = uv.run(&args)?;
    if code != 0 {
        eprintln!("error: installation failed with exit code {code}");
        return Ok(code);
    }

    println!("{}", render_status_line(style, "ok", "installation completed"));
    Ok(0)
}

/// `huv pip uninstall <names…> [flags…]` against the active environment.
pub fn run_uninstall_command(uv: &UvTool, names: &[String], extra: &[String]) -> Result<i32> {
    let style = current_output_style();
    let env_root = active_environment()?;
    if names.is_empty() {
        bail!("no packages specified for uninstallation");
    }

    let own_inventory = uv.installed_packages(&env_root);
    let visible = visible_from_ancestors(uv, &env_root);

    let plan = build_uninstall_plan(names, &own_inventory, &visible);
    for line in format_uninstall_plan_lines(&plan) {
        println!("{line}");
    }

    if plan.to_remove.is_empty() {
        println!(
            "{}",
            render_status_line(style, "ok", "no packages to uninstall from the current environment")
        );
        return Ok(0);
    }

    println!(
        "{}",
        render_status_line(
            style,
            "step",
            &format!(
                "uninstalling {} package(s): {}",
                plan.to_remove.len(),
                plan.to_remove.join(", ")
            )
        )
    );

    let mut args = vec!["pip".to_string(), "uninstall".to_string()];
    args.extend(plan.to_remove.iter().cloned());
    args.extend(extra.iter().cloned());

    let code = uv.run(&args)?;
    if code != 0 {
        eprintln!("error: uninstallation failed with exit code {code}");
        return Ok(code);
    }

    println!("{}", render_status_line(style, "ok", "uninstallation completed"));
    Ok(0)
}

/// Forwards an unrecognized command line to uv and mirrors its exit code.
/// Modeled as spawn-and-wait rather than process replacement so streams and
/// exit status forward uniformly across platforms.
pub fn run_passthrough_command(uv: &UvTool, args: &[String]) -> Result<i32> {
    uv.run(args)
}

fn active_environment() -> Result<PathBuf> {
    let value = env::var_os("VIRTUAL_ENV")
        .ok_or_else(|| anyhow!("no active virtual environment; activate one first"))?;
    Ok(PathBuf::from(value))
}

/// Effective visible set for `env`: ancestor inventories merged near-to-far,
/// recomputed on every invocation.
fn visible_from_ancestors(uv: &UvTool, env: &Path) -> PackageInventory {
    let chain = ancestors(env);
    inherited_packages(&chain, |ancestor| uv.installed_packages(ancestor))
}

fn validate_parent(path: &Path) -> Result<PathBuf> {
    let resolved = fs::canonicalize(path)
        .map_err(|_| anyhow!("parent environment '{}' does not exist", path.display()))?;
    let parent_layout = VenvLayout::new(&resolved);
    if !parent_layout.is_valid() {
        bail!("'{}' is not a valid virtual environment", resolved.display());
    }
    if !parent_layout.activate_path().exists() && !parent_layout.activate_bat_path().exists() {
        bail!(
            "parent environment '{}' is missing activate script",
            resolved.display()
        );
    }
    Ok(resolved)
}

fn parent_python_version(parent_root: &Path) -> Option<String> {
    let layout = VenvLayout::new(parent_root);
    PyvenvCfg::read(&layout.pyvenv_cfg_path())
        .ok()?
        .python_minor_version()
}

fn has_python_flag(args: &[String]) -> bool {
    args.iter().any(|arg| {
        arg == "--python" || arg == "-p" || arg.starts_with("--python=") || arg.starts_with("-p=")
    })
}

pub(crate) fn format_install_plan_lines(plan: &InstallPlan) -> Vec<String> {
    let mut lines = Vec::new();

    if plan.degraded {
        lines.push(
            "could not analyze dependencies, falling back to explicit package checks".to_string(),
        );
    }

    for skipped in &plan.skipped {
        if skipped.explicit {
            lines.push(format!(
                "skipping '{}' (v{} available from parent)",
                skipped.name, skipped.ancestor_version
            ));
        } else {
            lines.push(format!(
                "skipping dependency '{}' (v{} available from parent)",
                skipped.name, skipped.ancestor_version
            ));
        }
    }

    if !plan.conflicts.is_empty() {
        lines.push("version conflicts detected:".to_string());
        for conflict in &plan.conflicts {
            lines.push(format!(
                "  {}: parent has v{}, requested {}",
                conflict.name, conflict.ancestor_version, conflict.requested
            ));
        }
        lines.push("child environment will override the parent versions".to_string());
    }

    lines
}

pub(crate) fn format_uninstall_plan_lines(plan: &UninstallPlan) -> Vec<String> {
    let mut lines = Vec::new();

    if !plan.not_found.is_empty() {
        lines.push(format!(
            "not installed in current environment: {}",
            plan.not_found.join(", ")
        ));
    }

    for entry in &plan.still_visible {
        lines.push(format!(
            "'{}' will remain available from parent (v{})",
            entry.name, entry.ancestor_version
        ));
    }

    lines
}
