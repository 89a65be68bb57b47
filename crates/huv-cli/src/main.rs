use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use huv_installer::UvTool;

mod command_flows;
mod render;


#[derive(Parser, Debug)]
#[command(name = "huv")]
#[command(about = "Hierarchical virtual environments on top of uv", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a virtual environment, optionally inheriting from a parent
    Venv(VenvArgs),
    /// Hierarchy-aware pip install/uninstall; other pip commands pass through
    Pip(PipArgs),
    /// Anything else is forwarded to uv unchanged
    #[command(external_subcommand)]
    External(Vec<String>),
}

#[derive(Args, Debug)]
struct VenvArgs {
    /// Path for the new virtual environment
    path: PathBuf,
    /// Parent environment whose packages become visible at lower precedence
    #[arg(long)]
    parent: Option<PathBuf>,
    /// Remaining flags are forwarded to `uv venv`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    uv_args: Vec<String>,
}

#[derive(Args, Debug)]
struct PipArgs {
    /// pip subcommand and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    // Mirror a bare `uv` invocation: no arguments shows uv's help.
    if raw_args.is_empty() {
        return exit_from(run_passthrough(&["--help".to_string()]));
    }

    // Leading flags other than help (e.g. `huv --version`) belong to uv;
    // clap's external subcommands cannot capture them.
    let first = raw_args[0].as_str();
    if first.starts_with('-') && first != "--help" && first != "-h" {
        return exit_from(run_passthrough(&raw_args));
    }

    exit_from(run_cli(Cli::parse()))
}

fn run_cli(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Venv(args) => {
            let uv = UvTool::locate()?;
            command_flows::run_venv_command(
                &uv,
                &args.path,
                args.parent.as_deref(),
                &args.uv_args,
            )
        }
        Commands::Pip(args) => run_pip(args),
        Commands::External(args) => run_passthrough(&args),
    }
}

fn run_pip(args: PipArgs) -> Result<i32> {
    let Some((subcommand, rest)) = args.args.split_first() else {
        return run_passthrough(&["pip".to_string()]);
    };

    match subcommand.as_str() {
        "install" => {
            let uv = UvTool::locate()?;
            let (specs, extra) = partition_pip_args(rest);
            command_flows::run_install_command(&uv, &specs, &extra)
        }
        "uninstall" => {
            let uv = UvTool::locate()?;
            let (names, extra) = partition_pip_args(rest);
            command_flows::run_uninstall_command(&uv, &names, &extra)
        }
        _ => {
            let mut forwarded = vec!["pip".to_string()];
            forwarded.extend(args.args.iter().cloned());
            run_passthrough(&forwarded)
        }
    }
}

fn run_passthrough(args: &[String]) -> Result<i32> {
    let uv = UvTool::locate()?;
    command_flows::run_passthrough_command(&uv, args)
}

/// Splits pip arguments into package tokens and forwarded flags, the same
/// positional/optional split argparse applied in front of uv.
fn partition_pip_args(args: &[String]) -> (Vec<String>, Vec<String>) {
    let mut packages = Vec::new();
    let mut flags = Vec::new();
    for arg in args {
        if arg.starts_with('-') {
            flags.push(arg.clone());
        } else {
            packages.push(arg.clone());
        }
    }
    (packages, flags)
}

fn exit_from(result: Result<i32>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
