use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

pub fn current_output_style() -> OutputStyle {
    if std::env::var_os("NO_COLOR").is_some() {
        return OutputStyle::Plain;
    }
    if matches!(std::env::var("TERM"), Ok(term) if term == "dumb") {
        return OutputStyle::Plain;
    }
    if std::io::stdout().is_terminal() {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => format!("{status}: {message}"),
        OutputStyle::Rich => format!("{} {message}", colorize(status_style(status), status)),
    }
}

/// Spinner shown while the dry-run resolution runs; rich output only.
pub fn start_spinner(style: OutputStyle, label: &str) -> Option<ProgressBar> {
    if style != OutputStyle::Rich {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan.bold} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(label.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Some(spinner)
}

pub fn finish_spinner(spinner: Option<ProgressBar>) {
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
}

fn status_style(status: &str) -> Style {
    match status {
        "ok" => Style::new()
            .fg_color(Some(AnsiColor::BrightGreen.into()))
            .effects(Effects::BOLD),
        "warn" | "conflict" => Style::new()
            .fg_color(Some(AnsiColor::BrightYellow.into()))
            .effects(Effects::BOLD),
        "skip" => Style::new().fg_color(Some(AnsiColor::BrightCyan.into())),
        "step" => Style::new()
            .fg_color(Some(AnsiColor::BrightBlue.into()))
            .effects(Effects::BOLD),
        _ => Style::new(),
    }
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
