// ABOUTME: 'daybook standup' command implementation
// ABOUTME: Rolls up completed items, open next steps and blockers across vault projects

use daybook_lib::{Config, DaybookError, Project, Result, StandupReport, Window};
use std::io::Write;
use std::process::{Command, Stdio};

/// Configuration for standup command
pub struct StandupConfig {
    pub since: String,
    pub week: bool,
    pub copy: bool,
    pub project: Option<String>,
    pub verbose: bool,
}

/// Generate the standup report
pub fn run(vault: &Config, config: &StandupConfig) -> Result<()> {
    let window = if config.week {
        Window::week()
    } else {
        Window::parse(&config.since)
    };

    let mut projects = Project::discover(&vault.projects_dir)?;
    if projects.is_empty() {
        return Err(DaybookError::NotFound(format!(
            "No projects found in {}",
            vault.projects_dir.display()
        )));
    }

    if let Some(name) = &config.project {
        projects.retain(|p| &p.name == name);
        if projects.is_empty() {
            return Err(DaybookError::NotFound(format!("Project '{name}' not found")));
        }
    }

    let today = chrono::Local::now().date_naive();
    if config.verbose {
        println!(
            "Collecting {} project(s) since {}",
            projects.len(),
            window.cutoff(today)
        );
    }

    let report = StandupReport::collect(&projects, &window, today)?;
    let text = report.render();
    println!("{text}");

    if config.copy {
        match copy_to_clipboard(&text) {
            Ok(()) => {
                println!("---");
                println!("(Copied to clipboard)");
            }
            Err(e) => eprintln!("⚠️  {e}"),
        }
    }

    Ok(())
}

const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
];

fn copy_to_clipboard(text: &str) -> Result<()> {
    copy_with(CLIPBOARD_COMMANDS, text)
}

/// Pipe `text` into each tool in turn until one exits successfully
fn copy_with(tools: &[(&str, &[&str])], text: &str) -> Result<()> {
    for (program, args) in tools {
        let child = Command::new(program)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(program, error = %e, "clipboard tool unavailable");
                continue;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                tracing::debug!(program, error = %e, "clipboard tool rejected input");
            }
        }

        match child.wait() {
            Ok(status) if status.success() => return Ok(()),
            Ok(status) => tracing::debug!(program, ?status, "clipboard tool failed"),
            Err(e) => tracing::debug!(program, error = %e, "clipboard tool wait failed"),
        }
    }

    Err(DaybookError::Clipboard(
        "no clipboard tool succeeded (tried pbcopy, wl-copy, xclip)".to_string(),
    ))
}
