// ABOUTME: 'daybook ingest' command implementation
// ABOUTME: Merges a session extract into completed, next-steps, blockers and decisions ledgers

use daybook_lib::extract::ingest;
use chrono::NaiveDate;
use daybook_lib::{Config, DaybookError, Project, Result, SessionExtract};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

/// Configuration for ingest command
pub struct IngestConfig {
    pub project: String,
    pub file: Option<PathBuf>,
    pub date: Option<String>,
    pub dry_run: bool,
    pub verbose: bool,
}

/// Merge one extract into a project's ledgers
pub fn run(vault: &Config, config: &IngestConfig) -> Result<()> {
    validate_project_name(&config.project)?;

    let date = match &config.date {
        Some(date) => validate_date(date)?,
        None => chrono::Local::now().format("%Y-%m-%d").to_string(),
    };

    let raw = match &config.file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    // A bad extract means nothing to record, not a failed run
    let extract = match SessionExtract::from_oracle_output(&raw) {
        Ok(extract) => extract,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable extract");
            eprintln!("⚠️  Could not read extract, nothing recorded: {e}");
            return Ok(());
        }
    };

    let project = Project::new(&config.project, vault.project_dir(&config.project));
    if config.verbose {
        println!("Summary: {}", extract.summary);
        println!("Project dir: {}", project.path.display());
    }

    let batches = extract.ledger_batches(&project.name);
    if batches.is_empty() {
        println!("No records to ingest.");
        return Ok(());
    }

    if config.dry_run {
        for batch in &batches {
            println!(
                "[dry-run] Would merge {} entries into {} under ## {date}",
                batch.entries.len(),
                project.path.join(batch.file).display()
            );
            for entry in &batch.entries {
                println!("  {entry}");
            }
        }
        return Ok(());
    }

    let written = ingest(&project, &date, &extract)?;
    if written.is_empty() {
        println!("Ledgers already up to date.");
    }
    for path in written {
        println!("Updated: {}", path.display());
    }

    Ok(())
}

/// Accept only real calendar dates written as `YYYY-MM-DD`
fn validate_date(date: &str) -> Result<String> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
        DaybookError::Config(format!("invalid date '{date}', expected YYYY-MM-DD: {e}"))
    })?;
    let canonical = parsed.format("%Y-%m-%d").to_string();
    if canonical != date {
        return Err(DaybookError::Config(format!(
            "invalid date '{date}', expected YYYY-MM-DD"
        )));
    }
    Ok(canonical)
}

fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('.') || name.contains(&['/', '\\'][..]) {
        return Err(DaybookError::Config(format!(
            "invalid project name '{name}'"
        )));
    }
    Ok(())
}
