// ABOUTME: 'daybook lint' command implementation
// ABOUTME: Reports bullets that sit above the first date header and would be ignored

use daybook_lib::{lint, DaybookError, Result};
use std::fs;
use std::path::PathBuf;

/// Configuration for lint command
pub struct LintConfig {
    pub files: Vec<PathBuf>,
    pub verbose: bool,
}

/// Lint each ledger file
pub fn run(config: &LintConfig) -> Result<()> {
    let mut total = 0;

    for path in &config.files {
        let content = fs::read_to_string(path)?;
        let warnings = lint(&content);

        for warning in &warnings {
            println!("{}: {warning}", path.display());
        }
        if warnings.is_empty() && config.verbose {
            println!("✅ {}", path.display());
        }
        total += warnings.len();
    }

    if total > 0 {
        return Err(DaybookError::Lint(total));
    }
    Ok(())
}
