// ABOUTME: 'daybook changelog' command implementation
// ABOUTME: Finds merged PRs via git/gh and merges them into project and vault changelogs

use daybook_lib::changelog::{group_by_date, update_changelogs};
use daybook_lib::{Config, DaybookError, GitCli, MergedPr, Result};
use std::path::PathBuf;

/// Configuration for changelog command
pub struct ChangelogConfig {
    pub since: String,
    pub pr: Option<u64>,
    pub dry_run: bool,
    pub project: Option<PathBuf>,
    pub verbose: bool,
}

/// Update changelogs from merged pull requests
pub fn run(vault: &Config, config: &ChangelogConfig) -> Result<()> {
    let project_dir = match &config.project {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let git = GitCli::new(&project_dir);
    let repo = git.repo_name();
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    println!("Repository: {repo}");
    println!("Project dir: {}", git.cwd().display());

    let mut prs = match config.pr {
        Some(number) => {
            println!("Fetching PR #{number}...");
            match git.pr_from_gh(number, &today) {
                Some(pr) => vec![pr],
                None => {
                    return Err(DaybookError::NotFound(format!(
                        "Could not find PR #{number}"
                    )))
                }
            }
        }
        None => find_recent_prs(&git, &config.since, &today),
    };

    if prs.is_empty() {
        println!("No merged PRs found.");
        return Ok(());
    }

    if config.pr.is_none() {
        enrich_titles(&git, &mut prs, &today, config.verbose);
    }

    for (date, prs) in group_by_date(&prs).iter().rev() {
        println!("\n## {date}");
        for pr in prs {
            println!("  {}", pr.entry());
        }
    }

    if config.dry_run {
        println!("\n[DRY RUN] No files updated.");
        return Ok(());
    }

    let written = update_changelogs(vault, &project_dir, &repo, &prs)?;
    if written.is_empty() {
        println!("\nChangelogs already up to date.");
    }
    for path in written {
        println!("Updated: {}", path.display());
    }

    Ok(())
}

/// Merge commits since `since` that reference a PR. Git failures mean no PRs.
fn find_recent_prs(git: &GitCli, since: &str, today: &str) -> Vec<MergedPr> {
    println!("Checking merges since: {since}");
    let hashes = git.recent_merges(since).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not list merge commits");
        Vec::new()
    });
    println!("Found {} merge commits", hashes.len());

    let mut prs = Vec::new();
    for hash in &hashes {
        match git.merge_info(hash, today) {
            Ok(Some(pr)) => {
                println!("  - PR #{}: {}", pr.number, pr.title);
                prs.push(pr);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(hash = hash.as_str(), error = %e, "skipping merge commit"),
        }
    }
    prs
}

/// Replace PRs whose title could not be read from git with the gh view
fn enrich_titles(git: &GitCli, prs: &mut [MergedPr], today: &str, verbose: bool) {
    if verbose {
        println!("\nFetching PR details from GitHub...");
    }
    for pr in prs.iter_mut().filter(|pr| pr.has_placeholder_title()) {
        if let Some(gh_pr) = git.pr_from_gh(pr.number, today) {
            println!("  - PR #{}: {}", pr.number, gh_pr.title);
            *pr = gh_pr;
        }
    }
}
