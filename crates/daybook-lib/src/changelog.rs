// ABOUTME: Changelog entries built from merged pull requests
// ABOUTME: Change-type detection, entry formatting and writing project and vault changelogs

use crate::aggregate::Project;
use crate::config::Config;
use crate::line::date_header;
use crate::merge::{merge_into_file, DetailBlock, MergeStyle};
use crate::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Changelog file kept in the repository itself
pub const PROJECT_CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Conventional change category inferred from a PR title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Feat,
    Fix,
    Refactor,
    Docs,
    Test,
    Chore,
    Update,
}

impl ChangeType {
    /// Classify a title by keyword; the first matching category wins
    pub fn detect(title: &str) -> Self {
        const RULES: &[(ChangeType, &[&str])] = &[
            (ChangeType::Feat, &["feat:", "feature:", "add ", "added ", "new "]),
            (ChangeType::Fix, &["fix:", "bug:", "fixed ", "bugfix"]),
            (ChangeType::Refactor, &["refactor:", "refactored ", "cleanup"]),
            (ChangeType::Docs, &["docs:", "documentation", "readme"]),
            (ChangeType::Test, &["test:", "tests:", "testing"]),
            (ChangeType::Chore, &["chore:", "deps:", "dependency", "bump"]),
        ];

        let lower = title.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
            .map_or(Self::Update, |(kind, _)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Refactor => "refactor",
            Self::Docs => "docs",
            Self::Test => "test",
            Self::Chore => "chore",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A merged pull request as reported by git or the GitHub CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPr {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub branch: String,
    /// `YYYY-MM-DD`
    pub merge_date: String,
    /// Subjects of the commits in the PR
    pub commits: Vec<String>,
    pub files_changed: u32,
}

impl MergedPr {
    /// Title used when none could be extracted
    pub fn placeholder_title(number: u64) -> String {
        format!("PR #{number}")
    }

    /// Whether the title is still the placeholder
    pub fn has_placeholder_title(&self) -> bool {
        self.title == Self::placeholder_title(self.number)
    }

    /// `- <type>: <title> (PR #<n>)`
    pub fn entry(&self) -> String {
        format!(
            "- {}: {} (PR #{})",
            ChangeType::detect(&self.title),
            self.title,
            self.number
        )
    }

    /// Commit list rendered under the vault changelog section
    pub fn detail(&self) -> DetailBlock {
        DetailBlock {
            id: Self::placeholder_title(self.number),
            author: self.author.clone(),
            items: self.commits.clone(),
        }
    }
}

/// Group PRs by merge date, dates ascending, PR order kept within a date
pub fn group_by_date(prs: &[MergedPr]) -> BTreeMap<String, Vec<&MergedPr>> {
    let mut by_date: BTreeMap<String, Vec<&MergedPr>> = BTreeMap::new();
    for pr in prs {
        by_date.entry(pr.merge_date.clone()).or_default().push(pr);
    }
    by_date
}

/// Merge PR entries into `<project_dir>/CHANGELOG.md` and the vault's
/// `Projects/<repo>/changelog.md`, one date section per merge date.
/// Returns the files that changed.
pub fn update_changelogs(
    config: &Config,
    project_dir: &Path,
    repo: &str,
    prs: &[MergedPr],
) -> Result<Vec<PathBuf>> {
    let project_changelog = project_dir.join(PROJECT_CHANGELOG_FILE);
    let vault_changelog = Project::new(repo, config.project_dir(repo)).changelog_path();
    let mut written = Vec::new();

    for (date, prs) in group_by_date(prs) {
        let header = date_header(&date);
        let entries: Vec<String> = prs.iter().map(|pr| pr.entry()).collect();
        let details: Vec<DetailBlock> = prs.iter().map(|pr| pr.detail()).collect();

        if merge_into_file(&project_changelog, &header, &entries, MergeStyle::ProjectChangelog)?
            && !written.contains(&project_changelog)
        {
            written.push(project_changelog.clone());
        }

        let vault_style = MergeStyle::VaultChangelog {
            repo,
            details: &details,
        };
        if merge_into_file(&vault_changelog, &header, &entries, vault_style)?
            && !written.contains(&vault_changelog)
        {
            written.push(vault_changelog.clone());
        }
    }

    Ok(written)
}
