// ABOUTME: Source-control provider wrapping the git and gh command line tools
// ABOUTME: Finds merged pull requests and parses their metadata into MergedPr values

use crate::changelog::MergedPr;
use crate::{DaybookError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::sync::OnceLock;
use std::time::Duration;
use wait_timeout::ChildExt;

/// How long to wait for `gh pr view`
pub const GH_TIMEOUT: Duration = Duration::from_secs(10);

/// Commits kept from a `gh pr view` response
pub const GH_COMMIT_LIMIT: usize = 10;

fn regex(cell: &'static OnceLock<regex_lite::Regex>, pattern: &str) -> &'static regex_lite::Regex {
    cell.get_or_init(|| regex_lite::Regex::new(pattern).expect("valid regex"))
}

/// Repository name from an `origin` URL such as
/// `git@github.com:user/repo.git` or `https://github.com/user/repo`
pub fn repo_name_from_remote(url: &str) -> Option<String> {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    regex(&RE, r"/([^/]+?)(?:\.git)?$")
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First `#N` reference in a commit message
pub fn parse_pr_number(message: &str) -> Option<u64> {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    regex(&RE, r"#(\d+)")
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Title from the subject line with merge boilerplate and a trailing
/// `(#N)` removed; falls back to `PR #N`
pub fn clean_title(subject: &str, number: u64) -> String {
    static MERGE_PREFIX: OnceLock<regex_lite::Regex> = OnceLock::new();
    static PR_SUFFIX: OnceLock<regex_lite::Regex> = OnceLock::new();

    let title = regex(&MERGE_PREFIX, r"^Merge pull request #\d+ from \S+\s*").replace(subject, "");
    let title = regex(&PR_SUFFIX, r"\s*\(#\d+\)$").replace(&title, "");
    if title.is_empty() {
        MergedPr::placeholder_title(number)
    } else {
        title.into_owned()
    }
}

/// Source branch from `... from <branch>`, or `unknown`
pub fn parse_branch(message: &str) -> String {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    regex(&RE, r"from (\S+)")
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| "unknown".to_string(), |m| m.as_str().to_string())
}

/// File count from `git diff --stat` output
pub fn parse_files_changed(stat: &str) -> u32 {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    regex(&RE, r"(\d+) files? changed")
        .captures(stat)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPr {
    title: Option<String>,
    author: Option<GhAuthor>,
    merged_at: Option<String>,
    #[serde(default)]
    commits: Vec<GhCommit>,
    changed_files: Option<u32>,
    head_ref_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhAuthor {
    name: Option<String>,
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhCommit {
    message_headline: Option<String>,
    commit: Option<GhCommitBody>,
}

#[derive(Debug, Deserialize)]
struct GhCommitBody {
    message: Option<String>,
}

impl GhCommit {
    fn headline(&self) -> Option<String> {
        self.message_headline
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.commit
                    .as_ref()
                    .and_then(|c| c.message.as_deref())
                    .and_then(|m| m.lines().next())
                    .map(str::to_string)
            })
            .filter(|s| !s.is_empty())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Build a [`MergedPr`] from `gh pr view --json` output. `today` is used when
/// the PR has no merge timestamp.
pub fn pr_from_gh_json(number: u64, json: &str, today: &str) -> Result<MergedPr> {
    let gh: GhPr = serde_json::from_str(json)?;

    let merge_date = non_empty(gh.merged_at)
        .and_then(|ts| ts.split('T').next().map(str::to_string))
        .unwrap_or_else(|| today.to_string());

    let author = gh
        .author
        .and_then(|a| non_empty(a.name).or(a.login))
        .unwrap_or_else(|| "unknown".to_string());

    Ok(MergedPr {
        number,
        title: gh
            .title
            .unwrap_or_else(|| MergedPr::placeholder_title(number)),
        author,
        branch: gh.head_ref_name.unwrap_or_else(|| "unknown".to_string()),
        merge_date,
        commits: gh
            .commits
            .iter()
            .take(GH_COMMIT_LIMIT)
            .filter_map(GhCommit::headline)
            .collect(),
        files_changed: gh.changed_files.unwrap_or(0),
    })
}

fn stdout_of(output: Output, what: &str) -> Result<String> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(DaybookError::Git(format!(
            "{what} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

/// Run `cmd` with piped output. A child still running after `timeout` is
/// killed and reaped, and `Ok(None)` is returned.
pub fn output_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Option<Output>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    match child.wait_timeout(timeout)? {
        Some(status) => {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            if let Some(mut stream) = child.stdout.take() {
                stream.read_to_end(&mut stdout)?;
            }
            if let Some(mut stream) = child.stderr.take() {
                stream.read_to_end(&mut stderr)?;
            }
            Ok(Some(Output {
                status,
                stdout,
                stderr,
            }))
        }
        None => {
            let _ = child.kill();
            child.wait()?;
            Ok(None)
        }
    }
}

/// git / gh invocations rooted at one working directory
#[derive(Debug, Clone)]
pub struct GitCli {
    cwd: PathBuf,
}

impl GitCli {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Run `git <args>` and return trimmed stdout
    pub fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!(?args, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.cwd)
            .output()
            .map_err(|e| DaybookError::Git(format!("failed to run git: {e}")))?;
        stdout_of(output, &format!("git {}", args.join(" ")))
    }

    /// Repository name from `origin`, else the directory name
    pub fn repo_name(&self) -> String {
        self.run(&["remote", "get-url", "origin"])
            .ok()
            .and_then(|url| repo_name_from_remote(&url))
            .or_else(|| {
                self.cwd
                    .canonicalize()
                    .unwrap_or_else(|_| self.cwd.clone())
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Merge commit hashes since a git date expression like `1 day ago`
    pub fn recent_merges(&self, since: &str) -> Result<Vec<String>> {
        let since_arg = format!("--since={since}");
        let output = self.run(&["log", "--merges", "--pretty=format:%H", &since_arg])?;
        Ok(output
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// PR metadata for a merge commit; `None` when the message has no `#N`
    pub fn merge_info(&self, hash: &str, today: &str) -> Result<Option<MergedPr>> {
        let message = self.run(&["log", "-1", "--pretty=format:%s%n%b", hash])?;
        let Some(number) = parse_pr_number(&message) else {
            tracing::debug!(hash, "merge commit has no PR reference");
            return Ok(None);
        };

        let subject = message.lines().next().unwrap_or_default();
        let author = self.run(&["log", "-1", "--pretty=format:%an", hash])?;
        let date = self.run(&["log", "-1", "--pretty=format:%ci", hash])?;
        let merge_date = date
            .split(' ')
            .next()
            .filter(|d| !d.is_empty())
            .unwrap_or(today)
            .to_string();

        // sub-commits and stats are best effort
        let range = format!("{hash}^..{hash}^2");
        let commits = self
            .run(&["log", "--pretty=format:%s", &range])
            .map(|out| {
                out.lines()
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let diff_range = format!("{hash}^..{hash}");
        let files_changed = self
            .run(&["diff", "--stat", &diff_range])
            .map(|stat| parse_files_changed(&stat))
            .unwrap_or(0);

        Ok(Some(MergedPr {
            number,
            title: clean_title(subject, number),
            author,
            branch: parse_branch(&message),
            merge_date,
            commits,
            files_changed,
        }))
    }

    /// Look a PR up with `gh pr view`. Any failure (missing gh, timeout,
    /// unknown PR, bad JSON) yields `None`.
    pub fn pr_from_gh(&self, number: u64, today: &str) -> Option<MergedPr> {
        let mut cmd = Command::new("gh");
        cmd.args([
            "pr",
            "view",
            &number.to_string(),
            "--json",
            "title,author,mergedAt,commits,changedFiles,headRefName",
        ])
        .current_dir(&self.cwd);

        let output = match output_with_timeout(&mut cmd, GH_TIMEOUT) {
            Ok(Some(output)) => output,
            Ok(None) => {
                tracing::warn!(number, "gh pr view timed out");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to run gh");
                return None;
            }
        };

        let json = match stdout_of(output, "gh pr view") {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(number, error = %e, "gh lookup failed");
                return None;
            }
        };

        match pr_from_gh_json(number, &json, today) {
            Ok(pr) => Some(pr),
            Err(e) => {
                tracing::warn!(number, error = %e, "could not parse gh output");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name_from_remote() {
        assert_eq!(
            repo_name_from_remote("git@github.com:user/widgets.git").as_deref(),
            Some("widgets")
        );
        assert_eq!(
            repo_name_from_remote("https://github.com/user/widgets\n").as_deref(),
            Some("widgets")
        );
        assert_eq!(repo_name_from_remote("widgets"), None);
    }

    #[test]
    fn test_parse_pr_number() {
        assert_eq!(parse_pr_number("Merge pull request #123 from a/b"), Some(123));
        assert_eq!(parse_pr_number("feat: thing (#45)"), Some(45));
        assert_eq!(parse_pr_number("Merge branch 'main'"), None);
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("Merge pull request #12 from user/feature", 12), "PR #12");
        assert_eq!(clean_title("feat: add export (#12)", 12), "feat: add export");
        assert_eq!(
            clean_title("Merge pull request #3 from u/b Add search", 3),
            "Add search"
        );
        assert_eq!(clean_title("Plain subject", 4), "Plain subject");
    }

    #[test]
    fn test_parse_branch_and_files() {
        assert_eq!(parse_branch("Merge pull request #1 from user/topic\n\nbody"), "user/topic");
        assert_eq!(parse_branch("feat: x (#1)"), "unknown");
        assert_eq!(parse_files_changed(" 3 files changed, 10 insertions(+)"), 3);
        assert_eq!(parse_files_changed(" 1 file changed, 1 deletion(-)"), 1);
        assert_eq!(parse_files_changed(""), 0);
    }

    #[test]
    fn test_pr_from_gh_json() {
        let json = r#"{
            "title": "feat: add search",
            "author": {"login": "dana", "name": ""},
            "mergedAt": "2024-01-31T12:00:00Z",
            "commits": [
                {"messageHeadline": "first"},
                {"commit": {"message": "second\n\nbody"}},
                {"messageHeadline": ""}
            ],
            "changedFiles": 4,
            "headRefName": "feature/search"
        }"#;
        let pr = pr_from_gh_json(42, json, "2024-02-01").unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.title, "feat: add search");
        assert_eq!(pr.author, "dana");
        assert_eq!(pr.merge_date, "2024-01-31");
        assert_eq!(pr.commits, vec!["first", "second"]);
        assert_eq!(pr.files_changed, 4);
        assert_eq!(pr.branch, "feature/search");
    }

    #[test]
    fn test_pr_from_gh_json_defaults() {
        let pr = pr_from_gh_json(7, "{}", "2024-02-01").unwrap();
        assert_eq!(pr.title, "PR #7");
        assert_eq!(pr.author, "unknown");
        assert_eq!(pr.merge_date, "2024-02-01");
        assert!(pr.commits.is_empty());
    }

    #[test]
    fn test_pr_from_gh_json_rejects_garbage() {
        assert!(pr_from_gh_json(7, "not json", "2024-02-01").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_output_with_timeout_returns_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo hello; echo oops >&2; exit 3"]);
        let output = output_with_timeout(&mut cmd, Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "oops\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_output_with_timeout_kills_slow_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 2; touch '{}'", marker.display());
        let mut cmd = Command::new("sh");
        cmd.args(["-c", &script]);

        let started = std::time::Instant::now();
        let output = output_with_timeout(&mut cmd, Duration::from_millis(200)).unwrap();
        assert!(output.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));

        // a surviving child would create the marker
        std::thread::sleep(Duration::from_secs(3));
        assert!(!marker.exists());
    }

    #[test]
    fn test_output_with_timeout_missing_program_is_error() {
        let mut cmd = Command::new("daybook-no-such-program");
        assert!(output_with_timeout(&mut cmd, Duration::from_secs(1)).is_err());
    }
}
