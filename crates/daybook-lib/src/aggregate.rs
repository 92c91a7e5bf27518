// ABOUTME: Cross-project projections over standup ledgers and the standup report
// ABOUTME: Completed-since, open next steps, active blockers and markdown rendering

use crate::parser::{parse_file, DatedRecords};
use crate::Result;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Completed items shown per project
pub const COMPLETED_LIMIT: usize = 10;
/// Open next steps shown per project
pub const FOCUS_LIMIT: usize = 5;
/// Blockers shown across the whole report
pub const BLOCKER_LIMIT: usize = 5;
/// Number of most recent blocker dates considered active
pub const BLOCKER_RECENT_DATES: usize = 3;

pub const COMPLETED_FILE: &str = "completed.md";
pub const NEXT_STEPS_FILE: &str = "next-steps.md";
pub const BLOCKERS_FILE: &str = "blockers.md";
pub const DECISIONS_FILE: &str = "decisions.md";
pub const CHANGELOG_FILE: &str = "changelog.md";

/// A project directory inside the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Directory name
    pub name: String,
    /// Directory path
    pub path: PathBuf,
}

impl Project {
    /// Create a project handle for a directory
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// List every immediate, non-hidden subdirectory, sorted by name.
    /// A missing projects directory yields no projects.
    pub fn discover(projects_dir: impl AsRef<Path>) -> Result<Vec<Self>> {
        let projects_dir = projects_dir.as_ref();
        if !projects_dir.exists() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        for entry in fs::read_dir(projects_dir)?.flatten() {
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    projects.push(Self::new(name, entry.path()));
                }
            }
        }

        projects.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(count = projects.len(), dir = %projects_dir.display(), "discovered projects");
        Ok(projects)
    }

    pub fn completed_path(&self) -> PathBuf {
        self.path.join(COMPLETED_FILE)
    }

    pub fn next_steps_path(&self) -> PathBuf {
        self.path.join(NEXT_STEPS_FILE)
    }

    pub fn blockers_path(&self) -> PathBuf {
        self.path.join(BLOCKERS_FILE)
    }

    pub fn decisions_path(&self) -> PathBuf {
        self.path.join(DECISIONS_FILE)
    }

    pub fn changelog_path(&self) -> PathBuf {
        self.path.join(CHANGELOG_FILE)
    }

    /// Completed work recorded on or after `since`
    pub fn completed_since(&self, since: &str) -> Result<Vec<String>> {
        Ok(completed_since(&parse_file(self.completed_path(), Some(since))?))
    }

    /// Every open next step, newest date first
    pub fn open_next_steps(&self) -> Result<Vec<String>> {
        Ok(open_next_steps(&parse_file(self.next_steps_path(), None)?))
    }

    /// Blockers still active in the most recent dates
    pub fn active_blockers(&self) -> Result<Vec<String>> {
        Ok(active_blockers(&parse_file(self.blockers_path(), None)?))
    }
}

/// Checked items and notes in ascending date order; open items are skipped.
/// Date filtering happens at parse time.
pub fn completed_since(records: &DatedRecords) -> Vec<String> {
    records
        .values()
        .flatten()
        .filter(|record| !record.is_open())
        .map(|record| record.text().to_string())
        .collect()
}

/// Open checklist items, most recent date first, regardless of age
pub fn open_next_steps(records: &DatedRecords) -> Vec<String> {
    records
        .values()
        .rev()
        .flatten()
        .filter(|record| record.is_open())
        .map(|record| record.text().to_string())
        .collect()
}

/// Open items and notes from the three most recent dates; checked items are resolved
pub fn active_blockers(records: &DatedRecords) -> Vec<String> {
    records
        .values()
        .rev()
        .take(BLOCKER_RECENT_DATES)
        .flatten()
        .filter(|record| !record.is_checked())
        .map(|record| record.text().to_string())
        .collect()
}

/// Reporting window for completed work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Days to look back from today
    pub days: u32,
    /// Heading used for the completed section
    pub label: String,
}

impl Window {
    /// Window of `days` days with the matching label
    pub fn days(days: u32) -> Self {
        let label = if days == 1 {
            "Yesterday".to_string()
        } else {
            format!("Last {days} Days")
        };
        Self { days, label }
    }

    /// Seven day window labelled as a weekly summary
    pub fn week() -> Self {
        Self {
            days: 7,
            label: "This Week".to_string(),
        }
    }

    /// Parse `"N days"` / `"N day"`; anything else means one day
    pub fn parse(since: &str) -> Self {
        static DAYS: OnceLock<regex_lite::Regex> = OnceLock::new();
        let re = DAYS.get_or_init(|| regex_lite::Regex::new(r"^(\d+)\s*days?").expect("valid regex"));

        let days = re
            .captures(since)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1);
        Self::days(days)
    }

    /// First date (inclusive) of the window as a ledger key. Windows reaching
    /// past the earliest representable date start there.
    pub fn cutoff(&self, today: NaiveDate) -> String {
        today
            .checked_sub_signed(Duration::days(i64::from(self.days)))
            .unwrap_or(NaiveDate::MIN)
            .format("%Y-%m-%d")
            .to_string()
    }
}

/// Roll-up of every project's standup ledgers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandupReport {
    /// Report date, `YYYY-MM-DD`
    pub date: String,
    /// Heading for the completed section
    pub since_label: String,
    pub completed: BTreeMap<String, Vec<String>>,
    pub focus: BTreeMap<String, Vec<String>>,
    pub blockers: BTreeMap<String, Vec<String>>,
}

impl StandupReport {
    /// Run all three projections for each project
    pub fn collect(projects: &[Project], window: &Window, today: NaiveDate) -> Result<Self> {
        let cutoff = window.cutoff(today);
        let mut report = Self {
            date: today.format("%Y-%m-%d").to_string(),
            since_label: window.label.clone(),
            ..Self::default()
        };

        for project in projects {
            report
                .completed
                .insert(project.name.clone(), project.completed_since(&cutoff)?);
            report
                .focus
                .insert(project.name.clone(), project.open_next_steps()?);
            report
                .blockers
                .insert(project.name.clone(), project.active_blockers()?);
        }

        Ok(report)
    }

    /// Render the report as markdown
    pub fn render(&self) -> String {
        let mut lines = vec![format!("# Daily Standup - {}", self.date), String::new()];

        if self.completed.values().any(|items| !items.is_empty()) {
            lines.push(format!("## {}", self.since_label));
            lines.push(String::new());
            push_project_sections(&mut lines, &self.completed, COMPLETED_LIMIT, "- [x]");
        }

        if self.focus.values().any(|items| !items.is_empty()) {
            lines.push("## Today's Focus".to_string());
            lines.push(String::new());
            push_project_sections(&mut lines, &self.focus, FOCUS_LIMIT, "- [ ]");
        }

        lines.push("## Blockers".to_string());
        lines.push(String::new());
        let blockers: Vec<String> = self
            .blockers
            .iter()
            .flat_map(|(project, items)| items.iter().map(move |item| format!("- {project}: {item}")))
            .take(BLOCKER_LIMIT)
            .collect();
        if blockers.is_empty() {
            lines.push("- (none)".to_string());
        } else {
            lines.extend(blockers);
        }
        lines.push(String::new());

        lines.join("\n")
    }
}

fn push_project_sections(
    lines: &mut Vec<String>,
    by_project: &BTreeMap<String, Vec<String>>,
    limit: usize,
    marker: &str,
) {
    for (project, items) in by_project {
        if items.is_empty() {
            continue;
        }
        lines.push(format!("### {project}"));
        lines.extend(items.iter().take(limit).map(|item| format!("{marker} {item}")));
        lines.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_scenario_completed_and_next_steps() {
        let doc = "## 2024-01-01\n- [x] did A\n- [ ] todo B\n";
        assert_eq!(completed_since(&parse(doc, Some("2024-01-01"))), vec!["did A"]);
        assert_eq!(open_next_steps(&parse(doc, None)), vec!["todo B"]);
    }

    #[test]
    fn test_completed_includes_notes_in_ascending_order() {
        let doc = "## 2024-01-02\n- [x] second\n## 2024-01-01\n- [x] first\n- a note\n- [ ] skipped\n";
        assert_eq!(
            completed_since(&parse(doc, None)),
            vec!["first", "a note", "second"]
        );
    }

    #[test]
    fn test_next_steps_ignore_age_and_go_newest_first() {
        let doc = "## 2020-01-01\n- [ ] ancient\n- [x] done\n## 2024-05-01\n- [ ] recent\n- note\n";
        assert_eq!(open_next_steps(&parse(doc, None)), vec!["recent", "ancient"]);
    }

    #[test]
    fn test_blockers_use_three_most_recent_dates() {
        let doc = "## 2024-01-01\n- [ ] too old\n\
                   ## 2024-01-02\n- [ ] b2\n\
                   ## 2024-01-03\n- [x] resolved\n- waiting on vendor\n\
                   ## 2024-01-04\n- [ ] b4\n";
        assert_eq!(
            active_blockers(&parse(doc, None)),
            vec!["b4", "waiting on vendor", "b2"]
        );
    }

    #[test]
    fn test_empty_dates_still_count_towards_recent_blockers() {
        let doc = "## 2024-01-01\n- [ ] hidden\n## 2024-01-02\n## 2024-01-03\n## 2024-01-04\n";
        assert!(active_blockers(&parse(doc, None)).is_empty());
    }

    #[test]
    fn test_window_parse() {
        assert_eq!(Window::parse("1 day"), Window::days(1));
        assert_eq!(Window::parse("3 days").label, "Last 3 Days");
        assert_eq!(Window::parse("14days").days, 14);
        assert_eq!(Window::parse("yesterday").days, 1);
        assert_eq!(Window::parse("1 day").label, "Yesterday");
        assert_eq!(Window::week().label, "This Week");
    }

    #[test]
    fn test_window_cutoff() {
        assert_eq!(Window::days(1).cutoff(date("2024-03-01")), "2024-02-29");
        assert_eq!(Window::week().cutoff(date("2024-01-03")), "2023-12-27");
    }

    #[test]
    fn test_huge_window_cutoff_keeps_everything() {
        let window = Window::parse("99999999 days");
        assert_eq!(window.days, 99_999_999);

        let cutoff = window.cutoff(date("2026-10-18"));
        let doc = "## 0001-01-01\n- [x] ancient\n## 2026-10-18\n- [x] today\n";
        assert_eq!(completed_since(&parse(doc, Some(&cutoff))), vec!["ancient", "today"]);
    }

    #[test]
    fn test_discover_skips_hidden_and_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join(".templates")).unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();

        let names: Vec<String> = Project::discover(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_project_ledger_paths() {
        let project = Project::new("alpha", "/vault/Projects/alpha");
        assert_eq!(project.completed_path(), PathBuf::from("/vault/Projects/alpha/completed.md"));
        assert_eq!(project.next_steps_path(), PathBuf::from("/vault/Projects/alpha/next-steps.md"));
        assert_eq!(project.blockers_path(), PathBuf::from("/vault/Projects/alpha/blockers.md"));
        assert_eq!(project.decisions_path(), PathBuf::from("/vault/Projects/alpha/decisions.md"));
        assert_eq!(project.changelog_path(), PathBuf::from("/vault/Projects/alpha/changelog.md"));
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert!(Project::discover(dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_collect_and_render() {
        let dir = tempdir().unwrap();
        let alpha = dir.path().join("alpha");
        let beta = dir.path().join("beta");
        fs::create_dir_all(&alpha).unwrap();
        fs::create_dir_all(&beta).unwrap();
        fs::write(
            alpha.join(COMPLETED_FILE),
            "## 2024-01-01\n- [x] too old\n## 2024-01-09\n- [x] shipped parser\n",
        )
        .unwrap();
        fs::write(alpha.join(NEXT_STEPS_FILE), "## 2024-01-09\n- [ ] write docs\n").unwrap();
        fs::write(beta.join(BLOCKERS_FILE), "## 2024-01-08\n- [ ] waiting on review\n").unwrap();

        let projects = Project::discover(dir.path()).unwrap();
        let report = StandupReport::collect(&projects, &Window::days(1), date("2024-01-10")).unwrap();
        let rendered = report.render();

        let expected = "# Daily Standup - 2024-01-10\n\n\
                        ## Yesterday\n\n\
                        ### alpha\n- [x] shipped parser\n\n\
                        ## Today's Focus\n\n\
                        ### alpha\n- [ ] write docs\n\n\
                        ## Blockers\n\n\
                        - beta: waiting on review\n";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_empty_report() {
        let report = StandupReport {
            date: "2024-01-10".to_string(),
            since_label: "Yesterday".to_string(),
            ..StandupReport::default()
        };
        assert_eq!(
            report.render(),
            "# Daily Standup - 2024-01-10\n\n## Blockers\n\n- (none)\n"
        );
    }

    #[test]
    fn test_render_applies_limits() {
        let mut report = StandupReport {
            date: "2024-01-10".to_string(),
            since_label: "Last 3 Days".to_string(),
            ..StandupReport::default()
        };
        let many: Vec<String> = (0..12).map(|i| format!("item {i}")).collect();
        report.completed.insert("p".to_string(), many.clone());
        report.focus.insert("p".to_string(), many.clone());
        report.blockers.insert("a".to_string(), many[..3].to_vec());
        report.blockers.insert("b".to_string(), many[..3].to_vec());

        let rendered = report.render();
        assert_eq!(rendered.matches("- [x] ").count(), COMPLETED_LIMIT);
        assert_eq!(rendered.matches("- [ ] ").count(), FOCUS_LIMIT);
        assert_eq!(rendered.matches("- a: ").count(), 3);
        assert_eq!(rendered.matches("- b: ").count(), 2);
        assert!(rendered.contains("## Last 3 Days"));
    }
}
