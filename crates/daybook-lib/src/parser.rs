// ABOUTME: Ledger parser turning dated markdown into records grouped by date
// ABOUTME: Also reports bullets that appear before any date header

use crate::line::{classify, LineKind};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One structured fact recovered from a date section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// `- [x] text` or `- [ ] text`
    ChecklistItem { checked: bool, text: String },
    /// `- text`
    Note { text: String },
}

impl Record {
    /// Display text without any checkbox marker
    pub fn text(&self) -> &str {
        match self {
            Self::ChecklistItem { text, .. } | Self::Note { text } => text,
        }
    }

    /// True only for `- [x]` items
    pub fn is_checked(&self) -> bool {
        matches!(self, Self::ChecklistItem { checked: true, .. })
    }

    /// True only for `- [ ]` items
    pub fn is_open(&self) -> bool {
        matches!(self, Self::ChecklistItem { checked: false, .. })
    }

    /// True for plain notes
    pub fn is_note(&self) -> bool {
        matches!(self, Self::Note { .. })
    }
}

/// Records keyed by `YYYY-MM-DD`, iterated in ascending date order
pub type DatedRecords = BTreeMap<String, Vec<Record>>;

/// A bullet that was dropped because no date header preceded it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    /// 1-based line number
    pub line_number: usize,
    /// The offending line, verbatim
    pub line: String,
}

impl std::fmt::Display for LintWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: record before any date header is ignored: {}",
            self.line_number, self.line
        )
    }
}

/// Parse a ledger document into records grouped by date.
///
/// When `since` is given only dates lexically `>= since` are kept, which
/// matches chronological order for `YYYY-MM-DD` keys.
pub fn parse(text: &str, since: Option<&str>) -> DatedRecords {
    let mut records = DatedRecords::new();
    let mut current: Option<&str> = None;
    let mut orphaned = 0usize;

    for line in text.split('\n') {
        let kind = classify(line);

        if let LineKind::DateHeader(date) = kind {
            current = Some(date);
            records.entry(date.to_string()).or_default();
            continue;
        }

        let record = match kind {
            LineKind::CheckedItem(text) => Record::ChecklistItem {
                checked: true,
                text: text.to_string(),
            },
            LineKind::UncheckedItem(text) => Record::ChecklistItem {
                checked: false,
                text: text.to_string(),
            },
            LineKind::Note(text) => Record::Note {
                text: text.to_string(),
            },
            LineKind::DateHeader(_) | LineKind::Other => continue,
        };

        match current {
            Some(date) => records.entry(date.to_string()).or_default().push(record),
            None => orphaned += 1,
        }
    }

    if orphaned > 0 {
        tracing::warn!(count = orphaned, "dropped records that precede the first date header");
    }

    if let Some(cutoff) = since {
        records.retain(|date, _| date.as_str() >= cutoff);
    }

    records
}

/// Parse a ledger file. A missing file is an empty ledger.
pub fn parse_file(path: impl AsRef<Path>, since: Option<&str>) -> Result<DatedRecords> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse(&content, since)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "ledger missing, treating as empty");
            Ok(DatedRecords::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Find bullets that [`parse`] silently drops because they come before the
/// first date header
pub fn lint(text: &str) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    for (idx, line) in text.split('\n').enumerate() {
        match classify(line) {
            LineKind::DateHeader(_) => break,
            LineKind::CheckedItem(_) | LineKind::UncheckedItem(_) | LineKind::Note(_) => {
                warnings.push(LintWarning {
                    line_number: idx + 1,
                    line: line.to_string(),
                });
            }
            LineKind::Other => {}
        }
    }
    warnings
}
