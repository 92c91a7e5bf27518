// ABOUTME: Line classifier for the dated markdown ledger dialect
// ABOUTME: Maps one line to DateHeader, CheckedItem, UncheckedItem, Note or Other

/// Classification of a single ledger line.
///
/// Borrowed slices point into the classified line. Item and note text is
/// already trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `## YYYY-MM-DD` (anything after the date is ignored)
    DateHeader(&'a str),
    /// `- [x] text`
    CheckedItem(&'a str),
    /// `- [ ] text`
    UncheckedItem(&'a str),
    /// `- text` where text does not start with `[`
    Note(&'a str),
    /// Headers, blank lines, prose and anything malformed
    Other,
}

impl<'a> LineKind<'a> {
    /// Date string of a header line
    pub fn date(&self) -> Option<&'a str> {
        match self {
            Self::DateHeader(date) => Some(date),
            _ => None,
        }
    }
}

/// Classify one line of a ledger document
pub fn classify(line: &str) -> LineKind<'_> {
    if let Some(date) = match_date_header(line) {
        return LineKind::DateHeader(date);
    }

    let Some(after_dash) = match_bullet(line) else {
        return LineKind::Other;
    };

    if let Some((checked, text)) = match_checkbox(after_dash) {
        return if checked {
            LineKind::CheckedItem(text)
        } else {
            LineKind::UncheckedItem(text)
        };
    }

    let text = after_dash.trim();
    if text.starts_with('[') {
        LineKind::Other
    } else {
        LineKind::Note(text)
    }
}

/// Render the canonical header line for a date
pub fn date_header(date: &str) -> String {
    format!("## {date}")
}

/// Whether `date` has the `YYYY-MM-DD` digit layout
pub fn is_date_key(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn match_date_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("##")?;
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    let date = trimmed.get(..10)?;
    is_date_key(date).then_some(date)
}

/// `-` followed by at least one whitespace and at least one more character.
/// Returns everything after the dash.
fn match_bullet(line: &str) -> Option<&str> {
    let after_dash = line.strip_prefix('-')?;
    let mut chars = after_dash.chars();
    let first = chars.next()?;
    if !first.is_whitespace() || chars.next().is_none() {
        return None;
    }
    Some(after_dash)
}

fn match_checkbox(after_dash: &str) -> Option<(bool, &str)> {
    let body = after_dash.trim_start();
    let body = body.strip_prefix('[')?;
    let checked = match body.chars().next()? {
        'x' => true,
        ' ' => false,
        _ => return None,
    };
    let tail = body[1..].strip_prefix(']')?;
    // tail must be whitespace followed by at least one character
    let mut chars = tail.chars();
    let first = chars.next()?;
    if !first.is_whitespace() || chars.next().is_none() {
        return None;
    }
    Some((checked, tail.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_headers() {
        assert_eq!(classify("## 2024-01-31"), LineKind::DateHeader("2024-01-31"));
        assert_eq!(classify("##   2024-01-31"), LineKind::DateHeader("2024-01-31"));
        assert_eq!(
            classify("## 2024-01-31 (Wednesday)"),
            LineKind::DateHeader("2024-01-31")
        );
        assert_eq!(classify("##2024-01-31"), LineKind::Other);
        assert_eq!(classify("## 2024-1-31"), LineKind::Other);
        assert_eq!(classify("### 2024-01-31"), LineKind::Other);
        assert_eq!(classify(" ## 2024-01-31"), LineKind::Other);
    }

    #[test]
    fn test_checklist_items() {
        assert_eq!(classify("- [x] did A"), LineKind::CheckedItem("did A"));
        assert_eq!(classify("- [ ] todo B "), LineKind::UncheckedItem("todo B"));
        assert_eq!(classify("-   [x]   spaced"), LineKind::CheckedItem("spaced"));
    }

    #[test]
    fn test_malformed_checkboxes_are_dropped() {
        // Uppercase X is not a checkbox and the text starts with '['
        assert_eq!(classify("- [X] shout"), LineKind::Other);
        assert_eq!(classify("- [x]"), LineKind::Other);
        assert_eq!(classify("- [x]no-space"), LineKind::Other);
    }

    #[test]
    fn test_notes() {
        assert_eq!(classify("- plain note"), LineKind::Note("plain note"));
        assert_eq!(classify("-\tTabbed"), LineKind::Note("Tabbed"));
        assert_eq!(classify("-no space"), LineKind::Other);
        assert_eq!(classify("-"), LineKind::Other);
        assert_eq!(classify("- [link](x) text"), LineKind::Other);
    }

    #[test]
    fn test_other_lines() {
        assert_eq!(classify(""), LineKind::Other);
        assert_eq!(classify("# Changelog"), LineKind::Other);
        assert_eq!(classify("  - indented"), LineKind::Other);
        assert_eq!(classify("* star bullet"), LineKind::Other);
    }

    #[test]
    fn test_date_helpers() {
        assert_eq!(date_header("2024-02-01"), "## 2024-02-01");
        assert!(is_date_key("2024-02-01"));
        assert!(!is_date_key("2024/02/01"));
        assert!(!is_date_key("24-02-01"));
        assert_eq!(classify("## 2024-02-01").date(), Some("2024-02-01"));
        assert_eq!(classify("- note").date(), None);
    }
}
