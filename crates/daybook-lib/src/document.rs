// ABOUTME: Line-oriented model of a ledger file used by the merge-writer
// ABOUTME: Supports anchor lookup, insertion and a lossless render back to text

/// A markdown document held as an ordered list of lines.
///
/// `LedgerDocument::parse(text).render() == text` for every input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerDocument {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl LedgerDocument {
    /// Split text into lines, remembering whether it ended with a newline
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        let (body, trailing_newline) = match text.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (text, false),
        };
        Self {
            lines: body.split('\n').map(str::to_string).collect(),
            trailing_newline,
        }
    }

    /// True when the document has no non-blank content
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the first line whose trimmed content equals `needle`
    pub fn find_line(&self, needle: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.trim() == needle)
    }

    /// Index of the first line matching `pred`
    pub fn position(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.lines.iter().position(|line| pred(line))
    }

    /// First index at or after `from` that is not a blank line
    pub fn skip_blank(&self, from: usize) -> usize {
        let mut idx = from;
        while idx < self.lines.len() && self.lines[idx].trim().is_empty() {
            idx += 1;
        }
        idx
    }

    /// Whether the line just before `at` exists and has content
    pub fn follows_content(&self, at: usize) -> bool {
        at > 0
            && self
                .lines
                .get(at - 1)
                .is_some_and(|line| !line.trim().is_empty())
    }

    /// Insert `new_lines` before index `at`, keeping their order
    pub fn insert_at<I>(&mut self, at: usize, new_lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let at = at.min(self.lines.len());
        let before = self.lines.len();
        let at_end = at == before;
        self.lines.splice(at..at, new_lines);
        if at_end && self.lines.len() > before {
            self.trailing_newline = true;
        }
    }

    /// Render back to text
    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }
}
