// ABOUTME: Merge-writer that appends entries under a date header without duplicating lines
// ABOUTME: Pure merge_entries plus a read-modify-write wrapper for files on disk

use crate::document::LedgerDocument;
use crate::Result;
use std::fs;
use std::path::Path;

/// Sub-items rendered per detail block
pub const DETAIL_ITEM_LIMIT: usize = 5;

/// Extra context rendered under a new vault changelog section, e.g. the
/// commits of one pull request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailBlock {
    /// Identifier shown in bold, e.g. `PR #12`
    pub id: String,
    pub author: String,
    pub items: Vec<String>,
}

impl DetailBlock {
    /// Blank line, `**id** (author):`, then up to five indented items.
    /// Blocks missing an id, author or items render nothing.
    fn render_lines(&self) -> Vec<String> {
        if self.id.is_empty() || self.author.is_empty() || self.items.is_empty() {
            return Vec::new();
        }
        let mut lines = vec![String::new(), format!("**{}** ({}):", self.id, self.author)];
        lines.extend(
            self.items
                .iter()
                .take(DETAIL_ITEM_LIMIT)
                .map(|item| format!("  - {item}")),
        );
        lines
    }
}

/// Which kind of ledger is being written. Decides the seed text for new
/// files and where a new date section goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStyle<'a> {
    /// `CHANGELOG.md` in a repository; sections go after the title block
    ProjectChangelog,
    /// `Projects/<repo>/changelog.md`; sections go after the `---` line
    VaultChangelog {
        repo: &'a str,
        details: &'a [DetailBlock],
    },
    /// A standup ledger such as `completed.md`; sections go after the title block
    StandupLedger { title: &'a str },
}

impl MergeStyle<'_> {
    /// Text written into a new or empty file
    pub fn preamble(&self) -> String {
        match self {
            Self::ProjectChangelog => {
                "# Changelog\n\nAll notable changes to this project.\n\n".to_string()
            }
            Self::VaultChangelog { repo, .. } => {
                format!("# Changelog - {repo}\n\n> Merged PRs and releases.\n\n---\n\n")
            }
            Self::StandupLedger { title } => format!("# {title}\n\n"),
        }
    }

    fn anchor(&self, doc: &LedgerDocument) -> usize {
        match self {
            Self::VaultChangelog { .. } => match doc.find_line("---") {
                Some(idx) => doc.skip_blank(idx + 1),
                None => doc.len(),
            },
            Self::ProjectChangelog | Self::StandupLedger { .. } => title_block_end(doc),
        }
    }

    fn details(&self) -> &[DetailBlock] {
        match self {
            Self::VaultChangelog { details, .. } => details,
            _ => &[],
        }
    }
}

/// End of the `# Title` line plus its description paragraph and the blank
/// lines after it. Without a title the anchor is the end of the document.
fn title_block_end(doc: &LedgerDocument) -> usize {
    let Some(title) = doc.position(|line| line.starts_with("# ")) else {
        return doc.len();
    };
    let lines = doc.lines();
    let mut idx = doc.skip_blank(title + 1);
    while idx < lines.len() && !lines[idx].trim().is_empty() && !lines[idx].starts_with("##") {
        idx += 1;
    }
    doc.skip_blank(idx)
}

/// Entries not already contained anywhere in `source`, in their given order
fn fresh_entries<S: AsRef<str>>(source: &str, entries: &[S]) -> Vec<String> {
    let mut fresh: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.as_ref();
        if source.contains(entry) || fresh.iter().any(|seen| seen == entry) {
            tracing::debug!(entry, "skipping entry already present");
            continue;
        }
        fresh.push(entry.to_string());
    }
    fresh
}

/// Merge `entries` under `date_header` (e.g. `## 2024-02-01`).
///
/// An empty document is first seeded with the style's preamble. When the
/// header line exists, entries not found anywhere in the document are inserted
/// right after the header and its blank lines. Otherwise a new section is
/// spliced in at the style's anchor. Existing lines are never removed or
/// reordered, so merging the same batch twice changes nothing the second time.
pub fn merge_entries<S: AsRef<str>>(
    text: &str,
    date_header: &str,
    entries: &[S],
    style: MergeStyle<'_>,
) -> String {
    let seeded;
    let source = if text.trim().is_empty() {
        seeded = style.preamble();
        seeded.as_str()
    } else {
        text
    };

    let mut doc = LedgerDocument::parse(source);
    let fresh = fresh_entries(source, entries);
    let header = date_header.trim();

    if let Some(idx) = doc.find_line(header) {
        let at = doc.skip_blank(idx + 1);
        doc.insert_at(at, fresh);
        return doc.render();
    }

    if fresh.is_empty() {
        return doc.render();
    }

    let at = style.anchor(&doc);
    let mut block = Vec::new();
    if doc.follows_content(at) {
        block.push(String::new());
    }
    block.push(header.to_string());
    block.push(String::new());
    block.extend(fresh);
    for detail in style.details() {
        block.extend(detail.render_lines());
    }
    block.push(String::new());
    doc.insert_at(at, block);

    doc.render()
}

/// Read `path` (missing means empty), merge, and write back if anything
/// changed. Parent directories are created as needed. Returns whether the
/// file was written.
pub fn merge_into_file<S: AsRef<str>>(
    path: impl AsRef<Path>,
    date_header: &str,
    entries: &[S],
    style: MergeStyle<'_>,
) -> Result<bool> {
    let path = path.as_ref();
    let original = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let merged = merge_entries(&original, date_header, entries, style);
    if merged == original {
        tracing::debug!(path = %path.display(), "ledger already up to date");
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, merged)?;
    tracing::info!(path = %path.display(), header = date_header, "updated ledger");
    Ok(true)
}
