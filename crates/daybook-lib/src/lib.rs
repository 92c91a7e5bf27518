// ABOUTME: Core library for Daybook providing dated markdown ledger functionality
// ABOUTME: Includes line classification, parsing, aggregation, merge-writing, changelog and ingest

pub mod aggregate;
pub mod changelog;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod git;
pub mod line;
pub mod merge;
pub mod parser;

pub use aggregate::{Project, StandupReport, Window};
pub use changelog::{ChangeType, MergedPr};
pub use config::Config;
pub use document::LedgerDocument;
pub use error::DaybookError;
pub use extract::SessionExtract;
pub use git::GitCli;
pub use line::{classify, LineKind};
pub use merge::{merge_entries, merge_into_file, DetailBlock, MergeStyle};
pub use parser::{lint, parse, parse_file, DatedRecords, LintWarning, Record};

/// Result type alias using [`DaybookError`]
pub type Result<T> = std::result::Result<T, DaybookError>;
