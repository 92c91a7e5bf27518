// ABOUTME: Structured session extracts produced by an external extraction oracle
// ABOUTME: Parses and schema-checks oracle output, then merges it into a project's ledgers

use crate::aggregate::{Project, BLOCKERS_FILE, COMPLETED_FILE, DECISIONS_FILE, NEXT_STEPS_FILE};
use crate::line::date_header;
use crate::merge::{merge_into_file, MergeStyle};
use crate::{DaybookError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Shape every extract must have. Fields are optional; present ones must be
/// typed correctly.
const EXTRACT_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "properties": {
    "summary": { "type": "string" },
    "next_steps": { "type": "array", "items": { "type": "string" } },
    "completed": { "type": "array", "items": { "type": "string" } },
    "decisions": { "type": "array", "items": { "type": "string" } },
    "blockers": { "type": "array", "items": { "type": "string" } },
    "github_refs": { "type": "array", "items": { "type": "string" } },
    "files_touched": { "type": "array", "items": { "type": "string" } }
  }
}"#;

/// What the oracle extracted from one working session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionExtract {
    pub summary: String,
    pub next_steps: Vec<String>,
    pub completed: Vec<String>,
    pub decisions: Vec<String>,
    pub blockers: Vec<String>,
    pub github_refs: Vec<String>,
    pub files_touched: Vec<String>,
}

impl Default for SessionExtract {
    fn default() -> Self {
        Self {
            summary: "No summary available".to_string(),
            next_steps: Vec::new(),
            completed: Vec::new(),
            decisions: Vec::new(),
            blockers: Vec::new(),
            github_refs: Vec::new(),
            files_touched: Vec::new(),
        }
    }
}

/// Entries bound for one ledger file of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerBatch {
    /// File name inside the project directory
    pub file: &'static str,
    /// Title used when the file is created
    pub title: String,
    /// Rendered entry lines
    pub entries: Vec<String>,
}

impl SessionExtract {
    /// Parse raw oracle output.
    ///
    /// Accepts a bare JSON object, a `{"result": ...}` envelope, or either of
    /// those wrapped in prose and markdown code fences.
    pub fn from_oracle_output(raw: &str) -> Result<Self> {
        let value = match serde_json::from_str::<Value>(raw.trim()) {
            Ok(Value::Object(mut map)) => match map.remove("result") {
                Some(Value::String(inner)) => extract_json_object(&inner)?,
                Some(inner @ Value::Object(_)) => inner,
                Some(other) => {
                    map.insert("result".to_string(), other);
                    Value::Object(map)
                }
                None => Value::Object(map),
            },
            _ => extract_json_object(raw)?,
        };
        Self::from_value(value)
    }

    /// Validate a JSON value against the extract schema and deserialize it
    pub fn from_value(value: Value) -> Result<Self> {
        validate_shape(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// One batch per non-empty list, for the project called `project`
    pub fn ledger_batches(&self, project: &str) -> Vec<LedgerBatch> {
        let batches = [
            (COMPLETED_FILE, "Completed", "- [x] ", &self.completed),
            (NEXT_STEPS_FILE, "Next Steps", "- [ ] ", &self.next_steps),
            (BLOCKERS_FILE, "Blockers", "- [ ] ", &self.blockers),
            (DECISIONS_FILE, "Decisions", "- ", &self.decisions),
        ];

        batches
            .into_iter()
            .filter_map(|(file, title, marker, items)| {
                let entries: Vec<String> = items
                    .iter()
                    .map(|item| single_line(item))
                    .filter(|item| !item.is_empty())
                    .map(|item| format!("{marker}{item}"))
                    .collect();
                (!entries.is_empty()).then(|| LedgerBatch {
                    file,
                    title: format!("{title} - {project}"),
                    entries,
                })
            })
            .collect()
    }
}

/// Merge an extract into `project`'s ledgers under `date`. Returns the files
/// that changed.
pub fn ingest(project: &Project, date: &str, extract: &SessionExtract) -> Result<Vec<PathBuf>> {
    let header = date_header(date);
    let mut written = Vec::new();

    for batch in extract.ledger_batches(&project.name) {
        let path = project.path.join(batch.file);
        let style = MergeStyle::StandupLedger {
            title: &batch.title,
        };
        if merge_into_file(&path, &header, &batch.entries, style)? {
            written.push(path);
        }
    }

    tracing::info!(project = %project.name, files = written.len(), "ingested session extract");
    Ok(written)
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fence(text: &str) -> &str {
    static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        regex_lite::Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid regex")
    });
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str().trim())
}

fn extract_json_object(text: &str) -> Result<Value> {
    let text = strip_code_fence(text);
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if end > start => Ok(serde_json::from_str(&text[start..=end])?),
        _ => {
            let preview: String = text.chars().take(500).collect();
            Err(DaybookError::Extract(format!(
                "could not find a JSON object in oracle output: {preview}"
            )))
        }
    }
}

fn validate_shape(value: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(EXTRACT_SCHEMA)?;
    let compiled = jsonschema::JSONSchema::compile(&schema)
        .map_err(|e| DaybookError::Schema(format!("invalid extract schema: {e}")))?;

    let result = compiled.validate(value);
    if let Err(errors) = result {
        let message = errors
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(DaybookError::Schema(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use tempfile::tempdir;

    const SAMPLE: &str = r##"{"summary":"Built the parser","next_steps":["write docs"],"completed":["parser","tests"],"decisions":["use BTreeMap"],"blockers":["waiting on review"],"github_refs":["#12"],"files_touched":["src/parser.rs"]}"##;

    #[test]
    fn test_bare_object() {
        let extract = SessionExtract::from_oracle_output(SAMPLE).unwrap();
        assert_eq!(extract.summary, "Built the parser");
        assert_eq!(extract.completed, vec!["parser", "tests"]);
        assert_eq!(extract.github_refs, vec!["#12"]);
    }

    #[test]
    fn test_result_envelope_with_code_fence() {
        let inner = format!("Here you go:\n```json\n{SAMPLE}\n```\n");
        let raw = serde_json::json!({ "type": "result", "result": inner }).to_string();
        let extract = SessionExtract::from_oracle_output(&raw).unwrap();
        assert_eq!(extract.next_steps, vec!["write docs"]);
    }

    #[test]
    fn test_prose_around_object() {
        let raw = format!("Sure! {SAMPLE} Hope that helps.");
        let extract = SessionExtract::from_oracle_output(&raw).unwrap();
        assert_eq!(extract.blockers, vec!["waiting on review"]);
    }

    #[test]
    fn test_missing_fields_default() {
        let extract = SessionExtract::from_oracle_output(r#"{"completed":["x"]}"#).unwrap();
        assert_eq!(extract.summary, "No summary available");
        assert!(extract.next_steps.is_empty());
    }

    #[test]
    fn test_wrong_shape_is_schema_error() {
        let err = SessionExtract::from_oracle_output(r#"{"completed":"not a list"}"#).unwrap_err();
        assert!(matches!(err, DaybookError::Schema(_)), "got {err:?}");
    }

    #[test]
    fn test_no_json_is_extract_error() {
        let err = SessionExtract::from_oracle_output("I could not do that").unwrap_err();
        assert!(matches!(err, DaybookError::Extract(_)));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{}"), "{}");
    }

    #[test]
    fn test_ledger_batches() {
        let extract = SessionExtract {
            completed: vec!["multi\nline  item".to_string(), "  ".to_string()],
            blockers: vec!["vendor".to_string()],
            ..SessionExtract::default()
        };
        let batches = extract.ledger_batches("alpha");
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].file, COMPLETED_FILE);
        assert_eq!(batches[0].title, "Completed - alpha");
        assert_eq!(batches[0].entries, vec!["- [x] multi line item"]);
        assert_eq!(batches[1].entries, vec!["- [ ] vendor"]);
    }

    #[test]
    fn test_ingest_writes_ledgers_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let project = Project::new("alpha", dir.path().join("alpha"));
        let extract = SessionExtract::from_oracle_output(SAMPLE).unwrap();

        let written = ingest(&project, "2024-01-05", &extract).unwrap();
        assert_eq!(written.len(), 4);

        let completed = parse_file(project.completed_path(), None).unwrap();
        let texts: Vec<&str> = completed["2024-01-05"].iter().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["parser", "tests"]);
        assert!(completed["2024-01-05"].iter().all(|r| r.is_checked()));

        assert_eq!(project.open_next_steps().unwrap(), vec!["write docs"]);
        assert_eq!(project.active_blockers().unwrap(), vec!["waiting on review"]);

        let decisions = std::fs::read_to_string(project.decisions_path()).unwrap();
        assert!(decisions.starts_with("# Decisions - alpha\n\n## 2024-01-05\n\n- use BTreeMap\n"));

        assert!(ingest(&project, "2024-01-05", &extract).unwrap().is_empty());
    }
}
