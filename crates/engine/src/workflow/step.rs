//! Workflow step resolution.
//!
//! A `commandline(<step>)` query re-runs the whole pipeline against the
//! document a step's `run` field refers to. This module locates the step,
//! loads that sub-document, and derives the argument map the sub-document
//! sees from the step's `in` wiring.

use cwl_inspector_types::Settings;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::document::Document;
use crate::error::{InspectError, Result};
use crate::field_paths::resolve;
use crate::options::InspectOptions;

/// A workflow step resolved far enough to recurse into.
#[derive(Debug)]
pub struct PreparedStep {
    /// Root path of the step, e.g. `.steps.compile`.
    pub path: String,
    /// The tool or workflow the step runs.
    pub document: Document,
    /// Settings carrying the step's derived arguments.
    pub settings: Settings,
}

/// Normalizes a step reference: a bare id becomes `.steps.<id>`, explicit
/// root paths are kept as written.
pub fn step_path(reference: &str) -> String {
    let reference = reference.trim();
    if reference.starts_with('.') {
        reference.to_string()
    } else {
        format!(".steps.{reference}")
    }
}

/// Resolves the step named by `reference` and prepares its sub-document and settings.
///
/// # Parameters
/// - `document`: the workflow containing the step.
/// - `reference`: a bare step id or a root path such as `.steps.compile`.
/// - `settings`: settings of the workflow query; runtime parameters carry over unchanged.
/// - `options`: supplies the strategy used to find `run` files.
///
/// # Errors
/// Fails when the step cannot be resolved, when it has no `run` field, or when
/// a referenced file cannot be located or loaded.
pub fn prepare_step(document: &Document, reference: &str, settings: &Settings, options: &InspectOptions) -> Result<PreparedStep> {
    let path = step_path(reference);
    let step = resolve(document, &path)?;

    let step_document = match step.get("run") {
        Some(Value::String(run)) => {
            let located = options
                .document_locator
                .locate(run, document.base_dir())
                .ok_or_else(|| InspectError::RunNotFound {
                    reference: run.clone(),
                    step: path.clone(),
                })?;
            debug!(step = %path, file = %located.display(), "loading step document");
            Document::from_path(located)?
        }
        Some(inline) => {
            debug!(step = %path, "using inline step document");
            Document::from_value(inline.clone(), document.base_dir())
        }
        None => return Err(InspectError::no_such_field(format!("{path}.run"))),
    };

    let args = step_args(step.get("in").unwrap_or(&Value::Null), &settings.args);
    Ok(PreparedStep {
        path,
        document: step_document,
        settings: settings.with_args(args),
    })
}

/// Derives the sub-document's arguments from the step's `in` wiring.
///
/// Sources produced by other steps (`step/output`) are not evaluated and
/// become `$[step/output]` placeholders. Workflow-level sources take the
/// workflow argument when bound, otherwise the `$<source>` placeholder. An
/// entry without a source falls back to its `default`, if any.
pub fn step_args(wiring: &Value, workflow_args: &Map<String, Value>) -> Map<String, Value> {
    normalize_wiring(wiring)
        .into_iter()
        .filter_map(|(id, entry)| {
            let value = match entry {
                Value::Object(record) => match record.get("source") {
                    Some(source) => wire_source(source, workflow_args),
                    None => record.get("default")?.clone(),
                },
                source => wire_source(source, workflow_args),
            };
            Some((id.to_string(), value))
        })
        .collect()
}

/// Accepts `id: source`, `id: {source: ...}`, and `[{id, source}]` forms.
fn normalize_wiring(wiring: &Value) -> IndexMap<&str, &Value> {
    match wiring {
        Value::Object(entries) => entries.iter().map(|(id, entry)| (id.as_str(), entry)).collect(),
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| {
                let id = entry.get("id").and_then(Value::as_str);
                if id.is_none() {
                    trace!(?entry, "skipping step input without id");
                }
                Some((id?, entry))
            })
            .collect(),
        _ => IndexMap::new(),
    }
}

fn wire_source(source: &Value, workflow_args: &Map<String, Value>) -> Value {
    match source {
        Value::String(source) if source.contains('/') => Value::String(format!("$[{source}]")),
        Value::String(source) => workflow_args
            .get(source)
            .cloned()
            .unwrap_or_else(|| Value::String(format!("${source}"))),
        Value::Array(sources) => Value::Array(sources.iter().map(|source| wire_source(source, workflow_args)).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn workflow_args() -> Map<String, Value> {
        let mut args = Map::new();
        args.insert("message".into(), json!("hello"));
        args
    }

    #[test]
    fn bare_ids_become_step_paths() {
        assert_eq!(step_path("compile"), ".steps.compile");
        assert_eq!(step_path(".steps.compile"), ".steps.compile");
    }

    #[test]
    fn mapping_wiring_binds_workflow_arguments() {
        let args = step_args(&json!({"text": "message", "file": "untar/example_out", "other": "missing"}), &workflow_args());
        assert_eq!(args["text"], "hello");
        assert_eq!(args["file"], "$[untar/example_out]");
        assert_eq!(args["other"], "$missing");
    }

    #[test]
    fn record_and_sequence_wiring_are_equivalent() {
        let from_records = step_args(&json!({"text": {"source": "message"}}), &workflow_args());
        let from_sequence = step_args(&json!([{"id": "text", "source": "message"}]), &workflow_args());
        assert_eq!(from_records, from_sequence);
        assert_eq!(from_records["text"], "hello");
    }

    #[test]
    fn defaults_apply_when_no_source_is_wired() {
        let args = step_args(&json!([{"id": "threads", "default": 4}, {"id": "flag"}, {"source": "message"}]), &workflow_args());
        assert_eq!(args.len(), 1);
        assert_eq!(args["threads"], 4);
    }

    #[test]
    fn wiring_keeps_declaration_order() {
        let args = step_args(&json!({"z": "message", "a": "message"}), &workflow_args());
        let keys: Vec<&String> = args.keys().collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn inline_run_is_used_directly() {
        let workflow = Document::from_value(
            json!({
                "class": "Workflow",
                "steps": [{"id": "say", "in": {"text": "message"}, "run": {"class": "CommandLineTool", "baseCommand": "echo"}}]
            }),
            ".",
        );
        let settings = Settings::new(Default::default(), workflow_args());
        let prepared = prepare_step(&workflow, "say", &settings, &InspectOptions::default()).expect("step");
        assert_eq!(prepared.path, ".steps.say");
        assert_eq!(prepared.document.tree()["baseCommand"], "echo");
        assert_eq!(prepared.settings.args["text"], "hello");
    }

    #[test]
    fn missing_run_file_is_reported() {
        let directory = tempfile::tempdir().expect("tempdir");
        let workflow = Document::from_value(
            json!({"class": "Workflow", "steps": {"say": {"in": {}, "run": "absent.cwl"}}}),
            directory.path(),
        );
        let error = prepare_step(&workflow, ".steps.say", &Settings::default(), &InspectOptions::default()).expect_err("missing file");
        assert!(matches!(error, InspectError::RunNotFound { ref reference, .. } if reference == "absent.cwl"));
    }

    #[test]
    fn sibling_run_file_is_loaded() {
        let directory = tempfile::tempdir().expect("tempdir");
        std::fs::write(directory.path().join("tool.cwl"), "class: CommandLineTool\nbaseCommand: wc\n").expect("write");
        let workflow = Document::from_value(
            json!({"class": "Workflow", "steps": {"count": {"in": {"file": "input"}, "run": "tool.cwl"}}}),
            directory.path(),
        );
        let prepared = prepare_step(&workflow, "count", &Settings::default(), &InspectOptions::default()).expect("step");
        assert_eq!(prepared.document.tree()["baseCommand"], "wc");
        assert_eq!(prepared.settings.args["file"], "$input");
    }
}
