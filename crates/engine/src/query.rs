//! Query classification and dispatch.
//!
//! Every query is evaluated by [`inspect`], a pure function of the document,
//! the query text, and the settings. Workflow step queries recurse into
//! [`inspect`] with the step's sub-document and derived settings.

use cwl_inspector_types::{Settings, ToolClass};
use serde_json::Value;
use tracing::debug;

use crate::command_line::synthesize;
use crate::document::Document;
use crate::error::{InspectError, Result};
use crate::field_paths::resolve;
use crate::options::InspectOptions;
use crate::outputs::locate_outputs;
use crate::workflow::prepare_step;

/// A classified query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query<'a> {
    /// `.path.to.node`
    Path(&'a str),
    /// `keys(.path)`
    Keys(&'a str),
    /// `commandline`
    CommandLine,
    /// `commandline(step)`
    StepCommandLine(&'a str),
    /// `ls(.outputs.id)`
    ListOutputs(&'a str),
    /// `ls(.steps.id)`
    ListStepOutputs(&'a str),
}

impl<'a> Query<'a> {
    pub fn parse(query: &'a str) -> Result<Self> {
        let query = query.trim();
        if query.starts_with('.') {
            return Ok(Self::Path(query));
        }
        if query == "commandline" {
            return Ok(Self::CommandLine);
        }
        if let Some(path) = call_argument(query, "keys") {
            return Ok(Self::Keys(path));
        }
        if let Some(step) = call_argument(query, "commandline") {
            return Ok(Self::StepCommandLine(step));
        }
        if let Some(path) = call_argument(query, "ls") {
            if path.starts_with(".outputs.") {
                return Ok(Self::ListOutputs(path));
            }
            if path.starts_with(".steps.") {
                return Ok(Self::ListStepOutputs(path));
            }
        }
        Err(InspectError::UnknownQuery { query: query.to_string() })
    }
}

/// Extracts `argument` from `name(argument)`; empty arguments do not match.
fn call_argument<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    let argument = query.strip_prefix(name)?.strip_prefix('(')?.strip_suffix(')')?;
    (!argument.is_empty()).then_some(argument)
}

/// Evaluates `query` against `document`.
pub fn inspect(document: &Document, query: &str, settings: &Settings, options: &InspectOptions) -> Result<Value> {
    let parsed = Query::parse(query)?;
    debug!(?parsed, "dispatching query");

    match parsed {
        Query::Path(path) => resolve(document, path),
        Query::Keys(path) => match resolve(document, path)? {
            Value::Object(entries) => Ok(Value::Array(entries.into_iter().map(|(key, _)| Value::String(key)).collect())),
            _ => Err(InspectError::NotAMapping { path: path.to_string() }),
        },
        Query::CommandLine => {
            require_class(document, query, ToolClass::CommandLineTool)?;
            Ok(Value::String(synthesize(document, settings, options)?.join(" ")))
        }
        Query::StepCommandLine(reference) => {
            require_class(document, query, ToolClass::Workflow)?;
            let step = prepare_step(document, reference, settings, options)?;
            debug!(step = %step.path, "recursing into step document");
            inspect(&step.document, "commandline", &step.settings, options)
        }
        Query::ListOutputs(path) => match document_class(document)? {
            ToolClass::CommandLineTool => locate_outputs(document, path, settings, options),
            ToolClass::Workflow => Err(InspectError::unsupported_output(path, "listing workflow outputs is not implemented")),
            other => Err(InspectError::class_mismatch(query, ToolClass::CommandLineTool.as_str(), other.as_str())),
        },
        Query::ListStepOutputs(path) => match document_class(document)? {
            ToolClass::Workflow => Err(InspectError::unsupported_output(path, "listing step outputs is not implemented")),
            other => Err(InspectError::class_mismatch(query, ToolClass::Workflow.as_str(), other.as_str())),
        },
    }
}

fn document_class(document: &Document) -> Result<ToolClass> {
    match resolve(document, ".class")? {
        Value::String(class) => Ok(ToolClass::from(class.as_str())),
        _ => Err(InspectError::no_such_field(".class")),
    }
}

fn require_class(document: &Document, query: &str, expected: ToolClass) -> Result<()> {
    let found = document_class(document)?;
    if found == expected {
        Ok(())
    } else {
        Err(InspectError::class_mismatch(query, expected.as_str(), found.as_str()))
    }
}
