//! Synthesis of the command line a tool description would execute.
//!
//! Tokens are assembled in five stages: container wrapper, base command,
//! explicit `arguments`, positional inputs, and stdout redirection. Inputs
//! without a bound value render as `$<id>` placeholders.

use std::path::Path;

use cwl_inspector_types::{CommandLineBinding, DOCKER_REQUIREMENT, RuntimeParams, Settings, declaration_type, find_class_entry};
use cwl_inspector_util::format_json_value;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{InspectError, Result};
use crate::field_paths::fetch_or;
use crate::inputs_context::reference_path;
use crate::options::InspectOptions;
use crate::resolve::Evaluator;
use crate::sections::SectionName;

/// Leading tokens of a containerised invocation; the image follows.
pub const CONTAINER_COMMAND: [&str; 4] = ["docker", "run", "-i", "--rm"];

/// Stdout file name used when an output captures stdout but none is declared.
pub const RANDOMIZED_STDOUT: &str = "$randomized_filename";

/// Value rendered for one binding.
#[derive(Debug, Clone, PartialEq)]
enum ParameterValue {
    Bound(Value),
    /// No value was supplied; carries the `$<id>` token.
    Placeholder(String),
}

/// Builds the token sequence for a `CommandLineTool` document.
pub fn synthesize(document: &Document, settings: &Settings, options: &InspectOptions) -> Result<Vec<String>> {
    let evaluator = Evaluator::new(document, settings, options);
    let mut tokens = container_prefix(document, options)?;

    if let Value::Array(command) = fetch_or(document, ".baseCommand", json!([])) {
        tokens.extend(command.iter().map(format_json_value));
    }

    if let Value::Array(arguments) = fetch_or(document, ".arguments", json!([])) {
        for (index, argument) in arguments.iter().enumerate() {
            tokens.extend(argument_tokens(argument, index, &evaluator)?);
        }
    }

    for (id, declaration, binding) in positional_inputs(document)? {
        let value = match &binding.value_from {
            Some(template) => ParameterValue::Bound(evaluator.instantiate(template.trim())?),
            None => match settings.args.get(id) {
                Some(supplied) => ParameterValue::Bound(supplied.clone()),
                None => ParameterValue::Placeholder(format!("${id}")),
            },
        };
        let optional = declaration_type(declaration).is_some_and(|parameter_type| parameter_type.is_optional());
        tokens.extend(input_tokens(&binding, value, optional, settings));
    }

    if declares_stdout(document) {
        tokens.push(">".to_string());
        tokens.push(stdout_path(document, &evaluator, &settings.runtime)?);
    }

    debug!(count = tokens.len(), "synthesized command line");
    Ok(tokens)
}

fn container_prefix(document: &Document, options: &InspectOptions) -> Result<Vec<String>> {
    let tree = document.tree();
    let image = if let Some(requirement) = tree
        .get("requirements")
        .and_then(|requirements| find_class_entry(requirements, DOCKER_REQUIREMENT))
    {
        let image = requirement
            .get("dockerPull")
            .ok_or_else(|| InspectError::no_such_field(format!(".requirements.{DOCKER_REQUIREMENT}.dockerPull")))?;
        Some(format_json_value(image))
    } else if let Some(hint) = tree.get("hints").and_then(|hints| find_class_entry(hints, DOCKER_REQUIREMENT)) {
        match hint.get("dockerPull") {
            Some(image) if options.container_runtime.is_available() => Some(format_json_value(image)),
            Some(_) => {
                debug!("container hint ignored; no container runtime available");
                None
            }
            None => {
                warn!("container hint has no dockerPull; ignoring it");
                None
            }
        }
    } else {
        None
    };

    Ok(image
        .map(|image| CONTAINER_COMMAND.iter().map(|token| token.to_string()).chain([image]).collect::<Vec<_>>())
        .unwrap_or_default())
}

fn argument_tokens(argument: &Value, index: usize, evaluator: &Evaluator<'_>) -> Result<Vec<String>> {
    match argument {
        Value::String(template) => Ok(spread(evaluator.instantiate(template)?)),
        Value::Object(_) => {
            let binding = CommandLineBinding::from_value(argument).map_err(|source| InspectError::InvalidBinding {
                path: format!(".arguments.{index}"),
                source,
            })?;
            let value = match &binding.value_from {
                Some(template) => evaluator.instantiate(template.trim())?,
                None => Value::Null,
            };
            Ok(apply_prefix(&binding, render_value(&value, binding.item_separator())))
        }
        other => Ok(spread(other.clone())),
    }
}

/// Inputs carrying an `inputBinding`, stably ordered by effective position.
fn positional_inputs(document: &Document) -> Result<Vec<(&str, &Value, CommandLineBinding)>> {
    let Some(Value::Object(declarations)) = document.section(SectionName::Inputs) else {
        return Ok(Vec::new());
    };

    let mut positional = Vec::new();
    for (id, declaration) in declarations {
        let Some(raw_binding) = declaration.get("inputBinding") else {
            continue;
        };
        let binding = CommandLineBinding::from_value(raw_binding).map_err(|source| InspectError::InvalidBinding {
            path: format!(".inputs.{id}.inputBinding"),
            source,
        })?;
        positional.push((id.as_str(), declaration, binding));
    }
    positional.sort_by_key(|(_, _, binding)| binding.effective_position());
    Ok(positional)
}

fn input_tokens(binding: &CommandLineBinding, value: ParameterValue, optional: bool, settings: &Settings) -> Vec<String> {
    match value {
        ParameterValue::Bound(value) => apply_prefix(binding, render_value(&value, binding.item_separator())),
        ParameterValue::Placeholder(placeholder) => {
            let tokens = apply_prefix(binding, Some(placeholder));
            if !optional {
                tokens
            } else if settings.has_bound_args() {
                Vec::new()
            } else {
                std::iter::once("[".to_string()).chain(tokens).chain(["]".to_string()]).collect()
            }
        }
    }
}

fn apply_prefix(binding: &CommandLineBinding, value: Option<String>) -> Vec<String> {
    match (&binding.prefix, value) {
        (Some(prefix), Some(value)) if binding.separate() => vec![prefix.clone(), value],
        (Some(prefix), Some(value)) => vec![format!("{prefix}{value}")],
        (Some(prefix), None) => vec![prefix.clone()],
        (None, Some(value)) => vec![value],
        (None, None) => Vec::new(),
    }
}

/// Renders a bound value as a single token. `null` renders nothing.
fn render_value(value: &Value, item_separator: &str) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| render_value(item, item_separator))
                .collect::<Vec<_>>()
                .join(item_separator),
        ),
        record if is_path_record(record) => Some(reference_path(record)),
        other => Some(format_json_value(other)),
    }
}

fn is_path_record(value: &Value) -> bool {
    matches!(value.get("class").and_then(Value::as_str), Some("File" | "Directory"))
}

/// Tokens produced by a bare template entry of `arguments`; sequences spread.
fn spread(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(|item| render_value(item, " ")).collect(),
        other => render_value(&other, " ").into_iter().collect(),
    }
}

/// True when the tool captures its standard output.
pub(crate) fn declares_stdout(document: &Document) -> bool {
    if document.tree().get("stdout").is_some_and(|stdout| !stdout.is_null()) {
        return true;
    }
    matches!(document.section(SectionName::Outputs), Some(Value::Object(outputs))
        if outputs.values().any(is_stdout_output))
}

pub(crate) fn is_stdout_output(declaration: &Value) -> bool {
    declaration_type(declaration).is_some_and(|parameter_type| parameter_type.is("stdout"))
}

/// File the tool's standard output is captured into, under `outdir` when set.
pub(crate) fn stdout_path(document: &Document, evaluator: &Evaluator<'_>, runtime: &RuntimeParams) -> Result<String> {
    let template = match document.tree().get("stdout") {
        Some(Value::String(template)) => template.as_str(),
        _ => RANDOMIZED_STDOUT,
    };
    let file_name = format_json_value(&evaluator.instantiate(template)?);
    Ok(match &runtime.outdir {
        Some(outdir) => Path::new(outdir).join(file_name).to_string_lossy().into_owned(),
        None => file_name,
    })
}
