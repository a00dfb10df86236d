//! Resolution of where a declared output will appear on disk.

use std::path::Path;

use cwl_inspector_types::Settings;
use cwl_inspector_util::format_json_value;
use serde_json::Value;
use tracing::{debug, warn};

use crate::command_line::{is_stdout_output, stdout_path};
use crate::document::Document;
use crate::error::{InspectError, Result};
use crate::field_paths::resolve;
use crate::options::InspectOptions;
use crate::resolve::Evaluator;

const GLOB_METACHARACTERS: [char; 3] = ['*', '?', '['];

/// Locates the files produced by the output at `output_path` (e.g. `.outputs.out`).
///
/// Returns a single path string for stdout captures and literal globs, and a
/// sequence of matches (possibly empty) for wildcard globs.
pub fn locate_outputs(document: &Document, output_path: &str, settings: &Settings, options: &InspectOptions) -> Result<Value> {
    let declaration = resolve(document, output_path)?;
    let evaluator = Evaluator::new(document, settings, options);

    if is_stdout_output(&declaration) {
        return stdout_path(document, &evaluator, &settings.runtime).map(Value::String);
    }

    let glob = declaration
        .get("outputBinding")
        .ok_or_else(|| InspectError::unsupported_output(output_path, "outputs without outputBinding are not supported"))?
        .get("glob")
        .ok_or_else(|| InspectError::unsupported_output(output_path, "outputBinding has no glob"))?;

    let outdir = settings.runtime.outdir.as_deref();
    let patterns = match glob {
        Value::Array(templates) => templates
            .iter()
            .map(|template| evaluator.instantiate(&format_json_value(template)))
            .collect::<Result<Vec<_>>>()?,
        template => match evaluator.instantiate(&format_json_value(template))? {
            Value::Array(patterns) => patterns,
            pattern => return expand_pattern(&pattern, outdir),
        },
    };

    let mut matches = Vec::new();
    for pattern in &patterns {
        match expand_pattern(pattern, outdir)? {
            Value::Array(found) => matches.extend(found),
            literal => matches.push(literal),
        }
    }
    Ok(Value::Array(matches))
}

/// Expands a wildcard pattern under `outdir`; other patterns are returned literally.
fn expand_pattern(pattern: &Value, outdir: Option<&str>) -> Result<Value> {
    let pattern = format_json_value(pattern);
    if !pattern.contains(GLOB_METACHARACTERS) {
        return Ok(Value::String(pattern));
    }

    let rooted = match outdir {
        Some(outdir) => Path::new(outdir).join(&pattern).to_string_lossy().into_owned(),
        None => pattern,
    };
    let entries = match glob::glob(&rooted) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(pattern = %rooted, %error, "malformed output glob matches nothing");
            return Ok(Value::Array(Vec::new()));
        }
    };

    let mut matches = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => matches.push(Value::String(path.to_string_lossy().into_owned())),
            Err(error) => debug!(%error, "skipping unreadable glob match"),
        }
    }
    debug!(pattern = %rooted, count = matches.len(), "expanded output glob");
    Ok(Value::Array(matches))
}
