//! Rendering of query results for the terminal.

use anyhow::Result;
use serde_json::Value;

/// How a query result is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Strings raw, sequences one element per line, everything else as JSON.
    #[default]
    Plain,
    Yaml,
}

/// Renders `value` without a trailing newline.
pub fn render(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Plain => render_plain(value),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?.trim_end_matches('\n').to_string()),
    }
}

fn render_plain(value: &Value) -> Result<String> {
    Ok(match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => serde_json::to_string_pretty(other)?,
    })
}
