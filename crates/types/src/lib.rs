//! Strongly typed views shared by the CWL Inspector engine and CLI.
//!
//! Documents are kept as plain [`serde_json::Value`] trees so that arbitrary
//! paths can be queried. The types in this crate describe the handful of
//! records the engine interprets: evaluation settings, the document class,
//! command-line bindings, parameter types, and requirement lookups.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod tool;

pub use tool::{
    CommandLineBinding, DOCKER_REQUIREMENT, INLINE_JAVASCRIPT_REQUIREMENT, ParameterType, declaration_type, find_class_entry,
};

/// Execution-environment parameters exposed to expressions as `runtime`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuntimeParams {
    /// Directory where the tool writes its outputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outdir: Option<String>,
    /// Directory the tool may use for scratch files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmpdir: Option<String>,
}

impl RuntimeParams {
    /// Renders the parameters as the `runtime` object seen by expressions.
    ///
    /// Unset directories are omitted rather than rendered as `null`.
    pub fn to_value(&self) -> Value {
        let mut runtime = Map::new();
        if let Some(outdir) = &self.outdir {
            runtime.insert("outdir".into(), Value::String(outdir.clone()));
        }
        if let Some(tmpdir) = &self.tmpdir {
            runtime.insert("tmpdir".into(), Value::String(tmpdir.clone()));
        }
        Value::Object(runtime)
    }
}

/// Settings threaded through every evaluation of a single query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Operator-supplied runtime parameters.
    pub runtime: RuntimeParams,
    /// User-supplied values keyed by input parameter id.
    pub args: Map<String, Value>,
}

impl Settings {
    pub fn new(runtime: RuntimeParams, args: Map<String, Value>) -> Self {
        Self { runtime, args }
    }

    /// Derives settings for a sub-document, keeping the runtime parameters.
    pub fn with_args(&self, args: Map<String, Value>) -> Self {
        Self {
            runtime: self.runtime.clone(),
            args,
        }
    }

    /// Returns true when at least one input value was supplied for this query.
    ///
    /// Unbound queries render optional parameters as bracketed placeholders,
    /// partially bound ones omit them.
    pub fn has_bound_args(&self) -> bool {
        !self.args.is_empty()
    }
}

/// Document kind declared by the top-level `class` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolClass {
    CommandLineTool,
    Workflow,
    ExpressionTool,
    Other(String),
}

impl ToolClass {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CommandLineTool => "CommandLineTool",
            Self::Workflow => "Workflow",
            Self::ExpressionTool => "ExpressionTool",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for ToolClass {
    fn from(value: &str) -> Self {
        match value {
            "CommandLineTool" => Self::CommandLineTool,
            "Workflow" => Self::Workflow,
            "ExpressionTool" => Self::ExpressionTool,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ToolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
