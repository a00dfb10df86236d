//! # Template Resolution and Expression Evaluation
//!
//! Templates embed at most one expression, written `$(...)` or `${...}`.
//! Evaluation substitutes the expression's value into the surrounding text, or
//! returns the value itself when the expression is the whole template.
//!
//! ## Evaluation Modes
//!
//! The mode is fixed per document when it is loaded:
//!
//! - **Script**: documents declaring `InlineJavascriptRequirement` hand each
//!   expression to an external Node.js process ([`ScriptEngine`]).
//! - **Restricted**: all other documents support only dotted references rooted
//!   at `runtime`, `inputs`, or `self` ([`PathWalkEngine`]).
//!
//! ## Soft Failures
//!
//! An expression that cannot be resolved (a missing context field, or an error
//! reported by the script engine) yields [`Evaluated::Unresolved`] and the
//! template is kept verbatim. Everything else is a hard [`InspectError`].
//!
//! ## Usage
//!
//! ```rust
//! use cwl_inspector_engine::{Document, InspectOptions};
//! use cwl_inspector_engine::resolve::Evaluator;
//! use cwl_inspector_types::Settings;
//! use serde_json::json;
//!
//! let document = Document::from_value(json!({"inputs": [{"id": "name", "type": "string"}]}), ".");
//! let mut settings = Settings::default();
//! settings.args.insert("name".into(), json!("sample"));
//!
//! let evaluator = Evaluator::new(&document, &settings, &InspectOptions::default());
//! assert_eq!(evaluator.instantiate("$(inputs.name).txt")?, json!("sample.txt"));
//! assert_eq!(evaluator.instantiate("$(inputs.other).txt")?, json!("$(inputs.other).txt"));
//! # Ok::<(), cwl_inspector_engine::InspectError>(())
//! ```

use cwl_inspector_types::Settings;
use cwl_inspector_util::format_json_value;
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use tracing::trace;

use crate::InspectOptions;
use crate::document::Document;
use crate::error::{InspectError, Result};
use crate::inputs_context::build_inputs_context;
use crate::script::ScriptEngine;
use crate::templates::{EmbeddedExpression, find_expression};

/// `self` is always null outside of output bindings.
static SELF_VALUE: Value = Value::Null;

/// Evaluation strategy selected by the document's requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionMode {
    Script,
    Restricted,
}

/// Outcome of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    /// The expression produced a value.
    Resolved(Value),
    /// The expression could not be resolved; carries the text to report.
    Unresolved(String),
}

/// Values an expression may refer to.
///
/// `runtime` is rendered eagerly; `inputs` is built on first use because it
/// reads input files from disk.
pub struct EvaluationScope<'a> {
    document: &'a Document,
    args: &'a Map<String, Value>,
    runtime: Value,
    inputs: OnceCell<Map<String, Value>>,
}

impl<'a> EvaluationScope<'a> {
    pub fn new(document: &'a Document, settings: &'a Settings) -> Self {
        Self {
            document,
            args: &settings.args,
            runtime: settings.runtime.to_value(),
            inputs: OnceCell::new(),
        }
    }

    pub fn runtime(&self) -> &Value {
        &self.runtime
    }

    pub fn inputs(&self) -> &Map<String, Value> {
        self.inputs.get_or_init(|| build_inputs_context(self.document, self.args))
    }
}

/// A strategy for evaluating one embedded expression.
pub trait ExpressionEngine {
    fn evaluate(&self, expression: &EmbeddedExpression<'_>, scope: &EvaluationScope<'_>) -> Result<Evaluated>;
}

/// Resolves dotted references by walking the context structures.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathWalkEngine;

impl ExpressionEngine for PathWalkEngine {
    fn evaluate(&self, expression: &EmbeddedExpression<'_>, scope: &EvaluationScope<'_>) -> Result<Evaluated> {
        let reference = expression.body.trim();
        let mut fields = reference.split('.');
        let root = match fields.next() {
            Some("runtime") => scope.runtime(),
            Some("inputs") => {
                let inputs = scope.inputs();
                return Ok(walk_fields(inputs, fields, reference));
            }
            Some("self") => &SELF_VALUE,
            _ => {
                return Err(InspectError::InvalidContext {
                    expression: reference.to_string(),
                });
            }
        };
        let mut current = root;
        for field in fields {
            match descend(current, field) {
                Some(next) => current = next,
                None => return Ok(unresolved(reference)),
            }
        }
        Ok(Evaluated::Resolved(current.clone()))
    }
}

fn walk_fields<'v>(inputs: &Map<String, Value>, mut fields: impl Iterator<Item = &'v str>, reference: &str) -> Evaluated {
    let Some(first) = fields.next() else {
        return Evaluated::Resolved(Value::Object(inputs.clone()));
    };
    let Some(mut current) = inputs.get(first) else {
        return unresolved(reference);
    };
    for field in fields {
        match descend(current, field) {
            Some(next) => current = next,
            None => return unresolved(reference),
        }
    }
    Evaluated::Resolved(current.clone())
}

fn descend<'v>(value: &'v Value, field: &str) -> Option<&'v Value> {
    match value {
        Value::Object(entries) => entries.get(field),
        Value::Array(items) => field.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn unresolved(reference: &str) -> Evaluated {
    trace!(reference, "context field absent");
    Evaluated::Unresolved(reference.to_string())
}

/// Per-query template evaluator bound to one document and its settings.
pub struct Evaluator<'a> {
    scope: EvaluationScope<'a>,
    engine: Box<dyn ExpressionEngine + 'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(document: &'a Document, settings: &'a Settings, options: &InspectOptions) -> Self {
        let engine: Box<dyn ExpressionEngine + 'a> = match document.expression_mode() {
            ExpressionMode::Script => Box::new(ScriptEngine::new(options.script_engine.clone())),
            ExpressionMode::Restricted => Box::new(PathWalkEngine),
        };
        Self::with_engine(document, settings, engine)
    }

    /// Builds an evaluator around an explicit strategy.
    pub fn with_engine(document: &'a Document, settings: &'a Settings, engine: Box<dyn ExpressionEngine + 'a>) -> Self {
        Self {
            scope: EvaluationScope::new(document, settings),
            engine,
        }
    }

    /// Evaluates the expression embedded in `template`.
    ///
    /// Templates without an expression resolve to themselves; unresolvable
    /// expressions yield the whole template as [`Evaluated::Unresolved`].
    pub fn evaluate(&self, template: &str) -> Result<Evaluated> {
        let Some(expression) = find_expression(template) else {
            return Ok(Evaluated::Resolved(Value::String(template.to_string())));
        };
        match self.engine.evaluate(&expression, &self.scope)? {
            Evaluated::Resolved(value) if expression.is_standalone() => Ok(Evaluated::Resolved(value)),
            Evaluated::Resolved(value) => Ok(Evaluated::Resolved(Value::String(format!(
                "{}{}{}",
                expression.prefix,
                format_json_value(&value),
                expression.suffix
            )))),
            Evaluated::Unresolved(_) => Ok(Evaluated::Unresolved(template.to_string())),
        }
    }

    /// Evaluates `template`, falling back to the template text when unresolved.
    pub fn instantiate(&self, template: &str) -> Result<Value> {
        Ok(match self.evaluate(template)? {
            Evaluated::Resolved(value) => value,
            Evaluated::Unresolved(original) => Value::String(original),
        })
    }
}
