//! Resolution of dotted field paths against a document tree.
//!
//! Paths start at the root (`.`) and are consumed one segment at a time:
//!
//! - `inputs`, `outputs`, `steps` read the section in its id-keyed form
//! - `baseCommand` wraps a scalar command into a one-element sequence
//! - an unsigned integer indexes a sequence, or on a mapping selects the unique
//!   entry whose `inputBinding.position` (default 0) equals it
//! - anything else is plain field access
//!
//! Every failure carries the full offending path. Callers that treat a section
//! as optional use [`fetch_or`] to substitute a default instead.

use std::borrow::Cow;

use cwl_inspector_types::CommandLineBinding;
use serde_json::{Map, Value};
use tracing::trace;

use crate::document::Document;
use crate::error::{InspectError, Result};
use crate::sections::{SectionName, index_by_id};

/// One segment of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Section(SectionName),
    BaseCommand,
    Index(usize),
    Field(&'a str),
}

impl<'a> PathSegment<'a> {
    fn parse(segment: &'a str) -> Self {
        if let Some(section) = SectionName::parse(segment) {
            return Self::Section(section);
        }
        if segment == "baseCommand" {
            return Self::BaseCommand;
        }
        if !segment.is_empty()
            && segment.bytes().all(|byte| byte.is_ascii_digit())
            && let Ok(index) = segment.parse::<usize>()
        {
            return Self::Index(index);
        }
        Self::Field(segment)
    }
}

/// Splits a root-anchored path into segments. `.` alone addresses the root.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment<'_>>> {
    let relative = path.strip_prefix('.').ok_or_else(|| InspectError::no_such_field(path))?;
    if relative.is_empty() {
        return Ok(Vec::new());
    }
    Ok(relative.split('.').map(PathSegment::parse).collect())
}

/// Resolves `path` against the document, returning a copy of the addressed node.
pub fn resolve(document: &Document, path: &str) -> Result<Value> {
    let segments = parse_path(path)?;
    let mut current: Cow<'_, Value> = Cow::Borrowed(document.tree());

    for (depth, segment) in segments.iter().enumerate() {
        if depth == 0
            && let PathSegment::Section(section) = segment
        {
            let indexed = document.section(*section).ok_or_else(|| InspectError::no_such_field(path))?;
            current = Cow::Borrowed(indexed);
            continue;
        }

        current = match current {
            Cow::Borrowed(node) => step_into(node, segment, path)?,
            Cow::Owned(node) => Cow::Owned(step_into(&node, segment, path)?.into_owned()),
        };
    }

    Ok(current.into_owned())
}

/// Resolves `path`, substituting `default` for any resolution failure.
pub fn fetch_or(document: &Document, path: &str, default: Value) -> Value {
    match resolve(document, path) {
        Ok(value) => value,
        Err(error) => {
            trace!(path, %error, "optional path absent, using default");
            default
        }
    }
}

fn step_into<'a>(node: &'a Value, segment: &PathSegment<'_>, path: &str) -> Result<Cow<'a, Value>> {
    match segment {
        PathSegment::Section(section) => {
            let raw = node.get(section.key()).ok_or_else(|| InspectError::no_such_field(path))?;
            Ok(Cow::Owned(index_by_id(raw)))
        }
        PathSegment::BaseCommand => {
            let raw = node.get("baseCommand").ok_or_else(|| InspectError::no_such_field(path))?;
            match raw {
                Value::Array(_) => Ok(Cow::Borrowed(raw)),
                scalar => Ok(Cow::Owned(Value::Array(vec![scalar.clone()]))),
            }
        }
        PathSegment::Index(index) => match node {
            Value::Array(entries) => entries
                .get(*index)
                .map(Cow::Borrowed)
                .ok_or_else(|| InspectError::no_such_field(path)),
            Value::Object(entries) => select_by_position(entries, *index as i64, path).map(Cow::Borrowed),
            _ => Err(InspectError::no_such_field(path)),
        },
        PathSegment::Field(name) => node
            .as_object()
            .and_then(|entries| entries.get(*name))
            .map(Cow::Borrowed)
            .ok_or_else(|| InspectError::no_such_field(path)),
    }
}

/// Effective command-line position of a parameter declaration, read through
/// the same binding model the command-line synthesizer uses.
pub fn binding_position(id: &str, declaration: &Value) -> Result<i64> {
    let Some(raw_binding) = declaration.get("inputBinding") else {
        return Ok(0);
    };
    CommandLineBinding::from_value(raw_binding)
        .map(|binding| binding.effective_position())
        .map_err(|source| InspectError::InvalidBinding {
            path: format!("{id}.inputBinding"),
            source,
        })
}

fn select_by_position<'a>(declarations: &'a Map<String, Value>, position: i64, path: &str) -> Result<&'a Value> {
    let mut candidates = Vec::new();
    for (id, declaration) in declarations {
        if binding_position(id, declaration)? == position {
            candidates.push(declaration);
        }
    }
    match candidates.as_slice() {
        [] => Err(InspectError::no_such_field(path)),
        [declaration] => Ok(declaration),
        _ => Err(InspectError::DuplicatedIndex {
            index: position,
            path: path.to_string(),
        }),
    }
}
