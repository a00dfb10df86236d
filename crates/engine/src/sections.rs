//! Id-indexing of the `inputs`, `outputs`, and `steps` sections.
//!
//! A section may be authored as a sequence of records carrying an `id`, or as
//! a mapping already keyed by id. Queries always see the mapping form; the
//! transform is pure and the document memoizes its result for top-level
//! sections.

use serde_json::{Map, Value};
use tracing::warn;

/// Sections that are reinterpreted as id-keyed mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionName {
    Inputs,
    Outputs,
    Steps,
}

impl SectionName {
    pub const ALL: [SectionName; 3] = [SectionName::Inputs, SectionName::Outputs, SectionName::Steps];

    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "inputs" => Some(Self::Inputs),
            "outputs" => Some(Self::Outputs),
            "steps" => Some(Self::Steps),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Inputs => "inputs",
            Self::Outputs => "outputs",
            Self::Steps => "steps",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Self::Inputs => 0,
            Self::Outputs => 1,
            Self::Steps => 2,
        }
    }
}

/// Authored shape of a section.
#[derive(Debug, Clone, Copy)]
pub enum SectionShape<'a> {
    RawSequence(&'a [Value]),
    IdMap(&'a Map<String, Value>),
    Other(&'a Value),
}

impl<'a> SectionShape<'a> {
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Array(entries) => Self::RawSequence(entries),
            Value::Object(entries) => Self::IdMap(entries),
            other => Self::Other(other),
        }
    }
}

/// Returns the id-keyed form of a section.
///
/// Sequence entries are keyed by their `id`; a later entry with the same id
/// replaces an earlier one. Entries without a string `id` cannot be addressed
/// and are skipped.
pub fn index_by_id(section: &Value) -> Value {
    match SectionShape::of(section) {
        SectionShape::RawSequence(entries) => {
            let mut indexed = Map::new();
            for entry in entries {
                match entry.get("id").and_then(Value::as_str) {
                    Some(id) => {
                        if indexed.insert(id.to_string(), entry.clone()).is_some() {
                            warn!(id, "duplicate id in section; the later entry wins");
                        }
                    }
                    None => warn!("skipping section entry without an id"),
                }
            }
            Value::Object(indexed)
        }
        SectionShape::IdMap(_) | SectionShape::Other(_) => section.clone(),
    }
}
