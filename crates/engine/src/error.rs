//! Error types for query evaluation.

use thiserror::Error;

/// Failure of a query. Every variant is fatal to the query that raised it.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("No such field {path}")]
    NoSuchField { path: String },

    #[error("Duplicated index {index} in {path}")]
    DuplicatedIndex { index: i64, path: String },

    #[error("Unknown query: {query}")]
    UnknownQuery { query: String },

    #[error("Unsupported output {path}: {reason}")]
    UnsupportedOutput { path: String, reason: String },

    #[error("{query} requires a {expected} document, but the document is a {found}")]
    ClassMismatch { query: String, expected: String, found: String },

    #[error("{path} is not a mapping")]
    NotAMapping { path: String },

    #[error("Invalid binding at {path}: {source}")]
    InvalidBinding {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid context in expression {expression}")]
    InvalidContext { expression: String },

    #[error("Script engine error: {message}")]
    Collaborator { message: String },

    #[error("File not found: {reference} defined in step {step}")]
    RunNotFound { reference: String, step: String },

    #[error("Failed to parse {origin}: {source}")]
    Load {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{origin} contains no document")]
    EmptyDocument { origin: String },

    #[error("Failed to read {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },
}

impl InspectError {
    pub fn no_such_field(path: impl Into<String>) -> Self {
        Self::NoSuchField { path: path.into() }
    }

    pub fn unsupported_output(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedOutput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn class_mismatch(query: impl Into<String>, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ClassMismatch {
            query: query.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator { message: message.into() }
    }
}

pub type Result<T, E = InspectError> = std::result::Result<T, E>;
