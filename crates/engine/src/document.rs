//! Loading of tool and workflow documents.
//!
//! A [`Document`] owns the parsed tree together with the facts derived once per
//! load: the directory sub-documents are resolved against, the expression
//! mode selected by the document's requirements, and the memoized id-indexed
//! form of its top-level sections. The tree itself is never mutated.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use cwl_inspector_types::{INLINE_JAVASCRIPT_REQUIREMENT, find_class_entry};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{InspectError, Result};
use crate::resolve::ExpressionMode;
use crate::sections::{SectionName, index_by_id};

/// A parsed document plus the facts derived from it at load time.
pub struct Document {
    tree: Value,
    base_dir: PathBuf,
    expression_mode: ExpressionMode,
    indexed_sections: [OnceCell<Option<Value>>; 3],
}

impl Document {
    /// Wraps an already parsed tree. `base_dir` anchors sibling lookups.
    pub fn from_value(tree: Value, base_dir: impl Into<PathBuf>) -> Self {
        let expression_mode = detect_expression_mode(&tree);
        Self {
            tree,
            base_dir: base_dir.into(),
            expression_mode,
            indexed_sections: Default::default(),
        }
    }

    /// Parses YAML (or JSON) text. Only the first document of a stream is used.
    pub fn from_yaml_str(content: &str, origin: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let first_document = serde_yaml::Deserializer::from_str(content)
            .next()
            .ok_or_else(|| InspectError::EmptyDocument { origin: origin.to_string() })?;
        let tree = Value::deserialize(first_document).map_err(|source| InspectError::Load {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Self::from_value(tree, base_dir))
    }

    /// Loads a document file, anchoring sibling lookups at its directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        debug!(path = %origin, "loading document");
        let content = fs::read_to_string(path).map_err(|source| InspectError::Io {
            origin: origin.clone(),
            source,
        })?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::from_yaml_str(&content, &origin, base_dir)
    }

    /// Loads a document from a stream such as standard input.
    pub fn from_reader(mut reader: impl Read, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content).map_err(|source| InspectError::Io {
            origin: "<stdin>".to_string(),
            source,
        })?;
        Self::from_yaml_str(&content, "<stdin>", base_dir)
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn expression_mode(&self) -> ExpressionMode {
        self.expression_mode
    }

    /// Id-indexed form of a top-level section, computed on first access.
    pub fn section(&self, name: SectionName) -> Option<&Value> {
        self.indexed_sections[name.slot()]
            .get_or_init(|| self.tree.get(name.key()).map(index_by_id))
            .as_ref()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("base_dir", &self.base_dir)
            .field("expression_mode", &self.expression_mode)
            .finish_non_exhaustive()
    }
}

fn detect_expression_mode(tree: &Value) -> ExpressionMode {
    let declares_script_support = tree
        .get("requirements")
        .and_then(|requirements| find_class_entry(requirements, INLINE_JAVASCRIPT_REQUIREMENT))
        .is_some();
    if declares_script_support {
        ExpressionMode::Script
    } else {
        ExpressionMode::Restricted
    }
}

/// Strategy for finding the file a workflow step's `run` field refers to.
pub trait DocumentLocator {
    fn locate(&self, reference: &str, base_dir: &Path) -> Option<PathBuf>;
}

/// Looks for the referenced file next to the referring document only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiblingFileLocator;

impl DocumentLocator for SiblingFileLocator {
    fn locate(&self, reference: &str, base_dir: &Path) -> Option<PathBuf> {
        let candidate = base_dir.join(reference);
        candidate.exists().then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_key_order_is_preserved() {
        let document = Document::from_yaml_str("class: CommandLineTool\ncwlVersion: v1.0\nid: echo\n", "inline", ".").expect("document");
        let keys: Vec<&String> = document.tree().as_object().expect("object").keys().collect();
        assert_eq!(keys, ["class", "cwlVersion", "id"]);
    }

    #[test]
    fn only_first_document_of_stream_is_used() {
        let document = Document::from_reader("class: Workflow\n---\nclass: CommandLineTool\n".as_bytes(), ".").expect("document");
        assert_eq!(document.tree()["class"], "Workflow");
    }

    #[test]
    fn empty_stream_is_rejected() {
        let error = Document::from_yaml_str("", "empty.cwl", ".").expect_err("empty");
        assert!(matches!(error, InspectError::EmptyDocument { .. }));
    }

    #[test]
    fn inline_javascript_requirement_selects_script_mode() {
        let scripted = Document::from_value(json!({"requirements": [{"class": "InlineJavascriptRequirement"}]}), ".");
        assert_eq!(scripted.expression_mode(), ExpressionMode::Script);

        let hinted = Document::from_value(json!({"hints": [{"class": "InlineJavascriptRequirement"}]}), ".");
        assert_eq!(hinted.expression_mode(), ExpressionMode::Restricted);
    }

    #[test]
    fn sections_are_indexed_once_and_tree_is_untouched() {
        let tree = json!({"inputs": [{"id": "a"}, {"id": "b"}]});
        let document = Document::from_value(tree.clone(), ".");
        let first = document.section(SectionName::Inputs).expect("inputs") as *const Value;
        let second = document.section(SectionName::Inputs).expect("inputs") as *const Value;
        assert_eq!(first, second);
        assert!(document.section(SectionName::Steps).is_none());
        assert_eq!(document.tree(), &tree);
    }

    #[test]
    fn from_path_anchors_at_parent_directory() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("tool.cwl");
        fs::write(&path, "class: CommandLineTool\n").expect("write");
        let document = Document::from_path(&path).expect("document");
        assert_eq!(document.base_dir(), directory.path());
    }

    #[test]
    fn sibling_locator_only_checks_base_directory() {
        let directory = tempfile::tempdir().expect("tempdir");
        fs::write(directory.path().join("step.cwl"), "class: CommandLineTool\n").expect("write");
        let locator = SiblingFileLocator;
        assert_eq!(locator.locate("step.cwl", directory.path()), Some(directory.path().join("step.cwl")));
        assert_eq!(locator.locate("missing.cwl", directory.path()), None);
    }
}
