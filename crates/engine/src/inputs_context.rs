//! Construction of the `inputs` object visible to expressions.
//!
//! Each declared input that received a value contributes one entry. `File`
//! and `Directory` values are expanded into records describing the referenced
//! path; filesystem metadata is added only when the path exists, and a missing
//! or unreadable path never fails the query.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use cwl_inspector_types::declaration_type;
use cwl_inspector_util::{FileNameParts, format_json_value};
use serde_json::{Map, Value, json};
use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use crate::document::Document;
use crate::sections::SectionName;

/// Upper bound on the bytes exposed through a file's `contents` field.
pub const CONTENTS_PREVIEW_LIMIT: usize = 64 * 1024;

/// Builds the `inputs` context from the document's declarations and the
/// supplied argument values. Entries follow declaration order.
pub fn build_inputs_context(document: &Document, args: &Map<String, Value>) -> Map<String, Value> {
    let Some(Value::Object(declarations)) = document.section(SectionName::Inputs) else {
        return Map::new();
    };

    declarations
        .iter()
        .filter_map(|(id, declaration)| {
            let supplied = args.get(id)?;
            let parameter_type = declaration_type(declaration);
            let entry = match parameter_type.as_ref().map(|parameter_type| parameter_type.name()) {
                Some("File") => file_entry(supplied, declaration),
                Some("Directory") => directory_entry(supplied),
                _ if supplied.is_null() => declaration.clone(),
                _ => supplied.clone(),
            };
            Some((id.clone(), entry))
        })
        .collect()
}

/// Extracts the path a `File`/`Directory` value refers to.
///
/// Plain strings are paths; job-file records carry `path` or `location`.
pub fn reference_path(value: &Value) -> String {
    match value {
        Value::Object(record) => record
            .get("path")
            .or_else(|| record.get("location"))
            .map(format_json_value)
            .unwrap_or_default(),
        other => format_json_value(other),
    }
}

fn file_entry(supplied: &Value, declaration: &Value) -> Value {
    let reference = reference_path(supplied);
    let parts = FileNameParts::from_reference(&reference);
    let mut record = Map::new();
    record.insert("class".into(), json!("File"));
    record.insert("path".into(), json!(parts.path));
    record.insert("basename".into(), json!(parts.basename));
    record.insert("dirname".into(), json!(parts.dirname));
    record.insert("nameroot".into(), json!(parts.nameroot));
    record.insert("nameext".into(), json!(parts.nameext));

    if let Some(format) = declaration.get("format") {
        record.insert("format".into(), format.clone());
    }

    let file_path = Path::new(&reference);
    if file_path.is_file() {
        match file_metadata(file_path) {
            Ok(metadata) => {
                record.insert("checksum".into(), json!(metadata.checksum));
                record.insert("size".into(), json!(metadata.size));
                record.insert("contents".into(), json!(metadata.contents));
            }
            Err(error) => warn!(path = %reference, %error, "could not read input file; omitting metadata"),
        }
    } else {
        debug!(path = %reference, "input file does not exist; omitting metadata");
    }

    Value::Object(record)
}

struct FileMetadata {
    checksum: String,
    size: u64,
    contents: String,
}

/// Hashes the file as a stream and keeps only the leading preview bytes.
fn file_metadata(file_path: &Path) -> io::Result<FileMetadata> {
    let size = fs::metadata(file_path)?.len();

    let mut hasher = Sha1::new();
    io::copy(&mut File::open(file_path)?, &mut hasher)?;

    let mut preview = Vec::with_capacity(CONTENTS_PREVIEW_LIMIT);
    File::open(file_path)?.take(CONTENTS_PREVIEW_LIMIT as u64).read_to_end(&mut preview)?;

    Ok(FileMetadata {
        checksum: format!("sha1${}", hex::encode(hasher.finalize())),
        size,
        contents: String::from_utf8_lossy(&preview).into_owned(),
    })
}

fn directory_entry(supplied: &Value) -> Value {
    let reference = reference_path(supplied);
    let parts = FileNameParts::from_reference(&reference);
    let mut record = Map::new();
    record.insert("class".into(), json!("Directory"));
    record.insert("path".into(), json!(parts.path));
    record.insert("basename".into(), json!(parts.basename));

    let directory_path = Path::new(&reference);
    if directory_path.is_dir() {
        match list_directory(directory_path) {
            Ok(listing) => {
                record.insert("listing".into(), json!(listing));
            }
            Err(error) => warn!(path = %reference, %error, "could not list input directory; omitting listing"),
        }
    }

    Value::Object(record)
}

fn list_directory(directory_path: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(directory_path)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if !name.chars().all(|character| character == '.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
