//! Collection of input parameter values from the command line or a params file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

/// Builds the argument map from inline parameters or a params file.
///
/// The two sources are exclusive; supplying neither yields an empty map.
pub fn collect_args(inline: &[String], params_file: Option<&Path>) -> Result<Map<String, Value>> {
    match (params_file, inline.is_empty()) {
        (Some(_), false) => bail!("-i <params-file> and inline parameters are exclusive"),
        (Some(path), true) => load_params_file(path),
        (None, _) => parse_inline(inline),
    }
}

/// Parses `name=value`, `--name=value`, and `--name value` tokens.
///
/// Tokens are split on their first `=` and the pieces paired in order, so the
/// forms may be mixed freely.
pub fn parse_inline(tokens: &[String]) -> Result<Map<String, Value>> {
    let pieces: Vec<&str> = tokens
        .iter()
        .flat_map(|token| match token.split_once('=') {
            Some((name, value)) => vec![name, value],
            None => vec![token.as_str()],
        })
        .collect();

    if pieces.len() % 2 != 0 {
        bail!("invalid parameters: {}", tokens.join(" "));
    }

    Ok(pieces
        .chunks(2)
        .map(|pair| {
            let name = pair[0].strip_prefix("--").unwrap_or(pair[0]);
            (name.to_string(), Value::String(pair[1].to_string()))
        })
        .collect())
}

/// Reads a YAML (or JSON) mapping of parameter values. An empty file yields no values.
pub fn load_params_file(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path).with_context(|| format!("failed to read params file {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    let parsed: Value = serde_yaml::from_str(&content).with_context(|| format!("failed to parse params file {}", path.display()))?;
    match parsed {
        Value::Object(entries) => Ok(entries),
        Value::Null => Ok(Map::new()),
        _ => bail!("params file {} must contain a mapping", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn inline_forms_can_be_mixed() {
        let args = parse_inline(&tokens(&["input=Hello!", "--count=3", "--name", "sample"])).expect("args");
        assert_eq!(args["input"], "Hello!");
        assert_eq!(args["count"], "3");
        assert_eq!(args["name"], "sample");
    }

    #[test]
    fn value_may_contain_equals() {
        let args = parse_inline(&tokens(&["expr=a=b"])).expect("args");
        assert_eq!(args["expr"], "a=b");
    }

    #[test]
    fn odd_token_count_is_rejected() {
        assert!(parse_inline(&tokens(&["--name"])).is_err());
    }

    #[test]
    fn params_file_is_loaded() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("job.yml");
        fs::write(&path, "input: Hello!\nreads:\n  class: File\n  path: a.fq\n").expect("write");

        let args = collect_args(&[], Some(&path)).expect("args");
        assert_eq!(args["input"], "Hello!");
        assert_eq!(args["reads"], json!({"class": "File", "path": "a.fq"}));
    }

    #[test]
    fn empty_params_file_has_no_values() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("job.yml");
        fs::write(&path, "").expect("write");
        assert!(load_params_file(&path).expect("args").is_empty());
    }

    #[test]
    fn non_mapping_params_file_is_rejected() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("job.yml");
        fs::write(&path, "- a\n- b\n").expect("write");
        assert!(load_params_file(&path).is_err());
    }

    #[test]
    fn sources_are_exclusive() {
        let error = collect_args(&tokens(&["a=b"]), Some(Path::new("job.yml"))).expect_err("exclusive");
        assert!(error.to_string().contains("exclusive"));
    }

    #[test]
    fn no_parameters_is_empty() {
        assert!(collect_args(&[], None).expect("args").is_empty());
    }
}
