//! Typed views over the parts of a tool description the engine interprets.
//!
//! Only the records that drive command-line rendering are modelled here.
//! Everything else stays as raw JSON so that path queries can reach it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Requirement class that wraps the tool invocation in a container.
pub const DOCKER_REQUIREMENT: &str = "DockerRequirement";

/// Requirement class that enables full-script expression evaluation.
pub const INLINE_JAVASCRIPT_REQUIREMENT: &str = "InlineJavascriptRequirement";

/// Binding metadata controlling how a parameter appears on the command line.
///
/// Entries of `arguments` are bindings themselves; input parameters carry
/// theirs under `inputBinding`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommandLineBinding {
    /// Sort key among positional parameters.
    #[serde(default)]
    pub position: Option<i64>,
    /// Literal token emitted before the value.
    #[serde(default)]
    pub prefix: Option<String>,
    /// When false, prefix and value are concatenated into one token.
    #[serde(default)]
    pub separate: Option<bool>,
    /// Separator used to join array values.
    #[serde(default)]
    pub item_separator: Option<String>,
    /// Template evaluated to produce the value.
    #[serde(default)]
    pub value_from: Option<String>,
}

impl CommandLineBinding {
    /// Reads a binding from a raw record. `null` yields the default binding.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
    }

    /// Declared position, defaulting to 0.
    pub fn effective_position(&self) -> i64 {
        self.position.unwrap_or(0)
    }

    pub fn separate(&self) -> bool {
        self.separate.unwrap_or(true)
    }

    pub fn item_separator(&self) -> &str {
        self.item_separator.as_deref().unwrap_or(" ")
    }
}

/// Declared type of an input or output parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterType {
    name: String,
    optional: bool,
}

impl ParameterType {
    /// Parses the shorthand type notation, where a trailing `?` marks optionality.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.strip_suffix('?') {
            Some(name) => Self {
                name: name.to_string(),
                optional: true,
            },
            None => Self {
                name: trimmed.to_string(),
                optional: false,
            },
        }
    }

    /// Reads a type from its raw form: a string, a union sequence, or a
    /// record such as `{type: array, items: File}`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => Some(Self::parse(raw)),
            Value::Array(members) => {
                let optional = members.iter().any(|member| member.as_str() == Some("null"));
                let mut named = members
                    .iter()
                    .filter(|member| member.as_str() != Some("null"))
                    .filter_map(Self::from_value);
                let first = named.next()?;
                Some(Self {
                    name: first.name,
                    optional: optional || first.optional,
                })
            }
            Value::Object(record) => record.get("type").and_then(Self::from_value),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns true when the underlying type name equals `name`, ignoring optionality.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Reads the declared type of a parameter declaration.
///
/// Declarations may be full records (`{type: File, ...}`) or the bare type
/// shorthand (`File?`).
pub fn declaration_type(declaration: &Value) -> Option<ParameterType> {
    match declaration {
        Value::Object(record) => record.get("type").and_then(ParameterType::from_value),
        other => ParameterType::from_value(other),
    }
}

/// Finds the entry for `class` in a `requirements` or `hints` section.
///
/// Both the list form (`- class: DockerRequirement`) and the mapping form
/// keyed by class name are accepted.
pub fn find_class_entry<'a>(section: &'a Value, class: &str) -> Option<&'a Value> {
    match section {
        Value::Array(entries) => entries
            .iter()
            .find(|entry| entry.get("class").and_then(Value::as_str) == Some(class)),
        Value::Object(entries) => entries.get(class),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn binding_defaults_follow_format_rules() {
        let binding = CommandLineBinding::from_value(&json!({"prefix": "-o"})).expect("binding");
        assert_eq!(binding.effective_position(), 0);
        assert!(binding.separate());
        assert_eq!(binding.item_separator(), " ");
        assert_eq!(binding.prefix.as_deref(), Some("-o"));
    }

    #[test]
    fn binding_reads_camel_case_fields() {
        let binding = CommandLineBinding::from_value(&json!({
            "position": 3,
            "separate": false,
            "itemSeparator": ",",
            "valueFrom": "$(inputs.name)"
        }))
        .expect("binding");
        assert_eq!(binding.effective_position(), 3);
        assert!(!binding.separate());
        assert_eq!(binding.item_separator(), ",");
        assert_eq!(binding.value_from.as_deref(), Some("$(inputs.name)"));
    }

    #[test]
    fn null_binding_is_default() {
        assert_eq!(CommandLineBinding::from_value(&Value::Null).expect("binding"), CommandLineBinding::default());
    }

    #[test]
    fn parameter_type_shorthand_and_unions() {
        let optional = ParameterType::parse("File?");
        assert!(optional.is("File"));
        assert!(optional.is_optional());

        let required = ParameterType::parse("string");
        assert!(!required.is_optional());

        let union = ParameterType::from_value(&json!(["null", "Directory"])).expect("union");
        assert!(union.is("Directory"));
        assert!(union.is_optional());

        let array = ParameterType::from_value(&json!({"type": "array", "items": "File"})).expect("array");
        assert!(array.is("array"));
        assert!(!array.is_optional());
    }

    #[test]
    fn declaration_type_accepts_records_and_shorthand() {
        assert!(declaration_type(&json!({"type": "File", "label": "x"})).expect("record").is("File"));
        assert!(declaration_type(&json!("int?")).expect("shorthand").is_optional());
        assert!(declaration_type(&json!({"label": "untyped"})).is_none());
    }

    #[test]
    fn find_class_entry_supports_list_and_map_forms() {
        let listed = json!([{"class": "InlineJavascriptRequirement"}, {"class": "DockerRequirement", "dockerPull": "alpine"}]);
        let keyed = json!({"DockerRequirement": {"dockerPull": "alpine"}});

        assert_eq!(
            find_class_entry(&listed, DOCKER_REQUIREMENT).and_then(|entry| entry.get("dockerPull")),
            Some(&json!("alpine"))
        );
        assert_eq!(
            find_class_entry(&keyed, DOCKER_REQUIREMENT).and_then(|entry| entry.get("dockerPull")),
            Some(&json!("alpine"))
        );
        assert!(find_class_entry(&listed, "ShellCommandRequirement").is_none());
    }

    #[test]
    fn yaml_bindings_deserialize() {
        let raw: Value = serde_yaml::from_str("position: 1\nprefix: --name\n").expect("yaml");
        let binding = CommandLineBinding::from_value(&raw).expect("binding");
        assert_eq!(binding.effective_position(), 1);
        assert_eq!(binding.prefix.as_deref(), Some("--name"));
    }
}
