use serde_json::Value;

/// Formats a JSON value as a single command-line or template token.
///
/// - **Strings**: returned as-is
/// - **Numbers** and **booleans**: their literal representation
/// - **Null**: empty string
/// - **Objects/Arrays**: compact JSON
pub fn format_json_value(value: &Value) -> String {
    match value {
        Value::String(string_value) => string_value.clone(),
        Value::Number(number_value) => number_value.to_string(),
        Value::Bool(boolean_value) => boolean_value.to_string(),
        Value::Null => String::new(),
        other_value => other_value.to_string(),
    }
}
