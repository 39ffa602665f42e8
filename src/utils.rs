// Small helpers shared by handlers

use serde_json::Value;

/// Parse `text` as JSON when possible, otherwise keep it as a JSON string.
///
/// Provider replies are free text, but some models answer with a JSON
/// document; those are returned to clients as structured values.
pub fn jsonify(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
