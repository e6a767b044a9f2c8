use serde_json::Value as JsonValue;

use crate::error::AppResult;

/// Strips image payloads and personal details from JSON before it is
/// logged. Image base64 would otherwise dominate the log files.
pub fn redact_sensitive_data(data: &JsonValue) -> AppResult<JsonValue> {
    Ok(redact_value(data))
}

fn redact_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut redacted_map = serde_json::Map::new();
            for (key, val) in map {
                let redacted_val = if is_sensitive_field(key) {
                    redact_string_value(val)
                } else {
                    redact_value(val)
                };
                redacted_map.insert(key.clone(), redacted_val);
            }
            JsonValue::Object(redacted_map)
        }
        JsonValue::Array(arr) => JsonValue::Array(arr.iter().map(redact_value).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_field(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    matches!(
        lower.as_str(),
        "filebase64" | "file_base64" | "data" | "name" | "schoolid" | "school_id" | "description"
    )
}

fn redact_string_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) if !s.is_empty() => JsonValue::String("[REDACTED]".to_string()),
        _ => value.clone(),
    }
}
