use serde::Serialize;
use serde_json::{Map, Value};

const TRUNCATED: &str = "[truncated]";
const REDACTED: &str = "***";

/// JSON of `request` for the audit trail.
///
/// Objects and arrays nested deeper than `max_depth` (the top level is
/// depth 1) are replaced with a `"[truncated]"` marker, and values under
/// any key listed in `redacted` (case-insensitive) with `"***"`. A request
/// that fails to serialize yields an `{"error": ...}` document instead.
pub fn audit_payload<R: Serialize>(request: &R, max_depth: usize, redacted: &[String]) -> String {
    let value = match serde_json::to_value(request) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to serialize request for audit log");
            return serde_json::json!({ "error": format!("Failed to serialize request: {err}") })
                .to_string();
        }
    };

    prune(value, 1, max_depth.max(1), redacted).to_string()
}

fn prune(value: Value, depth: usize, max_depth: usize, redacted: &[String]) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) if depth > max_depth => Value::String(TRUNCATED.into()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| {
                    let v = if is_redacted(&key, redacted) {
                        Value::String(REDACTED.into())
                    } else {
                        prune(v, depth + 1, max_depth, redacted)
                    };
                    (key, v)
                })
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| prune(v, depth + 1, max_depth, redacted))
                .collect(),
        ),
        scalar => scalar,
    }
}

fn is_redacted(key: &str, redacted: &[String]) -> bool {
    redacted.iter().any(|r| r.eq_ignore_ascii_case(key))
}
