//! Structured validation failures
//!
//! The service reports request-validation failures as a `detail` array where
//! each entry carries the offending field path and a message. Those are kept
//! per-field all the way to presentation; flattening them into one opaque
//! string loses the only information the user can act on.

use serde::{Deserialize, Serialize};

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Dotted path of the offending field, e.g. `password`
    pub field: String,
    /// Human-readable message for that field
    pub message: String,
}

/// Wire shape of a validation failure response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationPayload {
    /// Raw per-field entries as the service sends them
    pub detail: Vec<RawViolation>,
}

/// One raw entry of the `detail` array.
#[derive(Debug, Clone, Deserialize)]
pub struct RawViolation {
    /// Field path segments; the leading segment names the request part
    /// (`body`, `query`) and is dropped when rendering
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    /// Message for this entry
    pub msg: String,
}

impl ValidationPayload {
    /// Flatten the wire payload into per-field violations.
    pub fn violations(&self) -> Vec<FieldViolation> {
        self.detail
            .iter()
            .map(|raw| FieldViolation {
                field: field_path(&raw.loc),
                message: raw.msg.clone(),
            })
            .collect()
    }
}

/// Join location segments into a dotted path, dropping the request-part
/// prefix the service prepends.
fn field_path(loc: &[serde_json::Value]) -> String {
    let segments: Vec<String> = loc
        .iter()
        .map(|segment| match segment {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    let trimmed: &[String] = match segments.first().map(String::as_str) {
        Some("body") | Some("query") | Some("path") if segments.len() > 1 => {
            &segments[1..]
        }
        _ => &segments[..],
    };

    if trimmed.is_empty() {
        "request".to_string()
    } else {
        trimmed.join(".")
    }
}
