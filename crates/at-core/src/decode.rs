//! Content decoding for inbound webhook bodies.
//!
//! The decoding strategy is picked from the declared content type. The set of
//! strategies is closed: JSON objects, URL-encoded forms, and everything else
//! as one opaque text field named [`TEXT_FIELD`].

use serde_json::Value;

/// Field name mapping produced by decoding.
pub type FieldMap = serde_json::Map<String, Value>;

/// Synthetic field holding an opaque (non JSON, non form) body.
pub const TEXT_FIELD: &str = "content";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),
    #[error("JSON body must be an object, got {0}")]
    NotAnObject(&'static str),
    #[error("invalid form body: {0}")]
    InvalidForm(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    Form,
    Text,
}

impl BodyEncoding {
    /// Select a strategy from a `Content-Type` value. Parameters such as
    /// `; charset=utf-8` are ignored and the media type is compared without
    /// regard to case.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let media_type = content_type
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .unwrap_or_default();
        if media_type.eq_ignore_ascii_case("application/json") {
            Self::Json
        } else if media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Self::Form
        } else {
            Self::Text
        }
    }
}

/// Decode `body` according to its declared content type.
pub fn decode(content_type: Option<&str>, body: &[u8]) -> Result<FieldMap, DecodeError> {
    decode_body(BodyEncoding::from_content_type(content_type), body)
}

pub fn decode_body(encoding: BodyEncoding, body: &[u8]) -> Result<FieldMap, DecodeError> {
    match encoding {
        BodyEncoding::Json => {
            if body.is_empty() {
                return Ok(FieldMap::new());
            }
            match serde_json::from_slice::<Value>(body) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(DecodeError::NotAnObject(json_kind(&other))),
                Err(e) => Err(DecodeError::InvalidJson(e.to_string())),
            }
        }
        BodyEncoding::Form => {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
                .map_err(|e| DecodeError::InvalidForm(e.to_string()))?;
            Ok(first_wins(pairs))
        }
        BodyEncoding::Text => {
            let mut fields = FieldMap::new();
            fields.insert(
                TEXT_FIELD.to_string(),
                Value::String(String::from_utf8_lossy(body).into_owned()),
            );
            Ok(fields)
        }
    }
}

/// Decode a raw query string (without the leading `?`).
pub fn parse_query(query: Option<&str>) -> Result<FieldMap, DecodeError> {
    match query {
        None | Some("") => Ok(FieldMap::new()),
        Some(q) => {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_str(q)
                .map_err(|e| DecodeError::InvalidForm(e.to_string()))?;
            Ok(first_wins(pairs))
        }
    }
}

/// Render a decoded value as text. JSON strings are taken verbatim, numbers and
/// booleans are stringified. `null`, arrays and objects have no text form.
pub fn field_text(fields: &FieldMap, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whether a decoded field holds an array or object rather than a single value.
pub fn is_structured(fields: &FieldMap, name: &str) -> bool {
    matches!(fields.get(name), Some(Value::Array(_) | Value::Object(_)))
}

fn first_wins(pairs: Vec<(String, String)>) -> FieldMap {
    let mut fields = FieldMap::new();
    for (key, value) in pairs {
        fields.entry(key).or_insert(Value::String(value));
    }
    fields
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
