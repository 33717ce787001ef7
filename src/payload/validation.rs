use super::{FieldKind, FieldValue, Location, Rgb, Scoreboard};
use serde_json::Value;
use std::fmt;

/// Reasons a feed payload is refused
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Payload is not decodable at all (bad JSON, bad UTF-8)
    Malformed(String),
    /// Decodable, but wrong arity, element type, or out of range
    ShapeOrRange(String),
    /// Score mapping containing a non-numeric value
    MixedTypes { key: String },
}

impl ValidationError {
    /// Short stable label, used as a metrics key
    pub fn label(&self) -> &'static str {
        match self {
            ValidationError::Malformed(_) => "malformed",
            ValidationError::ShapeOrRange(_) => "shape_or_range",
            ValidationError::MixedTypes { .. } => "mixed_types",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Malformed(reason) => write!(f, "malformed payload: {}", reason),
            ValidationError::ShapeOrRange(reason) => {
                write!(f, "payload has wrong shape or range: {}", reason)
            }
            ValidationError::MixedTypes { key } => {
                write!(f, "score mapping has non-numeric value for '{}'", key)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates a raw feed payload for `kind`.
///
/// Display names are taken as raw UTF-8 text; every other field must decode
/// as JSON first.
pub fn validate(kind: FieldKind, raw: &[u8]) -> Result<FieldValue, ValidationError> {
    if kind == FieldKind::DisplayName {
        let text = std::str::from_utf8(raw)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        return Ok(FieldValue::DisplayName(display_name(text)));
    }

    validate_value(kind, &decode(raw)?)
}

/// Validates a raw score mapping outside any building (league totals).
pub fn validate_scores(raw: &[u8]) -> Result<Scoreboard, ValidationError> {
    scoreboard(&decode(raw)?)
}

fn decode(raw: &[u8]) -> Result<Value, ValidationError> {
    serde_json::from_slice(raw).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Validates an already-decoded payload for `kind`.
///
/// A JSON string is accepted as a display name; any other JSON value for
/// `DisplayName` is a shape error.
pub fn validate_value(kind: FieldKind, value: &Value) -> Result<FieldValue, ValidationError> {
    match kind {
        FieldKind::Location => location(value).map(FieldValue::Location),
        FieldKind::Color => color(value).map(FieldValue::Color),
        FieldKind::DisplayName => match value {
            Value::String(text) => Ok(FieldValue::DisplayName(display_name(text))),
            Value::Null => Ok(FieldValue::DisplayName(None)),
            other => Err(ValidationError::ShapeOrRange(format!(
                "expected text, got {}",
                type_name(other)
            ))),
        },
        FieldKind::TeamScores => scoreboard(value).map(FieldValue::TeamScores),
        FieldKind::UserScores => scoreboard(value).map(FieldValue::UserScores),
    }
}

/// Empty text means "no name", not an empty name.
fn display_name(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn location(value: &Value) -> Result<Location, ValidationError> {
    let items = fixed_array(value, 2)?;

    let lat = items[0].as_f64().ok_or_else(|| not_a_number(0, &items[0]))?;
    let lng = items[1].as_f64().ok_or_else(|| not_a_number(1, &items[1]))?;

    let location = Location { lat, lng };
    if !location.in_range() {
        return Err(ValidationError::ShapeOrRange(format!(
            "coordinate ({}, {}) outside [-90, 90] x [-180, 180]",
            lat, lng
        )));
    }

    Ok(location)
}

fn color(value: &Value) -> Result<Rgb, ValidationError> {
    let items = fixed_array(value, 3)?;

    let mut channels = [0u8; 3];
    for (index, item) in items.iter().enumerate() {
        let channel = item.as_u64().ok_or_else(|| {
            ValidationError::ShapeOrRange(format!(
                "color channel {} must be an integer, got {}",
                index, item
            ))
        })?;
        channels[index] = u8::try_from(channel).map_err(|_| {
            ValidationError::ShapeOrRange(format!(
                "color channel {} out of range 0-255: {}",
                index, channel
            ))
        })?;
    }

    Ok(Rgb::new(channels[0], channels[1], channels[2]))
}

fn scoreboard(value: &Value) -> Result<Scoreboard, ValidationError> {
    let object = value.as_object().ok_or_else(|| {
        ValidationError::ShapeOrRange(format!("expected an object, got {}", type_name(value)))
    })?;

    // Check every entry before building anything: one bad value rejects all.
    let mut entries = Vec::with_capacity(object.len());
    for (name, score) in object {
        let score = score
            .as_f64()
            .ok_or_else(|| ValidationError::MixedTypes { key: name.clone() })?;
        entries.push((name.as_str(), score));
    }

    Ok(entries.into_iter().collect())
}

fn fixed_array(value: &Value, len: usize) -> Result<&Vec<Value>, ValidationError> {
    let items = value.as_array().ok_or_else(|| {
        ValidationError::ShapeOrRange(format!("expected an array, got {}", type_name(value)))
    })?;

    if items.len() != len {
        return Err(ValidationError::ShapeOrRange(format!(
            "expected {} elements, got {}",
            len,
            items.len()
        )));
    }

    Ok(items)
}

fn not_a_number(index: usize, item: &Value) -> ValidationError {
    ValidationError::ShapeOrRange(format!(
        "coordinate {} must be a number, got {}",
        index,
        type_name(item)
    ))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_normalization() {
        assert_eq!(display_name(""), None);
        assert_eq!(display_name("Gregory Gym"), Some("Gregory Gym".to_string()));
        assert_eq!(display_name(" "), Some(" ".to_string()));
    }

    #[test]
    fn test_fixed_array_arity() {
        assert!(fixed_array(&json!([1, 2]), 2).is_ok());
        assert!(matches!(
            fixed_array(&json!([1, 2, 3]), 2),
            Err(ValidationError::ShapeOrRange(_))
        ));
        assert!(matches!(
            fixed_array(&json!({"a": 1}), 2),
            Err(ValidationError::ShapeOrRange(_))
        ));
    }

    #[test]
    fn test_error_labels() {
        assert_eq!(ValidationError::Malformed("x".into()).label(), "malformed");
        assert_eq!(
            ValidationError::ShapeOrRange("x".into()).label(),
            "shape_or_range"
        );
        assert_eq!(
            ValidationError::MixedTypes { key: "bob".into() }.label(),
            "mixed_types"
        );
    }
}
