//! Generic schema interpreter.
//!
//! Checks a raw argument bag (decoded JSON) against a [`ParamSchema`] and
//! produces the fully resolved argument map a handler may trust.
//!
//! Policy decisions, applied uniformly to every tool:
//! - Defaults fill *true absence* only. An explicitly supplied `null` for
//!   an optional field is preserved as `null`, never replaced.
//! - Unknown extra fields are ignored and dropped, not rejected.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{Field, FieldKind, ParamSchema, Presence};

/// A validation-layer rejection. Never crashes the process; surfaced to
/// the caller as an error response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("parameter '{field}' must be a {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("parameter '{field}' must be one of {allowed:?}")]
    InvalidEnumValue {
        field: String,
        allowed: &'static [&'static str],
    },

    #[error("parameter '{field}' {detail}")]
    ConditionalConstraint { field: String, detail: String },
}

/// Validate `raw` against `schema`, returning the resolved argument map.
///
/// `Value::Null` is accepted as an empty bag (the transport may omit
/// arguments entirely). Fields resolve in declaration order, so a sibling
/// that gates a conditional rule is settled before the dependent field is
/// checked. Defaults are applied recursively inside nested objects.
pub fn validate(schema: &ParamSchema, raw: &Value) -> Result<Map<String, Value>, ValidationError> {
    let empty = Map::new();
    let raw_map = match raw {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => return Err(ValidationError::NotAnObject),
    };
    validate_map(schema, raw_map, "")
}

fn validate_map(
    schema: &ParamSchema,
    raw: &Map<String, Value>,
    prefix: &str,
) -> Result<Map<String, Value>, ValidationError> {
    let mut resolved = Map::new();

    for field in &schema.fields {
        let path = join_path(prefix, field.name);
        let supplied = raw.get(field.name);

        match &field.presence {
            Presence::Required => match supplied {
                None => return Err(ValidationError::MissingParameter(path)),
                Some(Value::Null) => {
                    return Err(ValidationError::WrongType {
                        field: path,
                        expected: field.kind.expected(),
                    })
                }
                Some(value) => {
                    let value = check_value(&field.kind, value, &path)?;
                    resolved.insert(field.name.to_string(), value);
                }
            },
            Presence::Optional => {
                resolve_optional(field, supplied, &path, &mut resolved)?;
            }
            Presence::RequiredWhen { field: gate, equals } => {
                let applicable = sibling_matches(&resolved, gate, equals);
                match (applicable, supplied) {
                    (true, None) => {
                        return Err(ValidationError::ConditionalConstraint {
                            field: path,
                            detail: format!("is required when {gate} == \"{equals}\""),
                        })
                    }
                    (true, Some(value)) => {
                        let value = check_value(&field.kind, value, &path)?;
                        resolved.insert(field.name.to_string(), value);
                    }
                    (false, Some(_)) => {
                        return Err(ValidationError::ConditionalConstraint {
                            field: path,
                            detail: format!("is only valid when {gate} == \"{equals}\""),
                        })
                    }
                    (false, None) => {}
                }
            }
            Presence::AllowedWhen { field: gate, equals } => {
                let applicable = sibling_matches(&resolved, gate, equals);
                if applicable {
                    resolve_optional(field, supplied, &path, &mut resolved)?;
                } else if let Some(value) = supplied {
                    // Absent-or-default is tolerated; a meaningful value
                    // on an inapplicable field is a constraint violation.
                    if !value.is_null() && Some(value) != field.default.as_ref() {
                        return Err(ValidationError::ConditionalConstraint {
                            field: path,
                            detail: format!("is only valid when {gate} == \"{equals}\""),
                        });
                    }
                    resolved.insert(field.name.to_string(), value.clone());
                }
            }
        }
    }

    // Unknown keys in `raw` are intentionally not copied over.
    Ok(resolved)
}

fn resolve_optional(
    field: &Field,
    supplied: Option<&Value>,
    path: &str,
    resolved: &mut Map<String, Value>,
) -> Result<(), ValidationError> {
    match supplied {
        None => {
            if let Some(default) = &field.default {
                resolved.insert(field.name.to_string(), default.clone());
            }
        }
        Some(Value::Null) => {
            resolved.insert(field.name.to_string(), Value::Null);
        }
        Some(value) => {
            let value = check_value(&field.kind, value, path)?;
            resolved.insert(field.name.to_string(), value);
        }
    }
    Ok(())
}

/// Type-check one value, recursing into arrays and nested objects.
///
/// Returns the value to store: nested objects come back with their own
/// defaults and conditional rules applied.
fn check_value(kind: &FieldKind, value: &Value, path: &str) -> Result<Value, ValidationError> {
    let mismatch = || ValidationError::WrongType {
        field: path.to_string(),
        expected: kind.expected(),
    };

    match kind {
        FieldKind::Str => value.is_string().then(|| value.clone()).ok_or_else(mismatch),
        FieldKind::Int => {
            if value.is_i64() || value.is_u64() {
                Ok(value.clone())
            } else {
                Err(mismatch())
            }
        }
        FieldKind::Bool => value.is_boolean().then(|| value.clone()).ok_or_else(mismatch),
        FieldKind::Map => value.is_object().then(|| value.clone()).ok_or_else(mismatch),
        FieldKind::StrEnum(allowed) => {
            let text = value.as_str().ok_or_else(mismatch)?;
            if allowed.contains(&text) {
                Ok(value.clone())
            } else {
                Err(ValidationError::InvalidEnumValue {
                    field: path.to_string(),
                    allowed,
                })
            }
        }
        FieldKind::List(item) => {
            let elements = value.as_array().ok_or_else(mismatch)?;
            let mut out = Vec::with_capacity(elements.len());
            for (index, element) in elements.iter().enumerate() {
                out.push(check_value(item, element, &format!("{path}[{index}]"))?);
            }
            Ok(Value::Array(out))
        }
        FieldKind::Object(schema) => {
            let object = value.as_object().ok_or_else(mismatch)?;
            Ok(Value::Object(validate_map(schema, object, path)?))
        }
    }
}

fn sibling_matches(resolved: &Map<String, Value>, field: &str, equals: &str) -> bool {
    resolved.get(field).and_then(Value::as_str) == Some(equals)
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
