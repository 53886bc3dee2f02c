//! Typed parameter schemas for tool inputs.
//!
//! Every tool declares its input contract as a [`ParamSchema`]: an ordered
//! list of fields with a type, a presence rule, and an optional default.
//! One generic interpreter ([`validate::validate`]) checks raw argument
//! bags against these schemas; there is no per-tool validation code.

pub mod validate;

pub use validate::{validate, ValidationError};

use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Schema description
// ---------------------------------------------------------------------------

/// The type of a single parameter.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Free-form string.
    Str,
    /// Integer.
    Int,
    /// Boolean flag.
    Bool,
    /// Free-form JSON object, passed through opaque.
    Map,
    /// Array with typed elements.
    List(Box<FieldKind>),
    /// String restricted to a fixed value set.
    StrEnum(&'static [&'static str]),
    /// Nested object with its own schema.
    Object(ParamSchema),
}

impl FieldKind {
    /// Human-readable name used in type-mismatch errors.
    pub fn expected(&self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Bool => "boolean",
            Self::Map => "object",
            Self::List(_) => "array",
            Self::StrEnum(_) => "string",
            Self::Object(_) => "object",
        }
    }
}

/// When a parameter must, may, or must not appear.
///
/// Conditional variants reference a sibling field that is declared
/// *earlier* in the same schema; the validator resolves fields in
/// declaration order so the gating value is always settled first.
#[derive(Debug, Clone)]
pub enum Presence {
    /// Must always be present.
    Required,
    /// May be absent; a declared default fills true absence.
    Optional,
    /// Required exactly when the sibling equals the given value,
    /// rejected when it does not.
    RequiredWhen {
        field: &'static str,
        equals: &'static str,
    },
    /// Permitted (with default substitution) only when the sibling equals
    /// the given value; any non-default value is rejected otherwise.
    AllowedWhen {
        field: &'static str,
        equals: &'static str,
    },
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
    pub default: Option<Value>,
}

impl Field {
    /// A field that must always be supplied.
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            description: "",
            kind,
            presence: Presence::Required,
            default: None,
        }
    }

    /// A field the caller may omit.
    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            description: "",
            kind,
            presence: Presence::Optional,
            default: None,
        }
    }

    /// Attach a default substituted when the field is truly absent.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Make the field conditionally required on an earlier sibling.
    pub fn required_when(mut self, field: &'static str, equals: &'static str) -> Self {
        self.presence = Presence::RequiredWhen { field, equals };
        self
    }

    /// Make the field valid only when an earlier sibling has a value.
    pub fn allowed_when(mut self, field: &'static str, equals: &'static str) -> Self {
        self.presence = Presence::AllowedWhen { field, equals };
        self
    }

    /// Attach a description rendered into the published JSON Schema.
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

/// Ordered input contract for one tool.
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    pub fields: Vec<Field>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field (builder style).
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render to the JSON Schema object published via `tools/list`.
    ///
    /// Conditional presence cannot be expressed in plain JSON Schema, so
    /// conditionally-required fields are listed as optional properties and
    /// the condition lives in the field description. The validator remains
    /// the source of truth.
    pub fn json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut prop = kind_schema(&field.kind);
            if !field.description.is_empty() {
                if let Some(obj) = prop.as_object_mut() {
                    obj.insert("description".into(), json!(field.description));
                }
            }
            if let Some(default) = &field.default {
                if let Some(obj) = prop.as_object_mut() {
                    obj.insert("default".into(), default.clone());
                }
            }
            properties.insert(field.name.to_string(), prop);

            if matches!(field.presence, Presence::Required) {
                required.push(json!(field.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn kind_schema(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Str => json!({"type": "string"}),
        FieldKind::Int => json!({"type": "integer"}),
        FieldKind::Bool => json!({"type": "boolean"}),
        FieldKind::Map => json!({"type": "object"}),
        FieldKind::List(item) => json!({"type": "array", "items": kind_schema(item)}),
        FieldKind::StrEnum(values) => json!({"type": "string", "enum": values}),
        FieldKind::Object(schema) => schema.json_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_schema_lists_required_fields() {
        let schema = ParamSchema::new()
            .field(Field::required("template_id", FieldKind::Str))
            .field(Field::optional("config", FieldKind::Map).with_default(json!({})));

        let rendered = schema.json_schema();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["required"], json!(["template_id"]));
        assert_eq!(rendered["properties"]["config"]["default"], json!({}));
    }

    #[test]
    fn json_schema_renders_nested_arrays() {
        let rule = ParamSchema::new().field(Field::required(
            "metric",
            FieldKind::StrEnum(&["Toxicity", "Tone"]),
        ));
        let schema = ParamSchema::new().field(Field::required(
            "protect_rules",
            FieldKind::List(Box::new(FieldKind::Object(rule))),
        ));

        let rendered = schema.json_schema();
        let items = &rendered["properties"]["protect_rules"]["items"];
        assert_eq!(items["type"], "object");
        assert_eq!(
            items["properties"]["metric"]["enum"],
            json!(["Toxicity", "Tone"])
        );
    }

    #[test]
    fn conditional_fields_are_not_listed_as_required() {
        let schema = ParamSchema::new()
            .field(Field::required("metric", FieldKind::StrEnum(&["Tone"])))
            .field(
                Field::optional("contains", FieldKind::List(Box::new(FieldKind::Str)))
                    .required_when("metric", "Tone"),
            );

        let rendered = schema.json_schema();
        assert_eq!(rendered["required"], json!(["metric"]));
        assert!(rendered["properties"]["contains"].is_object());
    }
}
