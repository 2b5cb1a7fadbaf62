//! Request model schemas (JSON Schema draft-4 subset).
//!
//! Only the keywords the album models use are modeled: `type`, `required`,
//! `properties` and `items`. Undeclared properties are allowed, as in
//! draft-4 without `additionalProperties`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DRAFT4_SCHEMA_URI: &str = "http://json-schema.org/draft-04/schema#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Object,
    Array,
    String,
    Number,
    Boolean,
}

impl JsonType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: JsonType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, JsonSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,
}

impl JsonSchema {
    pub fn of(kind: JsonType) -> Self {
        Self {
            schema_uri: None,
            title: None,
            kind,
            required: Vec::new(),
            properties: BTreeMap::new(),
            items: None,
        }
    }

    pub fn string() -> Self {
        Self::of(JsonType::String)
    }

    pub fn array_of(items: JsonSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(JsonType::Array)
        }
    }

    /// Object schema; every `(name, schema, required)` entry becomes a property.
    pub fn object<I>(properties: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, JsonSchema, bool)>,
    {
        let mut schema = Self::of(JsonType::Object);
        for (name, property, required) in properties {
            if required {
                schema.required.push(name.to_string());
            }
            schema.properties.insert(name.to_string(), property);
        }
        schema
    }

    /// Marks this schema as a titled draft-4 root document.
    pub fn root(mut self, title: impl Into<String>) -> Self {
        self.schema_uri = Some(DRAFT4_SCHEMA_URI.to_string());
        self.title = Some(title.into());
        self
    }

    /// Validates `value`, reporting the first violation found.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validate_at("$", value)
    }

    fn validate_at(&self, path: &str, value: &Value) -> Result<(), SchemaViolation> {
        if !self.kind.accepts(value) {
            return Err(SchemaViolation {
                path: path.to_string(),
                message: format!("expected {}", self.kind.name()),
            });
        }

        if let Some(object) = value.as_object() {
            for name in &self.required {
                if !object.contains_key(name) {
                    return Err(SchemaViolation {
                        path: path.to_string(),
                        message: format!("missing required property `{name}`"),
                    });
                }
            }
            for (name, property) in &self.properties {
                if let Some(child) = object.get(name) {
                    property.validate_at(&format!("{path}.{name}"), child)?;
                }
            }
        }

        if let (Some(items), Some(array)) = (&self.items, value.as_array()) {
            for (index, child) in array.iter().enumerate() {
                items.validate_at(&format!("{path}[{index}]"), child)?;
            }
        }

        Ok(())
    }
}

/// First schema violation found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSONPath-like location, e.g. `$.tracks[1].title`.
    pub path: String,
    pub message: String,
}

impl Display for SchemaViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl Error for SchemaViolation {}

#[cfg(test)]
mod tests {
    use super::{JsonSchema, JsonType};
    use serde_json::json;

    fn track_list_schema() -> JsonSchema {
        JsonSchema::object([(
            "tracks",
            JsonSchema::array_of(JsonSchema::object([
                ("title", JsonSchema::string(), true),
                ("length", JsonSchema::string(), true),
            ])),
            false,
        )])
    }

    #[test]
    fn reports_nested_violation_path() {
        let schema = track_list_schema();
        let err = schema
            .validate(&json!({
                "tracks": [{"title": "a", "length": "1"}, {"title": 7, "length": "2"}]
            }))
            .expect_err("numeric title should be rejected");
        assert_eq!(err.path, "$.tracks[1].title");
        assert_eq!(err.message, "expected string");
    }

    #[test]
    fn optional_properties_and_extra_fields_are_allowed() {
        let schema = track_list_schema();
        assert!(schema.validate(&json!({})).is_ok());
        assert!(schema.validate(&json!({"year": 1973})).is_ok());
        assert!(schema.validate(&json!([])).is_err());
    }

    #[test]
    fn serializes_draft4_keywords() {
        let schema = JsonSchema::object([("artist", JsonSchema::string(), true)]).root("Input");
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["$schema"], "http://json-schema.org/draft-04/schema#");
        assert_eq!(json["type"], "object");
        assert_eq!(json["required"], json!(["artist"]));
        assert_eq!(json["properties"]["artist"]["type"], "string");
        assert!(json.get("items").is_none());

        let back: JsonSchema = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind, JsonType::Object);
    }
}
