//! Type-safe schema generation for OpenAI structured outputs.
//!
//! Uses the `schemars` crate to derive JSON schemas from Rust types, then
//! rewrites them into the subset accepted by strict mode.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use openai_client::StructuredOutput;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Slot {
//!     start: String,
//!     end: String,
//! }
//!
//! let schema = Slot::openai_schema();
//! ```

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Trait for types that can be used as OpenAI structured output.
///
/// Automatically implemented for any type that implements `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a strict-mode JSON schema for this type.
    ///
    /// Strict mode requires:
    /// 1. `additionalProperties: false` on every object schema
    /// 2. every property listed in `required`, even defaulted ones
    /// 3. no `$ref` indirection and no `default` keywords
    fn openai_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions")
            }
            _ => None,
        };

        if let Some(Value::Object(definitions)) = definitions {
            inline_refs(&mut value, &definitions);
        }

        normalize(&mut value);
        value
    }

    /// Get the schema name for this type.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Replace every `{"$ref": "#/definitions/X"}` with the definition of `X`.
fn inline_refs(value: &mut Value, definitions: &Map<String, Value>) {
    match value {
        Value::Object(map) => {
            let target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name))
                .cloned();

            if let Some(mut definition) = target {
                inline_refs(&mut definition, definitions);
                *value = definition;
                return;
            }

            for child in map.values_mut() {
                inline_refs(child, definitions);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

/// Rewrite a schema node (and its sub-schemas) into strict-mode form.
///
/// Only walks schema positions, so a property that happens to be named
/// `title` or `default` is left alone.
fn normalize(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    map.remove("default");
    map.remove("title");

    if map.get("type").and_then(Value::as_str) == Some("object") {
        map.insert("additionalProperties".to_string(), Value::Bool(false));

        let keys: Vec<Value> = match map.get("properties") {
            Some(Value::Object(props)) => props.keys().cloned().map(Value::String).collect(),
            _ => Vec::new(),
        };
        map.insert("required".to_string(), Value::Array(keys));
    }

    if let Some(Value::Object(props)) = map.get_mut("properties") {
        for schema in props.values_mut() {
            normalize(schema);
        }
    }

    match map.get_mut("items") {
        Some(Value::Array(schemas)) => schemas.iter_mut().for_each(normalize),
        Some(schema) => normalize(schema),
        None => {}
    }

    for key in ["anyOf", "allOf", "oneOf"] {
        if let Some(Value::Array(schemas)) = map.get_mut(key) {
            schemas.iter_mut().for_each(normalize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Slot {
        title: String,
        start: String,
        #[serde(default)]
        location: String,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct SlotList {
        events: Vec<Slot>,
    }

    fn required_of(schema: &Value) -> Vec<&str> {
        schema["required"]
            .as_array()
            .expect("required array")
            .iter()
            .filter_map(Value::as_str)
            .collect()
    }

    #[test]
    fn test_root_has_no_meta_keys() {
        let schema = SlotList::openai_schema();
        let obj = schema.as_object().unwrap();

        assert!(!obj.contains_key("$schema"));
        assert!(!obj.contains_key("definitions"));
        assert!(!obj.contains_key("title"));
        assert_eq!(obj["additionalProperties"], Value::Bool(false));
    }

    #[test]
    fn test_defaulted_fields_are_required() {
        let schema = Slot::openai_schema();
        let required = required_of(&schema);

        assert!(required.contains(&"title"));
        assert!(required.contains(&"start"));
        assert!(required.contains(&"location"));
        assert!(schema["properties"]["location"].get("default").is_none());
    }

    #[test]
    fn test_property_named_title_survives() {
        let schema = Slot::openai_schema();
        assert!(schema["properties"].get("title").is_some());
    }

    #[test]
    fn test_list_items_are_inlined() {
        let schema = SlotList::openai_schema();
        let items = &schema["properties"]["events"]["items"];

        assert!(items.get("$ref").is_none(), "items should be inlined: {items}");
        assert_eq!(items["type"], "object");
        assert_eq!(items["additionalProperties"], Value::Bool(false));
        assert_eq!(required_of(items).len(), 3);
    }

    #[test]
    fn test_type_name() {
        assert_eq!(SlotList::type_name(), "SlotList");
    }
}
