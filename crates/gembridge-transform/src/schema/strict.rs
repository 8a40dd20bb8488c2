use serde_json::{Map, Value as JsonValue, json};

/// Returns a strict-mode copy of `schema`.
///
/// Every node whose `type` is `"object"` gets `additionalProperties: false`
/// (overwriting any existing value). `properties.*` and a single-schema
/// `items` are rewritten recursively; every other key is cloned verbatim.
/// Nodes without an explicit `"object"` type are never stamped, so `{}`
/// stays `{}`.
pub fn rewrite(schema: &JsonValue) -> JsonValue {
    let JsonValue::Object(node) = schema else {
        return schema.clone();
    };

    let mut out = Map::with_capacity(node.len() + 1);
    for (key, value) in node {
        let value = match (key.as_str(), value) {
            ("properties", JsonValue::Object(properties)) => JsonValue::Object(
                properties
                    .iter()
                    .map(|(name, property)| (name.clone(), rewrite(property)))
                    .collect(),
            ),
            // Tuple-form `items` is copied as is.
            ("items", items @ JsonValue::Object(_)) => rewrite(items),
            _ => value.clone(),
        };
        out.insert(key.clone(), value);
    }

    if node.get("type").and_then(JsonValue::as_str) == Some("object") {
        out.insert("additionalProperties".to_string(), JsonValue::Bool(false));
    }

    JsonValue::Object(out)
}

/// Strict parameter schema for a function declaration.
///
/// A missing, null, non-object or empty schema becomes the canonical empty
/// object schema; anything else goes through [`rewrite`].
pub fn parameters_or_default(schema: Option<&JsonValue>) -> JsonValue {
    match schema {
        Some(schema @ JsonValue::Object(node)) if !node.is_empty() => rewrite(schema),
        _ => empty_object_schema(),
    }
}

/// Lowercases every `type` keyword, so OpenAPI-style `"OBJECT"` / `"STRING"`
/// schemas (Gemini's `parameters` and `responseSchema`) read as JSON Schema.
pub fn lowercase_types(schema: &JsonValue) -> JsonValue {
    match schema {
        JsonValue::Object(node) => JsonValue::Object(
            node.iter()
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("type", JsonValue::String(kind)) => {
                            JsonValue::String(kind.to_ascii_lowercase())
                        }
                        ("type", JsonValue::Array(kinds)) => JsonValue::Array(
                            kinds
                                .iter()
                                .map(|kind| match kind {
                                    JsonValue::String(kind) => {
                                        JsonValue::String(kind.to_ascii_lowercase())
                                    }
                                    other => other.clone(),
                                })
                                .collect(),
                        ),
                        _ => lowercase_types(value),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(lowercase_types).collect()),
        other => other.clone(),
    }
}

pub fn empty_object_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_nodes_are_closed(schema: &JsonValue) -> bool {
        let Some(node) = schema.as_object() else {
            return true;
        };
        if node.get("type").and_then(JsonValue::as_str) == Some("object")
            && node.get("additionalProperties") != Some(&JsonValue::Bool(false))
        {
            return false;
        }
        let properties_ok = node
            .get("properties")
            .and_then(JsonValue::as_object)
            .map(|properties| properties.values().all(object_nodes_are_closed))
            .unwrap_or(true);
        let items_ok = node.get("items").map(object_nodes_are_closed).unwrap_or(true);
        properties_ok && items_ok
    }

    #[test]
    fn stamps_nested_objects() {
        let schema = json!({
            "type": "object",
            "properties": {
                "a": {"type": "object", "properties": {"b": {"type": "string"}}}
            }
        });

        let rewritten = rewrite(&schema);

        assert_eq!(rewritten["additionalProperties"], json!(false));
        assert_eq!(rewritten["properties"]["a"]["additionalProperties"], json!(false));
        assert_eq!(rewritten["properties"]["a"]["properties"]["b"], json!({"type": "string"}));
    }

    #[test]
    fn overwrites_open_additional_properties() {
        let schema = json!({"type": "object", "properties": {}, "additionalProperties": true});
        assert_eq!(rewrite(&schema)["additionalProperties"], json!(false));
    }

    #[test]
    fn rewrites_array_items() {
        let schema = json!({
            "type": "array",
            "items": {"type": "object", "properties": {"x": {"type": "number"}}}
        });
        let rewritten = rewrite(&schema);
        assert!(rewritten.get("additionalProperties").is_none());
        assert_eq!(rewritten["items"]["additionalProperties"], json!(false));
    }

    #[test]
    fn tuple_items_are_copied_verbatim() {
        let schema = json!({
            "type": "array",
            "items": [{"type": "object", "properties": {}}]
        });
        let rewritten = rewrite(&schema);
        assert_eq!(rewritten["items"], schema["items"]);
    }

    #[test]
    fn keeps_other_keys() {
        let schema = json!({
            "type": "object",
            "description": "d",
            "required": ["mode"],
            "properties": {"mode": {"type": "string", "enum": ["a", "b"]}}
        });
        let rewritten = rewrite(&schema);
        assert_eq!(rewritten["description"], "d");
        assert_eq!(rewritten["required"], json!(["mode"]));
        assert_eq!(rewritten["properties"]["mode"]["enum"], json!(["a", "b"]));
    }

    #[test]
    fn untyped_empty_schema_is_not_stamped() {
        assert_eq!(rewrite(&json!({})), json!({}));
    }

    #[test]
    fn input_is_left_untouched() {
        let schema = json!({
            "type": "object",
            "properties": {"inner": {"type": "object", "properties": {}}}
        });
        let before = schema.clone();
        let _ = rewrite(&schema);
        assert_eq!(schema, before);
    }

    #[test]
    fn rewriting_twice_changes_nothing() {
        let schema = json!({
            "type": "object",
            "properties": {
                "list": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"k": {"type": "object", "properties": {}}}}
                }
            }
        });
        let once = rewrite(&schema);
        let twice = rewrite(&once);
        assert_eq!(once, twice);
        assert!(object_nodes_are_closed(&twice));
    }

    #[test]
    fn openapi_type_names_are_lowercased() {
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "type": {"type": "STRING", "enum": ["A", "B"]},
                "ids": {"type": ["ARRAY", "NULL"], "items": {"type": "INTEGER"}}
            }
        });

        let lowered = lowercase_types(&schema);

        assert_eq!(lowered["type"], "object");
        assert_eq!(lowered["properties"]["type"], json!({"type": "string", "enum": ["A", "B"]}));
        assert_eq!(lowered["properties"]["ids"]["type"], json!(["array", "null"]));
        assert_eq!(lowered["properties"]["ids"]["items"]["type"], "integer");
        assert_eq!(rewrite(&lowered)["additionalProperties"], json!(false));
    }

    #[test]
    fn empty_parameters_become_canonical_schema() {
        let expected = json!({"type": "object", "properties": {}, "additionalProperties": false});
        assert_eq!(parameters_or_default(Some(&json!({}))), expected);
        assert_eq!(parameters_or_default(None), expected);
        assert_eq!(parameters_or_default(Some(&JsonValue::Null)), expected);
    }

    #[test]
    fn populated_parameters_are_rewritten() {
        let schema = json!({"type": "object", "properties": {"q": {"type": "string"}}});
        let strict = parameters_or_default(Some(&schema));
        assert_eq!(strict["additionalProperties"], json!(false));
        assert_eq!(strict["properties"]["q"]["type"], "string");
    }
}
