//! Read-only strict-mode compliance checks.
//!
//! Rules, checked on every schema node reachable through `properties` and a
//! single-schema `items` (the same nodes [`rewrite`](super::strict::rewrite)
//! stamps):
//! - `type: "object"` nodes set `additionalProperties: false`
//! - `type: "object"` nodes declare `properties` (possibly empty)
//! - `type: "array"` nodes declare `items`
//! - no `nullable` keyword
//! - no `$ref`
//! - every `required` entry names a declared property
//! - no key anywhere in the tree maps to `null`
//!
//! Every violation is collected; nothing short-circuits.

use std::fmt;

use serde_json::Value as JsonValue;

use gembridge_protocol::openai::create_chat_completions::types::ChatTool;

const SNIPPET_LIMIT: usize = 500;
const NO_ERRORS: &str = "No schema validation errors.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Dotted/bracket path, e.g. `root.properties.tags.items`.
    pub path: String,
    pub message: String,
    /// Compact JSON of the offending node, when the violation is about one.
    pub snippet: Option<String>,
}

impl SchemaError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            snippet: None,
        }
    }

    fn with_node(path: impl Into<String>, message: impl Into<String>, node: &JsonValue) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            snippet: serde_json::to_string(node).ok(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaValidation {
    pub valid: bool,
    pub errors: Vec<SchemaError>,
}

impl SchemaValidation {
    pub fn from_errors(errors: Vec<SchemaError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn merge(results: impl IntoIterator<Item = SchemaValidation>) -> Self {
        Self::from_errors(results.into_iter().flat_map(|result| result.errors).collect())
    }
}

pub fn validate(schema: &JsonValue) -> SchemaValidation {
    validate_at(schema, "root")
}

/// Same checks as [`validate`] with a caller-chosen root path.
pub fn validate_at(schema: &JsonValue, root: &str) -> SchemaValidation {
    let mut errors = Vec::new();
    check_node(schema, root, &mut errors);
    check_nulls(schema, root, &mut errors);
    SchemaValidation::from_errors(errors)
}

/// Validates outbound tool records: each must be a `function` tool with a
/// non-empty name and strict-compliant parameters.
pub fn validate_tools(tools: &[ChatTool]) -> SchemaValidation {
    let mut errors = Vec::new();
    for (index, tool) in tools.iter().enumerate() {
        let base = format!("tools[{index}]");
        if tool.r#type != "function" {
            errors.push(SchemaError::new(
                format!("{base}.type"),
                format!("tool type must be \"function\", got \"{}\"", tool.r#type),
            ));
        }
        if tool.function.name.trim().is_empty() {
            errors.push(SchemaError::new(
                format!("{base}.function.name"),
                "function name must not be empty",
            ));
        }
        let parameters = validate_at(
            &tool.function.parameters,
            &format!("{base}.function.parameters"),
        );
        errors.extend(parameters.errors);
    }
    SchemaValidation::from_errors(errors)
}

/// Renders violations as a numbered report suitable for an error message.
pub fn format_errors(errors: &[SchemaError]) -> String {
    if errors.is_empty() {
        return NO_ERRORS.to_string();
    }
    let mut out = format!(
        "Strict schema validation failed with {} error(s):",
        errors.len()
    );
    for (index, error) in errors.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", index + 1, error));
        if let Some(snippet) = &error.snippet {
            out.push_str("\n   schema: ");
            out.push_str(&truncate(snippet, SNIPPET_LIMIT));
        }
    }
    out
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit).collect();
    out.push_str("...");
    out
}

fn check_node(schema: &JsonValue, path: &str, errors: &mut Vec<SchemaError>) {
    let Some(node) = schema.as_object() else {
        return;
    };
    let kind = node.get("type").and_then(JsonValue::as_str);

    if kind == Some("object") {
        if node.get("additionalProperties") != Some(&JsonValue::Bool(false)) {
            errors.push(SchemaError::with_node(
                path,
                "object schema must set additionalProperties to false",
                schema,
            ));
        }
        if !node.contains_key("properties") {
            errors.push(SchemaError::with_node(
                path,
                "object schema must declare properties",
                schema,
            ));
        }
    }
    if kind == Some("array") && !node.contains_key("items") {
        errors.push(SchemaError::with_node(
            path,
            "array schema must declare items",
            schema,
        ));
    }
    if node.contains_key("nullable") {
        errors.push(SchemaError::new(
            format!("{path}.nullable"),
            "nullable is not supported; use a type union with \"null\" instead",
        ));
    }
    if node.contains_key("$ref") {
        errors.push(SchemaError::with_node(
            format!("{path}.$ref"),
            "$ref is not supported; inline the referenced schema",
            schema,
        ));
    }

    let properties = node.get("properties").and_then(JsonValue::as_object);
    if let Some(required) = node.get("required").and_then(JsonValue::as_array) {
        for (index, entry) in required.iter().enumerate() {
            let declared = entry
                .as_str()
                .is_some_and(|name| properties.is_some_and(|props| props.contains_key(name)));
            if !declared {
                errors.push(SchemaError::new(
                    format!("{path}.required[{index}]"),
                    format!("required entry {entry} is not declared in properties"),
                ));
            }
        }
    }

    if let Some(properties) = properties {
        for (name, property) in properties {
            check_node(property, &format!("{path}.properties.{name}"), errors);
        }
    }
    // Tuple `items`, combinators and `$defs` pass through the rewriter
    // untouched, so they are not held to the per-node rules either.
    if let Some(items @ JsonValue::Object(_)) = node.get("items") {
        check_node(items, &format!("{path}.items"), errors);
    }
}

fn check_nulls(value: &JsonValue, path: &str, errors: &mut Vec<SchemaError>) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                let child_path = format!("{path}.{key}");
                if child.is_null() {
                    errors.push(SchemaError::new(child_path, "value must not be null"));
                } else {
                    check_nulls(child, &child_path, errors);
                }
            }
        }
        JsonValue::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                check_nulls(item, &format!("{path}[{index}]"), errors);
            }
        }
        _ => {}
    }
}
