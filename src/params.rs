//! Parameter model and parameter-description parsing.
//!
//! Parameters arrive from two directions: free-text annotation tags
//! (`@urlParam` / `@queryParam` / `@bodyParam`) and validation-rule
//! declarations attached to a handler's request object. Both funnel into the
//! same [`ParameterSpec`] shape. This module owns the shared text grammar
//! (`<name> [<type>] [required] <description> [Example: <value>]
//! [No-example]`), type-name normalization, and the expansion of dotted and
//! bracketed parameter names into concrete nested example structures.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Marker recognized at the end of a parameter description carrying a literal
/// example value.
const EXAMPLE_MARKER: &str = "Example:";

/// Marker forbidding example fabrication for a parameter.
const NO_EXAMPLE_MARKER: &str = "No-example";

/// A single documented parameter.
///
/// Keyed by name inside a stage's parameter map; `value` is the example value
/// shown in rendered docs, or `None` when no example exists (either because
/// none was declared and generation was suppressed, or because generation has
/// not happened yet).
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    pub description: String,
    pub value: Option<Value>,
    /// Set when the author wrote `No-example`: the merge may clear a value an
    /// earlier strategy generated, and the clean set drops the parameter
    #[serde(skip)]
    pub exclude_example: bool,
}

/// Result of parsing a parameter description's trailing markers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDescription {
    /// Description with the `Example:` / `No-example` markers stripped
    pub description: String,
    /// The literal example, cast into the declared type
    pub example: Option<Value>,
    /// True when the author forbade fabricating an example
    pub exclude_example: bool,
}

/// A parsed `@urlParam` / `@queryParam` / `@bodyParam` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamTag {
    pub name: String,
    pub kind: String,
    pub required: bool,
    pub description: ParsedDescription,
}

/// Normalizes a declared type name into the canonical abstract type set.
///
/// Aliases collapse (`int` → `integer`, `bool` → `boolean`, `double` →
/// `float`); anything empty or unrecognized defaults to `string`.
pub fn normalize_type(raw: &str) -> String {
    match raw.trim().to_ascii_lowercase().as_str() {
        "int" | "integer" => "integer",
        "bool" | "boolean" => "boolean",
        "double" | "float" => "float",
        "number" => "number",
        "array" => "array",
        "object" => "object",
        "date" => "date",
        _ => "string",
    }
    .to_string()
}

/// Returns true when the token names a type in the tag grammar.
///
/// Used to disambiguate `@queryParam page integer The page` from
/// `@queryParam filter The filter` where the second token is description text.
fn is_type_token(token: &str) -> bool {
    matches!(
        token.to_ascii_lowercase().as_str(),
        "string"
            | "integer"
            | "int"
            | "number"
            | "float"
            | "double"
            | "boolean"
            | "bool"
            | "array"
            | "object"
            | "date"
    )
}

/// Parses a parameter description's trailing `Example:` and `No-example`
/// markers.
///
/// The markers are stripped from the returned description; the example value
/// is cast into the declared type. The literal text `false` casts to boolean
/// `false`, not a truthy string.
pub fn parse_description(description: &str, kind: &str) -> ParsedDescription {
    let mut text = description.trim().to_string();
    let mut exclude_example = false;

    if let Some(stripped) = strip_suffix_ignore_case(&text, NO_EXAMPLE_MARKER) {
        text = stripped.trim_end().to_string();
        exclude_example = true;
    }

    let example = match text.rfind(EXAMPLE_MARKER) {
        Some(pos) => {
            let raw_value = text[pos + EXAMPLE_MARKER.len()..].trim().to_string();
            text.truncate(pos);
            text = text.trim_end().to_string();
            if raw_value.is_empty() {
                None
            } else {
                Some(cast_to_type(&raw_value, kind))
            }
        }
        None => None,
    };

    ParsedDescription {
        description: text,
        example: if exclude_example { None } else { example },
        exclude_example,
    }
}

/// Parses one `@urlParam`-style tag body.
///
/// Grammar: `<name> [<type>] [required] <description> [Example: <value>]
/// [No-example]`. The type token is optional and defaults to `string`;
/// `required` is recognized literally after the optional type.
pub fn parse_param_tag(content: &str) -> Option<ParamTag> {
    let mut tokens = content.split_whitespace().peekable();
    let name = tokens.next()?.to_string();

    let kind = match tokens.peek() {
        Some(token) if is_type_token(token) => {
            let raw = tokens.next().unwrap_or_default();
            normalize_type(raw)
        }
        _ => "string".to_string(),
    };

    let required = match tokens.peek() {
        Some(token) if token.eq_ignore_ascii_case("required") => {
            tokens.next();
            true
        }
        _ => false,
    };

    let rest: Vec<&str> = tokens.collect();
    let description = parse_description(&rest.join(" "), &kind);

    Some(ParamTag {
        name,
        kind,
        required,
        description,
    })
}

/// Casts a literal example value into the declared abstract type.
///
/// Parse failures fall back to the raw string rather than erroring; a doc
/// author's sloppy example should never break extraction.
pub fn cast_to_type(raw: &str, kind: &str) -> Value {
    match normalize_type(kind).as_str() {
        "integer" => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        "number" | "float" => raw
            .parse::<f64>()
            .map(|f| json!(f))
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        "boolean" => Value::Bool(!matches!(raw.trim(), "false" | "0")),
        "array" | "object" => serde_json::from_str(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}

/// Expands a parameter map into the example-ready nested structure.
///
/// Dot segments denote nesting (`user.name`), `*` denotes an array level with
/// the example placed at index 0, and bracket notation `items[]` is an alias
/// for `items.*`. Parameters without a concrete example value are dropped.
pub fn clean_parameters(params: &BTreeMap<String, ParameterSpec>) -> Map<String, Value> {
    let mut root = Value::Object(Map::new());
    for (name, spec) in params {
        if spec.exclude_example {
            continue;
        }
        let value = match &spec.value {
            Some(value) => value.clone(),
            None => continue,
        };
        let normalized = name.replace("[]", ".*");
        let segments: Vec<&str> = normalized.split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            continue;
        }
        insert_at_path(&mut root, &segments, value);
    }
    match root {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Writes `value` at the nested path, creating objects and single-element
/// arrays along the way. Wildcard segments always address index 0.
fn insert_at_path(target: &mut Value, segments: &[&str], value: Value) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            *target = value;
            return;
        }
    };

    if *head == "*" {
        if !target.is_array() {
            *target = Value::Array(vec![Value::Null]);
        }
        if let Value::Array(array) = target {
            if array.is_empty() {
                array.push(Value::Null);
            }
            insert_at_path(&mut array[0], rest, value);
        }
    } else {
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if let Value::Object(object) = target {
            let slot = object.entry(head.to_string()).or_insert(Value::Null);
            insert_at_path(slot, rest, value);
        }
    }
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    // The cut must land on a char boundary; descriptions may end in
    // multibyte text that happens to be suffix.len() bytes long
    let cut = text.len().checked_sub(suffix.len())?;
    if text.is_char_boundary(cut) && text[cut..].eq_ignore_ascii_case(suffix) {
        Some(&text[..cut])
    } else {
        None
    }
}
