//! Tool schemas from ToolAlpaca's free-text function descriptions.
//!
//! A description reads like:
//!
//! ```text
//! Search for books by keyword.
//! Parameters: {"q": "Required. string. Search keywords."}
//! Output: A list of matching books.
//!  - Format: application/json
//!  - Structure: Array[Object{title, author}]
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::Value;

use super::{value_text, ParameterProperty, ParameterSchema, ResponseField, ToolSchema, DEFAULT_FORMAT};
use crate::json_scan::{extract_between, SpanEnd};

static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(.*?)\nParameters:").expect("valid regex"));
static OUTPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Output: (.*?)\n").expect("valid regex"));
static STRUCTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Structure:\s*(\w+)").expect("valid regex"));
static PARAM_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(String|Integer|Object|Boolean|Number|array)").expect("valid regex")
});
static PARAM_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:string|integer|object|boolean|number|array)\.*\s*(.*)$")
        .expect("valid regex")
});

/// Key under which the single response field is emitted.
pub const RESPONSE_FIELD: &str = "res";

/// Build a tool schema from a free-text description.
#[must_use]
pub fn from_function_description(name: &str, details: &str) -> ToolSchema {
    let description = DESCRIPTION_RE
        .captures(details)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let mut parameters = ParameterSchema::default();
    if let Some(Value::Object(params)) =
        extract_between(details, "Parameters:", SpanEnd::Marker("Output:"))
    {
        for (param, raw) in &params {
            let text = value_text(raw);
            let (property, required) = describe_parameter(&text);
            parameters.properties.insert(param.clone(), property);
            if required {
                parameters.required.push(param.clone());
            }
        }
        parameters.required.sort_unstable();
    }

    let mut response = BTreeMap::new();
    if let Some(output) = OUTPUT_RE.captures(details).and_then(|caps| caps.get(1)) {
        let kind = STRUCTURE_RE
            .captures(details)
            .and_then(|caps| caps.get(1))
            .map_or("Object", |m| m.as_str())
            .to_string();
        response.insert(
            RESPONSE_FIELD.to_string(),
            ResponseField {
                description: output.as_str().trim().to_string(),
                kind,
                optional: false,
            },
        );
    }

    ToolSchema {
        name: name.to_string(),
        description,
        parameters,
        response,
    }
}

/// `"Required. string. The city."` -> (`String`, "The city.", required).
fn describe_parameter(text: &str) -> (ParameterProperty, bool) {
    let kind = PARAM_TYPE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| "string".to_string(), |m| capitalize(m.as_str()));
    let description = PARAM_DESCRIPTION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| text.trim(), |m| m.as_str().trim())
        .to_string();
    let required = text.contains("Required");
    (
        ParameterProperty {
            description,
            kind,
            format: DEFAULT_FORMAT.to_string(),
        },
        required,
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
