//! Canonical tool schema and the converters from the raw corpus shapes.
//!
//! Raw API documents arrive as loosely-typed JSON: `apiCode`-keyed objects
//! with `parameters`/`response`, or `name`-keyed objects with
//! `input_parameters`/`output_parameters`. Both normalize to [`ToolSchema`].

pub mod catalog;
pub mod description;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConvertError;
use crate::literal::to_python_repr;

pub use catalog::ToolCatalog;
pub use description::from_function_description;

const DEFAULT_FORMAT: &str = "free";
const LIST_ITEMS_PREFIX: &str = " Each item of the list is as follows: ";

/// A callable tool in the common schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
    pub response: BTreeMap<String, ResponseField>,
}

/// JSON-schema-like parameter block; `required` only names keys of `properties`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, ParameterProperty>,
    pub required: Vec<String>,
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self {
            kind: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterProperty {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseField {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub optional: bool,
}

/// Which raw key convention a document follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiConvention {
    /// `apiCode`, `description`, `parameters`, `response`.
    ApiCode,
    /// `name`, `description`, `input_parameters`, `output_parameters`.
    Named,
}

impl ToolSchema {
    /// Serialization used for equality across conversations and the catalog.
    ///
    /// Property and response maps are ordered and `required` is sorted, so
    /// two equal schemas always render identically.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Internal`] if serialization fails.
    pub fn canonical_json(&self) -> Result<String, ConvertError> {
        serde_json::to_string(self)
            .map_err(|err| ConvertError::Internal(format!("tool schema serialization: {err}")))
    }
}

/// Normalize one raw API document.
///
/// # Errors
///
/// Returns [`ConvertError::MalformedRecord`] when the document is not an
/// object or lacks its name key.
pub fn normalize_api(api: &Value, convention: ApiConvention) -> Result<ToolSchema, ConvertError> {
    let Some(obj) = api.as_object() else {
        return Err(ConvertError::malformed(format!(
            "API document must be an object, got {}",
            kind_label(api)
        )));
    };
    let (name_key, params_key, response_key) = match convention {
        ApiConvention::ApiCode => ("apiCode", "parameters", "response"),
        ApiConvention::Named => ("name", "input_parameters", "output_parameters"),
    };
    let name = obj
        .get(name_key)
        .and_then(Value::as_str)
        .ok_or_else(|| ConvertError::malformed(format!("API document has no '{name_key}'")))?;
    let params = obj
        .get(params_key)
        .or_else(|| match convention {
            ApiConvention::ApiCode => obj.get("input_parameters"),
            ApiConvention::Named => None,
        })
        .unwrap_or(&Value::Null);
    let response = obj.get(response_key).unwrap_or(&Value::Null);

    Ok(ToolSchema {
        name: name.to_string(),
        description: text_field(obj, "description"),
        parameters: convert_parameters(params),
        response: convert_response(response),
    })
}

/// Convert a raw `param -> details` mapping.
///
/// `format` defaults to `"free"`; a parameter is required only when its
/// source says so. `required` is sorted so equal schemas serialize equally
/// whatever order their source listed the parameters in.
#[must_use]
pub fn convert_parameters(params: &Value) -> ParameterSchema {
    let mut converted = ParameterSchema::default();
    let Some(params) = params.as_object() else {
        return converted;
    };
    for (param, info) in params {
        let info = info.as_object();
        let format = info
            .and_then(|info| info.get("format"))
            .filter(|format| !format.is_null())
            .map_or_else(|| DEFAULT_FORMAT.to_string(), value_text);
        converted.properties.insert(
            param.clone(),
            ParameterProperty {
                description: info.map(|i| text_field(i, "description")).unwrap_or_default(),
                kind: info.map(|i| text_field(i, "type")).unwrap_or_default(),
                format,
            },
        );
        if info
            .and_then(|info| info.get("required"))
            .is_some_and(truthy)
        {
            converted.required.push(param.clone());
        }
    }
    converted.required.sort_unstable();
    converted
}

/// Convert a raw response description.
///
/// Shapes, first match wins: a nested `data` object is unwrapped; `list`
/// becomes one `output` field describing its items; `object` expands its
/// properties; a document with none of `description`/`type`/`properties`/
/// `items` is already a field map; anything else becomes one `output` field
/// with an inferred type.
#[must_use]
pub fn convert_response(response: &Value) -> BTreeMap<String, ResponseField> {
    let empty = Map::new();
    let mut doc = response.as_object().unwrap_or(&empty);
    if let Some(Value::Object(data)) = doc.get("data") {
        doc = data;
    }

    let declared_type = text_field(doc, "type");
    let mut converted = BTreeMap::new();
    match declared_type.as_str() {
        "list" => {
            let items = doc.get("items").unwrap_or(&Value::Null);
            let description = format!(
                "{}{LIST_ITEMS_PREFIX}{}",
                text_field(doc, "description"),
                to_python_repr(items)
            );
            converted.insert(
                "output".to_string(),
                ResponseField {
                    description,
                    kind: "list".to_string(),
                    optional: !required_flag(doc),
                },
            );
        }
        "object" => {
            if let Some(Value::Object(properties)) = doc.get("properties") {
                for (field, details) in properties {
                    converted.insert(field.clone(), response_field(details));
                }
            }
        }
        _ if !["description", "type", "properties", "items"]
            .iter()
            .any(|key| doc.contains_key(*key)) =>
        {
            for (field, details) in doc {
                converted.insert(field.clone(), response_field(details));
            }
        }
        _ => {
            let description = text_field(doc, "description");
            let kind = if declared_type.is_empty() && description.contains("List of ") {
                "list".to_string()
            } else if declared_type.is_empty()
                && matches!(doc.get("properties"), Some(Value::Object(_)))
            {
                "object".to_string()
            } else {
                declared_type.clone()
            };
            converted.insert(
                "output".to_string(),
                ResponseField {
                    description,
                    kind,
                    optional: !required_flag(doc),
                },
            );
        }
    }
    converted
}

fn response_field(details: &Value) -> ResponseField {
    let empty = Map::new();
    let details = details.as_object().unwrap_or(&empty);
    ResponseField {
        description: text_field(details, "description"),
        kind: text_field(details, "type"),
        optional: !required_flag(details),
    }
}

/// `required` defaults to true for response fields.
fn required_flag(obj: &Map<String, Value>) -> bool {
    obj.get("required").is_none_or(truthy)
}

/// String value of `key`, the JSON text of a non-string value, or `""`.
pub(crate) fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).map(value_text).unwrap_or_default()
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Python truthiness, which is what the corpus flags were written against.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub(crate) fn kind_label(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
