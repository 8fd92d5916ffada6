//! `API-Request:` lines: plain tool calls and `ToolSearcher` lookups.

use serde_json::{Map, Value};

use super::{Level, Split};
use crate::call_parser::parse_call;
use crate::conversation::{ConversationBuilder, ToolCall};
use crate::error::ConvertError;
use crate::literal::parse_literal;
use crate::repair::parse_search_api;
use crate::schema::{convert_parameters, convert_response, text_field, ToolCatalog, ToolSchema};

const RESPONSE_SEPARATOR: &str = "->";

/// Tool(s) a `ToolSearcher` response announced.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchMatches {
    One(ToolSchema),
    Many(Vec<ToolSchema>),
}

impl SearchMatches {
    fn to_value(&self) -> Result<Value, ConvertError> {
        let value = match self {
            SearchMatches::One(tool) => serde_json::to_value(tool),
            SearchMatches::Many(tools) => serde_json::to_value(tools),
        };
        value.map_err(|err| ConvertError::Internal(format!("search match serialization: {err}")))
    }

    fn into_tools(self) -> Vec<ToolSchema> {
        match self {
            SearchMatches::One(tool) => vec![tool],
            SearchMatches::Many(tools) => tools,
        }
    }
}

fn split_response(content: &str) -> (&str, Option<&str>) {
    match content.split_once(RESPONSE_SEPARATOR) {
        Some((call, response)) => (call, Some(response)),
        None => (content, None),
    }
}

/// Emit a plain `[Name(args)] -> response` request.
pub fn api_request(content: &str, builder: &mut ConversationBuilder) {
    let (call_text, response_text) = split_response(content);
    let call = parse_call(call_text);
    let key = builder.call(ToolCall::new(call.name, call.parameters));
    if let Some(raw) = response_text {
        builder.respond(key, response_payload(raw));
    }
}

/// Evaluate a raw response literal.
///
/// Text that is not a literal, or is a bare number, is kept verbatim under
/// `output`. A `data` member replaces the whole payload.
#[must_use]
pub fn response_payload(raw: &str) -> Value {
    let raw = raw.trim();
    match parse_literal(raw) {
        Ok(Value::Object(mut map)) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        Ok(Value::Number(_)) | Err(_) => {
            let mut wrapped = Map::new();
            wrapped.insert("output".to_string(), Value::String(raw.to_string()));
            Value::Object(wrapped)
        }
        Ok(other) => other,
    }
}

/// Emit a `ToolSearcher` request and its `best_matchs` response.
///
/// At levels 2 and 3 the matched tools also become candidates of the
/// conversation, with spaces in their names replaced by `_`.
///
/// # Errors
///
/// Returns [`ConvertError::MalformedRecord`] or [`ConvertError::Literal`]
/// when the response does not have the shape its level uses.
pub fn tool_search(
    content: &str,
    level: Level,
    split: Split,
    builder: &mut ConversationBuilder,
    candidates: &mut ToolCatalog,
) -> Result<(), ConvertError> {
    let (call_text, response_text) = split_response(content);
    let call = parse_call(call_text);
    let key = builder.call(ToolCall::new(call.name, call.parameters));
    let Some(raw) = response_text else {
        return Ok(());
    };

    let matches = match (split, level) {
        (Split::Train, Level::Lv2) => SearchMatches::One(pipe_separated_match(raw)?),
        (Split::Train, _) => SearchMatches::One(searched_tool(
            parse_search_api(raw).as_object().unwrap_or(&Map::new()),
        )),
        (Split::Test, Level::Lv3) => match parse_literal(raw.trim())? {
            Value::Object(mut map) => {
                let output = map.remove("output").unwrap_or_else(|| Value::Object(Map::new()));
                matches_from_value(&output)?
            }
            other => {
                return Err(ConvertError::malformed(format!(
                    "ToolSearcher response is not a mapping: {other}"
                )))
            }
        },
        (Split::Test, _) => matches_from_value(&parse_search_api(raw))?,
    };

    let mut payload = Map::new();
    payload.insert("best_matchs".to_string(), matches.to_value()?);
    builder.respond(key, Value::Object(payload));

    if level.exposes_tool_search() {
        for mut tool in matches.into_tools() {
            tool.name = tool.name.trim().replace(' ', "_");
            candidates.insert(tool);
        }
    }
    Ok(())
}

/// `name: X| description: Y| input_parameters: {...}| output_parameters: {...}}`.
fn pipe_separated_match(raw: &str) -> Result<ToolSchema, ConvertError> {
    let segments: Vec<&str> = raw.split('|').collect();
    let field = |idx: usize| {
        segments
            .get(idx)
            .and_then(|segment| segment.split_once(": "))
            .map(|(_, value)| value)
            .ok_or_else(|| {
                ConvertError::malformed(format!(
                    "ToolSearcher response has no field {idx} ({} segments)",
                    segments.len()
                ))
            })
    };
    let name = field(0)?;
    let description = field(1)?;
    let params = parse_search_api(field(2)?);
    let response_field = field(3)?;
    let mut chars = response_field.chars();
    chars.next_back();
    let response = parse_search_api(chars.as_str());

    Ok(ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        parameters: convert_parameters(&params),
        response: convert_response(&response),
    })
}

fn matches_from_value(value: &Value) -> Result<SearchMatches, ConvertError> {
    match value {
        Value::Object(map) => Ok(SearchMatches::One(searched_tool(map))),
        Value::Array(items) => Ok(SearchMatches::Many(
            items.iter().filter_map(Value::as_object).map(searched_tool).collect(),
        )),
        other => Err(ConvertError::malformed(format!(
            "ToolSearcher matches must be a mapping or a list, got {other}"
        ))),
    }
}

/// A `name`-keyed document with every field optional.
fn searched_tool(doc: &Map<String, Value>) -> ToolSchema {
    ToolSchema {
        name: text_field(doc, "name"),
        description: text_field(doc, "description"),
        parameters: convert_parameters(doc.get("input_parameters").unwrap_or(&Value::Null)),
        response: convert_response(doc.get("output_parameters").unwrap_or(&Value::Null)),
    }
}
