//! Tool-call extraction from transcript text.
//!
//! API-Bank writes calls as `[Name(key='value', other='value')]`. Only
//! single-quoted values are recognized; a value ends at its first `'`.
//! ToolAlpaca passes arguments as a separate JSON (or literal) string,
//! handled by [`parse_action_input`].

use memchr::{memchr, memmem};
use serde_json::{Map, Value};

use crate::error::ConvertError;
use crate::literal::parse_literal;

/// Name and arguments of a bracketed call. An empty name means no call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCall {
    pub name: String,
    pub parameters: Map<String, Value>,
}

impl ParsedCall {
    /// `true` when the text held no bracketed call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

#[inline]
fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Parse the first `[name(args)]` expression in `text`.
///
/// The argument span runs to the first `)]` on the same line. Text without
/// such an expression yields an empty [`ParsedCall`]; this is not an error.
#[must_use]
pub fn parse_call(text: &str) -> ParsedCall {
    match find_call(text) {
        Some((name, args)) => ParsedCall {
            name: name.trim().to_string(),
            parameters: parse_arguments(args),
        },
        None => ParsedCall::default(),
    }
}

/// Locate `[ident(` ... `)]` and return `(ident, args)`.
fn find_call(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut cursor = 0;
    while let Some(rel) = memchr(b'[', &bytes[cursor..]) {
        let open = cursor + rel;
        cursor = open + 1;

        let name_start = open + 1;
        let name_end = name_start
            + bytes[name_start..]
                .iter()
                .take_while(|b| is_ident(**b))
                .count();
        if name_end == name_start || bytes.get(name_end) != Some(&b'(') {
            continue;
        }

        let args_start = name_end + 1;
        let line_end = memchr(b'\n', &bytes[args_start..]).map_or(bytes.len(), |i| args_start + i);
        if let Some(close) = memmem::find(&bytes[args_start..line_end], b")]") {
            let args_end = args_start + close;
            return Some((&text[name_start..name_end], &text[args_start..args_end]));
        }
    }
    None
}

/// Collect every `key='value'` pair with a non-empty value, left to right.
fn parse_arguments(args: &str) -> Map<String, Value> {
    let bytes = args.as_bytes();
    let mut params = Map::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if let Some((key, value, next)) = match_pair(args, pos) {
            params.insert(key.to_string(), Value::String(value.to_string()));
            pos = next;
        } else {
            pos += 1;
        }
    }
    params
}

/// Try to match `ident='value'` starting exactly at `pos`.
fn match_pair(args: &str, pos: usize) -> Option<(&str, &str, usize)> {
    let bytes = args.as_bytes();
    let key_end = pos + bytes[pos..].iter().take_while(|b| is_ident(**b)).count();
    if key_end == pos || !bytes[key_end..].starts_with(b"='") {
        return None;
    }
    let value_start = key_end + 2;
    let quote = value_start + memchr(b'\'', &bytes[value_start..])?;
    if quote == value_start {
        return None;
    }
    Some((&args[pos..key_end], &args[value_start..quote], quote + 1))
}

/// Decode a ToolAlpaca action input: JSON first, then a Python literal.
///
/// A missing input is an empty argument object.
///
/// # Errors
///
/// Returns [`ConvertError::Literal`] when the text is neither JSON nor a
/// literal, and [`ConvertError::MalformedRecord`] for a non-string input.
pub fn parse_action_input(input: &Value) -> Result<Value, ConvertError> {
    match input {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::String(text) => match serde_json::from_str(text) {
            Ok(value) => Ok(value),
            Err(_) => parse_literal(text),
        },
        other => Err(ConvertError::malformed(format!(
            "action input must be a string, got {other}"
        ))),
    }
}
