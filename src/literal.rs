//! Recursive-descent parser for Python-style literals.
//!
//! Tool responses in the API-Bank transcripts are printed Python values
//! (`{'id': 3, 'ok': True, 'tags': ('a', 'b')}`), not JSON. This accepts the
//! literal subset and maps it onto `serde_json::Value`: tuples and sets
//! become arrays, dict keys are rendered to strings the way `json.dumps`
//! would render them.

use serde_json::{Map, Number, Value};

use crate::error::ConvertError;

/// Deepest container or unary nesting accepted, matching `serde_json`.
const MAX_DEPTH: usize = 128;

/// Parse one literal; the whole input must be consumed.
///
/// # Errors
///
/// Returns [`ConvertError::Literal`] with the byte offset of the failure,
/// including input nested deeper than 128 levels.
pub fn parse_literal(input: &str) -> Result<Value, ConvertError> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_value()?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(parser.err("trailing characters after literal"));
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn err(&self, msg: &str) -> ConvertError {
        ConvertError::Literal(format!("{msg} at offset {}", self.pos))
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'\\' if matches!(self.peek_at(1), Some(b'\n')) => self.pos += 2,
                _ => break,
            }
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), ConvertError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(&format!("expected '{}'", byte as char)))
        }
    }

    fn parse_value(&mut self) -> Result<Value, ConvertError> {
        if self.depth == MAX_DEPTH {
            return Err(self.err("nesting too deep"));
        }
        self.depth += 1;
        let value = self.parse_nested();
        self.depth -= 1;
        value
    }

    fn parse_nested(&mut self) -> Result<Value, ConvertError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.err("unexpected end of input")),
            Some(b'{') => self.parse_brace(),
            Some(b'[') => {
                self.pos += 1;
                self.parse_items(b']').map(Value::Array)
            }
            Some(b'(') => self.parse_paren(),
            Some(b'\'' | b'"') => self.parse_strings(),
            Some(b'-') => {
                self.pos += 1;
                let value = self.parse_value()?;
                negate(&value).ok_or_else(|| self.err("unary minus on a non-number"))
            }
            Some(b'+') => {
                self.pos += 1;
                let value = self.parse_value()?;
                if value.is_number() {
                    Ok(value)
                } else {
                    Err(self.err("unary plus on a non-number"))
                }
            }
            Some(b'0'..=b'9' | b'.') => self.parse_number(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.parse_word(),
            Some(_) => Err(self.err("unexpected character")),
        }
    }

    fn parse_word(&mut self) -> Result<Value, ConvertError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        let word = &self.bytes[start..self.pos];
        if matches!(self.peek(), Some(b'\'' | b'"')) && is_string_prefix(word) {
            self.pos = start;
            return self.parse_strings();
        }
        match word {
            b"True" => Ok(Value::Bool(true)),
            b"False" => Ok(Value::Bool(false)),
            b"None" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(self.err("bare name is not a literal"))
            }
        }
    }

    /// `{}` is a dict; `{a, b}` a set; `{k: v}` a dict.
    fn parse_brace(&mut self) -> Result<Value, ConvertError> {
        self.pos += 1;
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(Map::new()));
        }
        let first = self.parse_value()?;
        self.skip_ws();
        if self.peek() != Some(b':') {
            let mut items = vec![first];
            if self.peek() == Some(b',') {
                self.pos += 1;
                items.extend(self.parse_items(b'}')?);
            } else {
                self.expect(b'}')?;
            }
            return Ok(Value::Array(items));
        }

        let mut map = Map::new();
        let mut key = first;
        loop {
            self.expect(b':')?;
            let value = self.parse_value()?;
            let rendered = self.render_key(&key)?;
            map.insert(rendered, value);
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some(b'}') {
                        self.pos += 1;
                        return Ok(Value::Object(map));
                    }
                    key = self.parse_value()?;
                }
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                _ => return Err(self.err("expected ',' or '}' in dict")),
            }
        }
    }

    /// `()` empty tuple, `(x)` grouping, `(x,)` / `(x, y)` tuple.
    fn parse_paren(&mut self) -> Result<Value, ConvertError> {
        self.pos += 1;
        self.skip_ws();
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(Value::Array(Vec::new()));
        }
        let first = self.parse_value()?;
        self.skip_ws();
        match self.peek() {
            Some(b')') => {
                self.pos += 1;
                Ok(first)
            }
            Some(b',') => {
                self.pos += 1;
                let mut items = vec![first];
                items.extend(self.parse_items(b')')?);
                Ok(Value::Array(items))
            }
            _ => Err(self.err("expected ',' or ')'")),
        }
    }

    /// Comma-separated items up to `close`; a trailing comma is allowed.
    fn parse_items(&mut self, close: u8) -> Result<Vec<Value>, ConvertError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(self.err("expected ',' or closing bracket")),
            }
        }
    }

    /// Adjacent string literals concatenate.
    fn parse_strings(&mut self) -> Result<Value, ConvertError> {
        let mut out = self.parse_one_string()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            if !self.at_string_start() {
                self.pos = save;
                return Ok(Value::String(out));
            }
            out.push_str(&self.parse_one_string()?);
        }
    }

    fn at_string_start(&self) -> bool {
        let mut i = self.pos;
        while self
            .bytes
            .get(i)
            .is_some_and(|b| matches!(*b, b'r' | b'R' | b'u' | b'U' | b'b' | b'B'))
        {
            i += 1;
        }
        matches!(self.bytes.get(i), Some(b'\'' | b'"')) && is_string_prefix(&self.bytes[self.pos..i])
    }

    fn parse_one_string(&mut self) -> Result<String, ConvertError> {
        let mut raw = false;
        while let Some(b) = self.peek() {
            match b {
                b'r' | b'R' => raw = true,
                b'u' | b'U' | b'b' | b'B' => {}
                _ => break,
            }
            self.pos += 1;
        }
        let Some(quote) = self.peek().filter(|b| matches!(*b, b'\'' | b'"')) else {
            return Err(self.err("expected string quote"));
        };
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut buf: Vec<u8> = Vec::new();
        loop {
            let Some(b) = self.peek() else {
                return Err(self.err("unterminated string"));
            };
            if b == quote {
                if !triple {
                    self.pos += 1;
                    break;
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    break;
                }
            }
            if b == b'\n' && !triple {
                return Err(self.err("end of line inside string"));
            }
            if b == b'\\' {
                self.pos += 1;
                let Some(next) = self.peek() else {
                    return Err(self.err("unterminated escape"));
                };
                if raw {
                    buf.push(b'\\');
                    buf.push(next);
                    self.pos += 1;
                    continue;
                }
                self.parse_escape(next, &mut buf)?;
                continue;
            }
            buf.push(b);
            self.pos += 1;
        }
        String::from_utf8(buf).map_err(|_| self.err("string is not valid UTF-8"))
    }

    fn parse_escape(&mut self, next: u8, buf: &mut Vec<u8>) -> Result<(), ConvertError> {
        self.pos += 1;
        let simple = match next {
            b'\n' => Some(None),
            b'\\' => Some(Some(b'\\')),
            b'\'' => Some(Some(b'\'')),
            b'"' => Some(Some(b'"')),
            b'n' => Some(Some(b'\n')),
            b't' => Some(Some(b'\t')),
            b'r' => Some(Some(b'\r')),
            b'a' => Some(Some(0x07)),
            b'b' => Some(Some(0x08)),
            b'f' => Some(Some(0x0c)),
            b'v' => Some(Some(0x0b)),
            _ => None,
        };
        if let Some(byte) = simple {
            if let Some(byte) = byte {
                buf.push(byte);
            }
            return Ok(());
        }
        let code = match next {
            b'x' => self.read_hex(2)?,
            b'u' => self.read_hex(4)?,
            b'U' => self.read_hex(8)?,
            b'0'..=b'7' => {
                let mut code = u32::from(next - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            code = code * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                code
            }
            other => {
                // Unknown escapes keep the backslash.
                buf.push(b'\\');
                buf.push(other);
                return Ok(());
            }
        };
        let ch = char::from_u32(code).ok_or_else(|| self.err("invalid code point in escape"))?;
        let mut utf8 = [0u8; 4];
        buf.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
        Ok(())
    }

    fn read_hex(&mut self, digits: usize) -> Result<u32, ConvertError> {
        let end = self.pos + digits;
        let Some(slice) = self.bytes.get(self.pos..end) else {
            return Err(self.err("truncated hex escape"));
        };
        let text = std::str::from_utf8(slice).map_err(|_| self.err("invalid hex escape"))?;
        let code = u32::from_str_radix(text, 16).map_err(|_| self.err("invalid hex escape"))?;
        self.pos = end;
        Ok(code)
    }

    fn parse_number(&mut self) -> Result<Value, ConvertError> {
        let start = self.pos;
        if self.peek() == Some(b'0')
            && matches!(
                self.peek_at(1),
                Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B')
            )
        {
            let radix = match self.peek_at(1) {
                Some(b'x' | b'X') => 16,
                Some(b'o' | b'O') => 8,
                _ => 2,
            };
            self.pos += 2;
            let digits_start = self.pos;
            while self
                .peek()
                .is_some_and(|b| b.is_ascii_hexdigit() || b == b'_')
            {
                self.pos += 1;
            }
            let digits: String = String::from_utf8_lossy(&self.bytes[digits_start..self.pos])
                .chars()
                .filter(|c| *c != '_')
                .collect();
            return i64::from_str_radix(&digits, radix)
                .map(Value::from)
                .map_err(|_| self.err("invalid integer literal"));
        }

        let mut is_float = false;
        self.consume_digits();
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            self.consume_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return Err(self.err("missing exponent digits"));
            }
            self.consume_digits();
        }
        if matches!(self.peek(), Some(b'j' | b'J')) {
            return Err(self.err("complex literals are not supported"));
        }

        let text: String = String::from_utf8_lossy(&self.bytes[start..self.pos])
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if text == "." {
            self.pos = start;
            return Err(self.err("unexpected character"));
        }
        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::from(n));
            }
            if let Ok(n) = text.parse::<u64>() {
                return Ok(Value::from(n));
            }
        }
        let float: f64 = text
            .parse()
            .map_err(|_| self.err("invalid number literal"))?;
        Number::from_f64(float)
            .map(Value::Number)
            .ok_or_else(|| self.err("number is not finite"))
    }

    fn consume_digits(&mut self) {
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || b == b'_')
        {
            self.pos += 1;
        }
    }

    fn render_key(&self, key: &Value) -> Result<String, ConvertError> {
        match key {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok("null".to_string()),
            Value::Array(_) | Value::Object(_) => Err(self.err("unsupported dict key")),
        }
    }
}

/// Render a value the way Python's `str()` prints the equivalent literal.
///
/// Used where descriptions embed a printed schema fragment.
#[must_use]
pub fn to_python_repr(value: &Value) -> String {
    let mut out = String::new();
    write_repr(value, &mut out);
    out
}

fn write_repr(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_str_repr(s, out),
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_repr(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (idx, (key, item)) in map.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                write_str_repr(key, out);
                out.push_str(": ");
                write_repr(item, out);
            }
            out.push('}');
        }
    }
}

/// Single quotes unless the text holds `'` and no `"`.
fn write_str_repr(s: &str, out: &mut String) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

fn is_string_prefix(word: &[u8]) -> bool {
    word.len() <= 2
        && word
            .iter()
            .all(|b| matches!(*b, b'r' | b'R' | b'u' | b'U' | b'b' | b'B'))
}

fn negate(value: &Value) -> Option<Value> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i.checked_neg().map_or_else(|| Value::from(-(i as f64)), Value::from));
    }
    if let Some(u) = n.as_u64() {
        return Some(Value::from(-(u as f64)));
    }
    n.as_f64().and_then(|f| Number::from_f64(-f)).map(Value::Number)
}

#[cfg(test)]
#[path = "literal_tests.rs"]
mod tests;
