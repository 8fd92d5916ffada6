//! Data-flow linking between sequential tool calls.
//!
//! When a call argument equals a value found inside an earlier response, the
//! argument is rewritten as a back-reference `"{responseKey}{path}"` (for
//! example `search.0.items.2.id`) and the response key joins `depend_on`.

use serde_json::{Map, Value};

use crate::conversation::ResponseCache;

/// Depth-first search of `haystack` for a leaf equal to `target`.
///
/// Returns the `.key`/`.index` path of the first hit in traversal order
/// (object keys in document order, array items by index). A scalar
/// `haystack` has no path and never matches.
#[must_use]
pub fn find_nested_value(haystack: &Value, target: &Value) -> Option<String> {
    let mut path = String::new();
    if search(haystack, target, &mut path) && !path.is_empty() {
        Some(path)
    } else {
        None
    }
}

fn search(node: &Value, target: &Value, path: &mut String) -> bool {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                let len = path.len();
                path.push('.');
                path.push_str(key);
                if search(child, target, path) {
                    return true;
                }
                path.truncate(len);
            }
            false
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                let len = path.len();
                path.push('.');
                path.push_str(&idx.to_string());
                if search(child, target, path) {
                    return true;
                }
                path.truncate(len);
            }
            false
        }
        leaf => leaf_eq(leaf, target),
    }
}

/// Scalar equality with `1 == 1.0`.
#[inline]
fn leaf_eq(leaf: &Value, target: &Value) -> bool {
    match (leaf, target) {
        (Value::Number(a), Value::Number(b)) => {
            a == b || a.as_f64().zip(b.as_f64()).is_some_and(|(a, b)| a == b)
        }
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    }
}

/// Rewrite the arguments of a pending call against prior responses.
///
/// Object arguments are resolved directly; an array argument resolves each
/// of its object items. Nulls and nested containers are left alone, so a
/// null argument is never linked, and a bool never equals a number even
/// where `True == 1` would hold in the transcripts' source language.
/// Returns the response keys used, de-duplicated in first-use order.
pub fn resolve_arguments(parameters: &mut Value, cache: &ResponseCache) -> Vec<String> {
    let mut depend_on = Vec::new();
    match parameters {
        Value::Object(args) => resolve_object(args, cache, &mut depend_on),
        Value::Array(items) => {
            for item in items {
                if let Value::Object(args) = item {
                    resolve_object(args, cache, &mut depend_on);
                }
            }
        }
        _ => {}
    }
    depend_on
}

fn resolve_object(args: &mut Map<String, Value>, cache: &ResponseCache, depend_on: &mut Vec<String>) {
    for value in args.values_mut() {
        if !matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
            continue;
        }
        let hit = cache
            .iter()
            .find_map(|(key, payload)| find_nested_value(payload, value).map(|path| (key, path)));
        if let Some((key, path)) = hit {
            tracing::trace!(key, %path, "argument resolved to prior response");
            *value = Value::String(format!("{key}{path}"));
            if !depend_on.iter().any(|k| k == key) {
                depend_on.push(key.to_string());
            }
        }
    }
}
