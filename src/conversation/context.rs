use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde_json::Value;
use smallvec::smallvec;

use super::{wrap_payload, ToolCall, Turn};

/// Prior tool responses of one conversation, in recording order.
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: Vec<(String, Value)>,
}

impl ResponseCache {
    /// Record `payload` under `key`; an existing key keeps its position.
    pub fn insert(&mut self, key: String, payload: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = payload,
            None => self.entries.push((key, payload)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-conversation state: invocation counters and the response cache.
///
/// Created at conversation start and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    counters: FxHashMap<String, usize>,
    cache: ResponseCache,
}

impl ConversationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-based index of this invocation of `tool`; advances the counter.
    pub fn next_invocation_index(&mut self, tool: &str) -> usize {
        let counter = self.counters.entry(tool.to_string()).or_insert(0);
        let index = *counter;
        *counter += 1;
        index
    }

    /// `"{tool}.{index}"`.
    #[must_use]
    pub fn response_key(tool: &str, index: usize) -> String {
        format!("{tool}.{index}")
    }

    pub fn record_response(&mut self, key: String, payload: Value) {
        self.cache.insert(key, payload);
    }

    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

/// Accumulates normalized turns while threading a [`ConversationContext`].
#[derive(Debug, Default)]
pub struct ConversationBuilder {
    turns: Vec<Turn>,
    context: ConversationContext,
}

impl ConversationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    pub fn assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    pub fn hidden_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::hidden_assistant(content));
    }

    /// Emit a `tool_call` turn and return the response key of this invocation.
    pub fn call(&mut self, call: ToolCall) -> String {
        let index = self.context.next_invocation_index(&call.name);
        let key = ConversationContext::response_key(&call.name, index);
        self.turns.push(Turn::ToolCall {
            content: smallvec![call],
        });
        key
    }

    /// Emit the `tool_response` paired with `key`, caching the wrapped payload.
    pub fn respond(&mut self, key: String, payload: Value) {
        let payload = wrap_payload(payload);
        self.context.record_response(key.clone(), payload.clone());
        let mut content = BTreeMap::new();
        content.insert(key, payload);
        self.turns.push(Turn::ToolResponse { content });
    }

    #[must_use]
    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    #[must_use]
    pub fn has_tool_call(&self) -> bool {
        self.turns
            .iter()
            .any(|turn| matches!(turn, Turn::ToolCall { .. }))
    }

    #[must_use]
    pub fn finish(self) -> Vec<Turn> {
        self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn repeated_tool_gets_distinct_keys() {
        let mut builder = ConversationBuilder::new();
        let first = builder.call(ToolCall::new("toolName", Map::new()));
        builder.respond(first.clone(), json!({"n": 1}));
        let second = builder.call(ToolCall::new("toolName", Map::new()));
        builder.respond(second.clone(), json!({"n": 2}));

        assert_eq!(first, "toolName.0");
        assert_eq!(second, "toolName.1");
        assert_eq!(builder.context().cache().len(), 2);
        assert_eq!(builder.context().cache().get("toolName.1"), Some(&json!({"n": 2})));
    }

    #[test]
    fn counters_are_per_tool() {
        let mut ctx = ConversationContext::new();
        assert_eq!(ctx.next_invocation_index("a"), 0);
        assert_eq!(ctx.next_invocation_index("b"), 0);
        assert_eq!(ctx.next_invocation_index("a"), 1);
    }

    #[test]
    fn scalar_response_is_wrapped_before_caching() {
        let mut builder = ConversationBuilder::new();
        let key = builder.call(ToolCall::new("Clock", Map::new()));
        builder.respond(key, json!("12:00"));
        assert_eq!(
            builder.context().cache().get("Clock.0"),
            Some(&json!({"output": "12:00"}))
        );
        let turns = builder.finish();
        assert_eq!(
            serde_json::to_value(&turns[1]).unwrap(),
            json!({"role": "tool_response", "content": {"Clock.0": {"output": "12:00"}}})
        );
    }

    #[test]
    fn cache_keeps_recording_order() {
        let mut cache = ResponseCache::default();
        cache.insert("z.0".into(), json!(1));
        cache.insert("a.0".into(), json!(2));
        cache.insert("z.0".into(), json!(3));
        let keys: Vec<_> = cache.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z.0", "a.0"]);
        assert_eq!(cache.get("z.0"), Some(&json!(3)));
    }
}
