//! Normalized conversation records.
//!
//! One output line is a JSON array of [`Turn`]s: an `id` turn, a
//! `candidate_tools` turn, then the dialogue in order.

pub mod context;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::schema::ToolSchema;

pub use context::{ConversationBuilder, ConversationContext, ResponseCache};

/// One role-tagged turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    Id {
        content: String,
    },
    CandidateTools {
        content: Vec<ToolSchema>,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default, skip_serializing_if = "is_false")]
        hidden: bool,
        content: String,
    },
    ToolCall {
        content: SmallVec<[ToolCall; 1]>,
    },
    ToolResponse {
        content: BTreeMap<String, Value>,
    },
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// A single invocation inside a `tool_call` turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub parameters: Value,
    /// Response keys whose values were substituted into `parameters`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depend_on: Option<Vec<String>>,
}

impl ToolCall {
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            parameters: Value::Object(parameters),
            depend_on: None,
        }
    }
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Turn::User {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Turn::Assistant {
            hidden: false,
            content: content.into(),
        }
    }

    /// Internal reasoning, kept in the record but not meant for display.
    #[must_use]
    pub fn hidden_assistant(content: impl Into<String>) -> Self {
        Turn::Assistant {
            hidden: true,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn role(&self) -> &'static str {
        match self {
            Turn::Id { .. } => "id",
            Turn::CandidateTools { .. } => "candidate_tools",
            Turn::User { .. } => "user",
            Turn::Assistant { .. } => "assistant",
            Turn::ToolCall { .. } => "tool_call",
            Turn::ToolResponse { .. } => "tool_response",
        }
    }

    /// Calls carried by a `tool_call` turn; empty for every other role.
    #[must_use]
    pub fn calls(&self) -> &[ToolCall] {
        match self {
            Turn::ToolCall { content } => content,
            _ => &[],
        }
    }
}

/// Wrap a non-object payload as `{"output": payload}`.
#[must_use]
pub fn wrap_payload(payload: Value) -> Value {
    match payload {
        Value::Object(_) => payload,
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("output".to_string(), other);
            Value::Object(wrapped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smallvec::smallvec;

    #[test]
    fn turns_serialize_with_role_tag() {
        let turns = vec![
            Turn::Id {
                content: "ToolAlpaca_0".into(),
            },
            Turn::user("hi"),
            Turn::hidden_assistant("thinking"),
            Turn::assistant("hello"),
        ];
        assert_eq!(
            serde_json::to_value(&turns).unwrap(),
            json!([
                {"role": "id", "content": "ToolAlpaca_0"},
                {"role": "user", "content": "hi"},
                {"role": "assistant", "hidden": true, "content": "thinking"},
                {"role": "assistant", "content": "hello"}
            ])
        );
    }

    #[test]
    fn tool_call_omits_absent_depend_on() {
        let mut params = Map::new();
        params.insert("q".into(), json!("x"));
        let turn = Turn::ToolCall {
            content: smallvec![ToolCall::new("Search", params)],
        };
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            json!({"role": "tool_call", "content": [{"name": "Search", "parameters": {"q": "x"}}]})
        );
    }

    #[test]
    fn turn_roundtrips() {
        let turn = Turn::ToolCall {
            content: smallvec![ToolCall {
                name: "Lookup".into(),
                parameters: json!({"id": "search.0.id"}),
                depend_on: Some(vec!["search.0".into()]),
            }],
        };
        let text = serde_json::to_string(&turn).unwrap();
        assert_eq!(serde_json::from_str::<Turn>(&text).unwrap(), turn);
        assert_eq!(turn.role(), "tool_call");
        assert_eq!(turn.calls().len(), 1);
    }

    #[test]
    fn scalar_payload_is_wrapped() {
        assert_eq!(wrap_payload(json!(3)), json!({"output": 3}));
        assert_eq!(wrap_payload(json!([1])), json!({"output": [1]}));
        assert_eq!(wrap_payload(json!({"a": 1})), json!({"a": 1}));
    }
}
