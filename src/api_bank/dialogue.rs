//! Dialogue lines of an API-Bank prompt.

use std::sync::LazyLock;

use regex_lite::Regex;

static DIALOGUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(User:.*?)\n|(AI:.*?)\n|API-Request: (.*?)\n").expect("valid regex")
});
static USER_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"User:(.*?)\n").expect("valid regex"));

/// A raw line of dialogue, label removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTurn {
    User(String),
    Ai(String),
    ApiRequest(String),
}

/// Every newline-terminated `User:`, `AI:` and `API-Request:` line, in order.
#[must_use]
pub fn parse_dialogue(input: &str) -> Vec<RawTurn> {
    DIALOGUE_RE
        .captures_iter(input)
        .filter_map(|caps| {
            if let Some(m) = caps.get(1) {
                Some(RawTurn::User(strip_label(m.as_str(), "User:")))
            } else if let Some(m) = caps.get(2) {
                Some(RawTurn::Ai(strip_label(m.as_str(), "AI:")))
            } else {
                caps.get(3)
                    .map(|m| RawTurn::ApiRequest(m.as_str().trim().to_string()))
            }
        })
        .collect()
}

/// Text of the first `User:` line, untrimmed.
#[must_use]
pub fn first_user_query(input: &str) -> Option<&str> {
    USER_QUERY_RE
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn strip_label(line: &str, label: &str) -> String {
    line.strip_prefix(label).unwrap_or(line).trim().to_string()
}
