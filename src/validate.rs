//! Candidate-set checks applied to assembled conversations.
//!
//! API-Bank rejects a whole conversation that calls an unknown tool;
//! ToolAlpaca cuts the offending call and its response out and keeps the
//! rest. The two corpora keep their own policy.

use rustc_hash::FxHashSet;

use crate::conversation::Turn;

/// Tool names declared by the leading `candidate_tools` turn.
///
/// A conversation that does not start with one declares nothing.
#[must_use]
pub fn candidate_names(turns: &[Turn]) -> FxHashSet<&str> {
    match turns.first() {
        Some(Turn::CandidateTools { content }) => content.iter().map(|t| t.name.as_str()).collect(),
        _ => {
            tracing::warn!("conversation does not start with candidate_tools");
            FxHashSet::default()
        }
    }
}

/// First call whose tool is not a candidate, if any.
#[must_use]
pub fn first_unknown_call(turns: &[Turn]) -> Option<&str> {
    let names = candidate_names(turns);
    turns
        .iter()
        .flat_map(Turn::calls)
        .map(|call| call.name.as_str())
        .find(|name| !names.contains(name))
}

/// Remove every `tool_call` turn that names an unknown tool, together with
/// the `tool_response` right after it. Returns the number of calls removed.
///
/// The candidate set is taken from the most recent `candidate_tools` turn.
pub fn excise_unknown_calls(turns: &mut Vec<Turn>) -> usize {
    let mut names: FxHashSet<String> = FxHashSet::default();
    let mut excised = 0;
    let mut i = 0;
    while i < turns.len() {
        if let Turn::CandidateTools { content } = &turns[i] {
            names = content.iter().map(|t| t.name.clone()).collect();
        }
        let unknown = turns[i]
            .calls()
            .iter()
            .any(|call| !names.contains(&call.name));
        if unknown {
            turns.remove(i);
            excised += 1;
            if matches!(turns.get(i), Some(Turn::ToolResponse { .. })) {
                turns.remove(i);
            }
        } else {
            i += 1;
        }
    }
    excised
}

/// Prefix `turns` with the synthetic `id` turn.
#[must_use]
pub fn with_id(id: String, turns: Vec<Turn>) -> Vec<Turn> {
    let mut out = Vec::with_capacity(turns.len() + 1);
    out.push(Turn::Id { content: id });
    out.extend(turns);
    out
}
