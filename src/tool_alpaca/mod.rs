//! ToolAlpaca conversion.
//!
//! Each entry documents one API (`Function_Description`, free text per
//! tool) and carries recorded agent runs (`Instances`). Runs that made at
//! least one tool call become conversations; calls to tools the entry does
//! not document are cut out afterwards.

pub mod assembler;

use serde::Deserialize;
use serde_json::{Map, Value};

use self::assembler::{assemble_instance, Instance};
use crate::conversation::Turn;
use crate::error::ConvertError;
use crate::observability::FileSummary;
use crate::schema::{from_function_description, ToolCatalog, ToolSchema};
use crate::validate::{excise_unknown_calls, with_id};

/// Output file name.
pub const OUTPUT_FILE: &str = "processed_data.jsonl";

const COMPONENTS_KEY: &str = "components";
const ID_PREFIX: &str = "ToolAlpaca_";

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "Function_Description", default)]
    function_description: Map<String, Value>,
    #[serde(rename = "Instances", default)]
    instances: Vec<Instance>,
}

/// Converted conversations plus every documented tool.
#[derive(Debug, Default)]
pub struct AlpacaOutput {
    pub conversations: Vec<Vec<Turn>>,
    pub catalog: ToolCatalog,
    pub summary: FileSummary,
}

/// Convert the entries of `train_data.json`.
///
/// Entries without instances are dropped before numbering. A failing entry
/// is logged with its index and skipped; a failing instance drops only its
/// conversation. Both count as errors.
#[must_use]
pub fn convert(entries: &[Value]) -> AlpacaOutput {
    let mut out = AlpacaOutput {
        summary: FileSummary::new(OUTPUT_FILE),
        ..AlpacaOutput::default()
    };
    let mut kept: Vec<Vec<Turn>> = Vec::new();
    let mut processed = 0usize;

    let with_instances = entries.iter().filter(|entry| has_instances(entry));
    for (index, raw) in with_instances.enumerate() {
        let entry = match Entry::deserialize(raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(index, "entry skipped: {err}");
                out.summary.errors += 1;
                continue;
            }
        };
        let tools = match entry_tools(&entry.function_description) {
            Ok(tools) => tools,
            Err(err) => {
                tracing::warn!(index, "entry skipped: {err}");
                out.summary.errors += 1;
                continue;
            }
        };
        out.catalog.extend(tools.iter().cloned());

        for (instance_index, instance) in entry.instances.iter().enumerate() {
            match assemble_instance(instance) {
                Ok(Some(turns)) if turns.iter().any(|t| matches!(t, Turn::ToolCall { .. })) => {
                    let mut conversation = Vec::with_capacity(turns.len() + 1);
                    conversation.push(Turn::CandidateTools {
                        content: tools.clone(),
                    });
                    conversation.extend(turns);
                    kept.push(conversation);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(index, instance_index, "conversation dropped: {err}");
                    out.summary.errors += 1;
                }
            }
        }
        processed += 1;
    }

    for (i, mut conversation) in kept.into_iter().enumerate() {
        out.summary.excised += excise_unknown_calls(&mut conversation);
        out.conversations
            .push(with_id(format!("{ID_PREFIX}{i}"), conversation));
    }
    out.summary.accepted = out.conversations.len();
    tracing::info!(processed, "ToolAlpaca entries converted");
    out.summary.log();
    out
}

fn has_instances(entry: &Value) -> bool {
    entry
        .get("Instances")
        .and_then(Value::as_array)
        .is_some_and(|instances| !instances.is_empty())
}

/// Tool schemas of an entry in canonical order; `components` and blank
/// descriptions are skipped.
fn entry_tools(descriptions: &Map<String, Value>) -> Result<Vec<ToolSchema>, ConvertError> {
    let mut tools = ToolCatalog::new();
    for (name, details) in descriptions {
        if name == COMPONENTS_KEY {
            continue;
        }
        let details = details.as_str().ok_or_else(|| {
            ConvertError::malformed(format!("description of '{name}' is not text"))
        })?;
        if details.trim().is_empty() {
            continue;
        }
        tools.insert(from_function_description(name, details));
    }
    Ok(tools.into_tools())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SEARCH_DOC: &str = "Search for books.\nParameters: {\"q\": \"Required. string. Keywords.\"}\nOutput: Matching books.\n - Format: application/json\n - Structure: Array[Object{id, title}]";
    const BOOK_DOC: &str = "Get one book.\nParameters: {\"id\": \"Required. string. Book id.\"}\nOutput: The book.\n";

    fn entry() -> Value {
        json!({
            "Function_Description": {
                "searchBooks": SEARCH_DOC,
                "getBook": BOOK_DOC,
                "components": {"schemas": {}},
                "unused": "   "
            },
            "Instructions": ["Find Dune"],
            "Instances": [
                {
                    "input": "Who wrote Dune?",
                    "output": "Frank Herbert.",
                    "intermediate_steps": [
                        [["searchBooks", "{\"q\": \"Dune\"}", ""], "Response: {\"items\": [{\"id\": \"b7\"}]}"],
                        [["deleteBook", "{\"id\": \"b7\"}", ""], "Response: {\"ok\": true}"],
                        [["getBook", "{\"id\": \"b7\"}", ""], "Response: {\"author\": \"Frank Herbert\"}"]
                    ]
                },
                {"input": "Hello", "output": "Hi!", "intermediate_steps": []},
                {"input": "Bad", "output": "x", "intermediate_steps": [[["getBook", "id=7", ""], "Response: {}"]]}
            ]
        })
    }

    #[test]
    fn conversation_with_excised_unknown_call() {
        let out = convert(&[entry()]);
        assert_eq!(out.summary.accepted, 1);
        assert_eq!(out.summary.excised, 1);
        assert_eq!(out.summary.errors, 1);

        let value = serde_json::to_value(&out.conversations[0]).unwrap();
        let roles: Vec<_> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|turn| turn["role"].as_str().unwrap())
            .collect();
        assert_eq!(
            roles,
            vec![
                "id",
                "candidate_tools",
                "user",
                "tool_call",
                "tool_response",
                "tool_call",
                "tool_response",
                "assistant"
            ]
        );
        assert_eq!(value[0]["content"], "ToolAlpaca_0");
        assert_eq!(value[5]["content"][0]["name"], "getBook");
        assert_eq!(value[5]["content"][0]["parameters"]["id"], "searchBooks.0.items.0.id");
    }

    #[test]
    fn candidate_tools_are_canonical() {
        let out = convert(&[entry()]);
        let names: Vec<_> = out.catalog.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["getBook", "searchBooks"]);
        let search = out.catalog.iter().find(|t| t.name == "searchBooks").unwrap();
        assert_eq!(search.response["res"].kind, "Array");
        assert_eq!(search.parameters.required, vec!["q".to_string()]);
    }

    #[test]
    fn entries_without_instances_do_not_take_an_index() {
        let empty = json!({"Function_Description": {"x": "X.\nParameters: {}\nOutput: y\n"}, "Instances": []});
        let broken = json!({"Function_Description": {"x": 5}, "Instances": [{"output": "o"}]});
        let out = convert(&[empty, broken, entry()]);
        assert_eq!(out.summary.errors, 2);
        assert_eq!(out.conversations.len(), 1);
        assert_eq!(out.catalog.len(), 2);
    }
}
