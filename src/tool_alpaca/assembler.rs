//! One ToolAlpaca instance to one conversation.

use serde::Deserialize;
use serde_json::Value;

use crate::call_parser::parse_action_input;
use crate::conversation::{ConversationBuilder, ToolCall, Turn};
use crate::error::ConvertError;
use crate::json_scan::{extract_between, SpanEnd};
use crate::resolver::resolve_arguments;
use crate::schema::{truthy, value_text};

const NOT_APPLICABLE: &str = "N/A";
const DETAILS_ACTION: &str = "getDetails";
const RESPONSE_MARKER: &str = "Response:";

/// A recorded agent run.
#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    #[serde(default)]
    pub input: Option<String>,
    pub output: String,
    #[serde(rename = "Final Thought", default)]
    pub final_thought: Option<String>,
    #[serde(default)]
    pub intermediate_steps: Vec<Step>,
}

/// `[[action, action_input, log], observation]`.
#[derive(Debug, Clone, Deserialize)]
pub struct Step(pub StepAction, pub String);

#[derive(Debug, Clone, Deserialize)]
pub struct StepAction(pub String, pub Value, pub Value);

/// Assemble the turns of one instance.
///
/// Returns `Ok(None)` for an instance without user input. Steps marked
/// `N/A` are skipped; `getDetails` steps become an assistant question and
/// the user's answer; every other step is a tool call, resolved against
/// earlier responses, followed by its response.
///
/// # Errors
///
/// Fails when an action input is neither JSON nor a literal, or a
/// `getDetails` input carries no question; the conversation is dropped.
pub fn assemble_instance(instance: &Instance) -> Result<Option<Vec<Turn>>, ConvertError> {
    let Some(input) = &instance.input else {
        return Ok(None);
    };
    let mut builder = ConversationBuilder::new();
    builder.user(input.as_str());

    for Step(StepAction(action, action_input, _log), observation) in &instance.intermediate_steps {
        if action == NOT_APPLICABLE || action_input.as_str() == Some(NOT_APPLICABLE) {
            continue;
        }
        if action == DETAILS_ACTION {
            builder.assistant(clarifying_question(action_input)?);
            builder.user(observation.as_str());
            continue;
        }

        let mut parameters = parse_action_input(action_input)?;
        let depend_on = resolve_arguments(&mut parameters, builder.context().cache());
        let key = builder.call(ToolCall {
            name: action.clone(),
            parameters,
            depend_on: Some(depend_on),
        });
        builder.respond(key, observation_payload(observation));
    }

    if let Some(thought) = &instance.final_thought {
        builder.hidden_assistant(thought.as_str());
    }
    builder.assistant(instance.output.as_str());
    Ok(Some(builder.finish()))
}

fn clarifying_question(action_input: &Value) -> Result<String, ConvertError> {
    let text = action_input
        .as_str()
        .ok_or_else(|| ConvertError::malformed("getDetails input is not a string"))?;
    let parsed: Value = serde_json::from_str(text)
        .map_err(|err| ConvertError::malformed(format!("getDetails input: {err}")))?;
    parsed
        .get("Question")
        .map(value_text)
        .ok_or_else(|| ConvertError::malformed("getDetails input has no Question"))
}

/// The JSON after `Response:`, or the whole observation when there is none.
fn observation_payload(observation: &str) -> Value {
    match extract_between(observation, RESPONSE_MARKER, SpanEnd::EndOfText) {
        Some(value) if truthy(&value) => value,
        _ => Value::String(observation.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(value: Value) -> Instance {
        serde_json::from_value(value).unwrap()
    }

    fn assemble(value: Value) -> Value {
        let turns = assemble_instance(&instance(value)).unwrap().unwrap();
        serde_json::to_value(turns).unwrap()
    }

    #[test]
    fn chained_calls_link_dependencies() {
        let value = assemble(json!({
            "input": "Find the author of Dune",
            "output": "Frank Herbert wrote it.",
            "Final Thought": "The second lookup answered the question.",
            "intermediate_steps": [
                [["searchBooks", "{\"q\": \"Dune\"}", "log"],
                 "Status Code: 200. Response: {\"books\": [{\"id\": \"b7\", \"title\": \"Dune\"}]}"],
                [["getBook", "{\"id\": \"b7\"}", "log"],
                 "Status Code: 200. Response: {\"author\": \"Frank Herbert\"}"]
            ]
        }));
        assert_eq!(
            value,
            json!([
                {"role": "user", "content": "Find the author of Dune"},
                {"role": "tool_call", "content": [{"name": "searchBooks", "parameters": {"q": "Dune"}, "depend_on": []}]},
                {"role": "tool_response", "content": {"searchBooks.0": {"books": [{"id": "b7", "title": "Dune"}]}}},
                {"role": "tool_call", "content": [{"name": "getBook", "parameters": {"id": "searchBooks.0.books.0.id"}, "depend_on": ["searchBooks.0"]}]},
                {"role": "tool_response", "content": {"getBook.0": {"author": "Frank Herbert"}}},
                {"role": "assistant", "hidden": true, "content": "The second lookup answered the question."},
                {"role": "assistant", "content": "Frank Herbert wrote it."}
            ])
        );
    }

    #[test]
    fn repeated_tool_keys_increment() {
        let value = assemble(json!({
            "input": "twice",
            "output": "ok",
            "intermediate_steps": [
                [["ping", "{}", ""], "Response: {\"n\": 1}"],
                [["ping", "{}", ""], "Response: {\"n\": 2}"]
            ]
        }));
        assert_eq!(value[2]["content"], json!({"ping.0": {"n": 1}}));
        assert_eq!(value[4]["content"], json!({"ping.1": {"n": 2}}));
    }

    #[test]
    fn non_json_observation_kept_as_text() {
        let value = assemble(json!({
            "input": "status",
            "output": "down",
            "intermediate_steps": [
                [["status", null, ""], "Status Code: 500. Internal error"],
                [["status", "{}", ""], "Response: []"]
            ]
        }));
        assert_eq!(value[1]["content"][0]["parameters"], json!({}));
        assert_eq!(
            value[2]["content"]["status.0"],
            json!({"output": "Status Code: 500. Internal error"})
        );
        assert_eq!(value[4]["content"]["status.1"], json!({"output": "Response: []"}));
    }

    #[test]
    fn list_response_wrapped() {
        let value = assemble(json!({
            "input": "list",
            "output": "done",
            "intermediate_steps": [[["list", "{}", ""], "Response: [1, 2]"]]
        }));
        assert_eq!(value[2]["content"]["list.0"], json!({"output": [1, 2]}));
    }

    #[test]
    fn response_keeps_document_order_for_linking() {
        let turns = assemble_instance(&instance(json!({
            "input": "Show my orders",
            "output": "None yet.",
            "intermediate_steps": [
                [["getProfile", "{}", ""], "Response: {\"user\": {\"id\": 5}, \"account\": {\"id\": 5}}"],
                [["getOrders", "{\"uid\": 5}", ""], "Response: []"]
            ]
        })))
        .unwrap()
        .unwrap();
        let line = serde_json::to_string(&turns).unwrap();
        assert!(line.contains(r#"{"getProfile.0":{"user":{"id":5},"account":{"id":5}}}"#));
        let value = serde_json::to_value(&turns).unwrap();
        assert_eq!(value[3]["content"][0]["parameters"]["uid"], "getProfile.0.user.id");
        assert_eq!(value[3]["content"][0]["depend_on"], json!(["getProfile.0"]));
    }

    #[test]
    fn details_step_becomes_question_and_answer() {
        let value = assemble(json!({
            "input": "Book a table",
            "output": "Booked.",
            "intermediate_steps": [
                [["getDetails", "{\"Question\": \"For how many people?\"}", ""], "Four"],
                [["N/A", "N/A", ""], "nothing"]
            ]
        }));
        assert_eq!(
            value,
            json!([
                {"role": "user", "content": "Book a table"},
                {"role": "assistant", "content": "For how many people?"},
                {"role": "user", "content": "Four"},
                {"role": "assistant", "content": "Booked."}
            ])
        );
    }

    #[test]
    fn literal_action_input_accepted() {
        let value = assemble(json!({
            "input": "weather",
            "output": "sunny",
            "intermediate_steps": [[["getWeather", "{'city': 'Paris', 'metric': True}", ""], "Response: {\"sky\": \"sunny\"}"]]
        }));
        assert_eq!(
            value[1]["content"][0]["parameters"],
            json!({"city": "Paris", "metric": true})
        );
    }

    #[test]
    fn unparseable_action_input_drops_conversation() {
        let inst = instance(json!({
            "input": "weather",
            "output": "sunny",
            "intermediate_steps": [[["getWeather", "city=Paris", ""], "Response: {}"]]
        }));
        assert!(assemble_instance(&inst).is_err());
    }

    #[test]
    fn instance_without_input_is_skipped() {
        let inst = instance(json!({"output": "x", "intermediate_steps": []}));
        assert!(assemble_instance(&inst).unwrap().is_none());
    }
}
