use super::*;
use serde_json::json;

const QUERY_ALARM: &str = r#"{"apiCode": "QueryAlarm", "description": "Query alarms", "parameters": {"time": {"type": "str", "description": "Time", "required": true}}, "response": {"type": "object", "properties": {"alarms": {"type": "list", "description": "Alarms"}}}}"#;
const DELETE_ALARM: &str = r#"{"apiCode": "DeleteAlarm", "description": "Delete an alarm", "parameters": {"id": {"type": "str", "description": "Alarm id", "required": true}}, "response": {}}"#;

fn train_record(input: &str, output: &str) -> Value {
    json!({"input": input, "output": output})
}

fn train_records() -> Vec<Value> {
    let first = format!("Candidates: {QUERY_ALARM}\nUser: Check my 7am alarm\n");
    let second = format!("{first}API-Request: [QueryAlarm(time='07:00')]->{{'alarms': []}}\n");
    vec![
        train_record(&first, "API-Request: [QueryAlarm(time='07:00')]"),
        train_record(&second, "AI: You have no alarm at 7am."),
        train_record(
            &format!("Candidates: {DELETE_ALARM}\nUser: Delete alarm 3\n"),
            "API-Request: [AddAlarm(id='3')]",
        ),
        train_record("User: Anything else?\n", "Done."),
    ]
}

#[test]
fn train_snapshots_become_conversations() {
    let out = convert_train(&train_records(), Level::Lv1);
    assert_eq!(out.summary.accepted, 1);
    assert_eq!(out.summary.rejected, 1);
    assert_eq!(out.summary.errors, 1);
    assert_eq!(out.summary.file, "lv1_train.jsonl");

    let value = serde_json::to_value(&out.conversations[0]).unwrap();
    let roles: Vec<_> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|turn| turn["role"].as_str().unwrap())
        .collect();
    assert_eq!(
        roles,
        vec!["id", "candidate_tools", "user", "tool_call", "tool_response", "assistant"]
    );
    assert_eq!(value[0]["content"], "API-Bank_lv1_train_0");
    assert_eq!(value[1]["content"][0]["name"], "QueryAlarm");
    assert_eq!(value[2]["content"], "Check my 7am alarm");
    assert_eq!(value[3]["content"][0]["parameters"], json!({"time": "07:00"}));
    assert!(value[3]["content"][0].get("depend_on").is_none());
    assert_eq!(value[4]["content"], json!({"QueryAlarm.0": {"alarms": []}}));
    assert_eq!(value[5]["content"], "You have no alarm at 7am.");
}

#[test]
fn rejected_record_still_feeds_catalog() {
    let out = convert_train(&train_records(), Level::Lv1);
    let names: Vec<_> = out.catalog.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"DeleteAlarm"));
}

#[test]
fn train_output_request_is_call_without_response() {
    let records = vec![train_record(
        &format!("{QUERY_ALARM}\nUser: Check my alarm\n"),
        "API-Request: [QueryAlarm(time='08:00')]",
    )];
    let out = convert_train(&records, Level::Lv1);
    let turns = &out.conversations[0];
    assert_eq!(turns.last().map(Turn::role), Some("tool_call"));
}

fn lv2_instruction() -> String {
    let searcher = r#"{"name": "ToolSearcher", "description": "Search tools", "input_parameters": {"keywords": {"type": "str", "description": "Keywords", "required": true}}, "output_parameters": {}}"#;
    format!("Generate a request.\nAPI descriptions:\n{searcher}\n")
}

#[test]
fn test_records_pick_largest_step_per_group() {
    let base = "User: Schedule a sync meeting\n\
                API-Request: [ToolSearcher(keywords='meeting')]->{'name': 'AddMeeting', 'description': 'Add a meeting', \
                'input_parameters': {'topic': {'type': 'str', 'description': 'Topic', 'required': True}}, 'output_parameters': {}}\n";
    let full = format!("{base}API-Request: [AddMeeting(topic='sync')]->'ok'\n");
    let records = vec![
        json!({"instruction": lv2_instruction(), "input": base, "expected_output": "API-Request: [AddMeeting(topic='sync')]", "file": "meeting.jsonl", "id": 0}),
        json!({"instruction": lv2_instruction(), "input": full, "expected_output": "Your meeting is booked.", "file": "meeting.jsonl", "id": 1}),
        json!({"instruction": lv2_instruction(), "input": "User: hi\n", "expected_output": "Hello!", "file": "greet.jsonl", "id": 0}),
    ];
    let out = convert_test(&records, Level::Lv2);
    assert_eq!(out.summary.accepted, 2);
    assert_eq!(out.summary.file, "lv2_test.jsonl");

    let meeting = serde_json::to_value(&out.conversations[0]).unwrap();
    assert_eq!(meeting[0]["content"], "API-Bank_lv2_test_0");
    let candidates: Vec<_> = meeting[1]["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(candidates.len(), 2);
    assert!(candidates.contains(&"AddMeeting"));
    assert!(candidates.contains(&"ToolSearcher"));
    assert_eq!(meeting[4]["content"]["ToolSearcher.0"]["best_matchs"]["name"], "AddMeeting");
    assert_eq!(meeting[6]["content"], json!({"AddMeeting.0": {"output": "ok"}}));
    assert_eq!(meeting[7]["content"], "Your meeting is booked.");

    let greet = serde_json::to_value(&out.conversations[1]).unwrap();
    assert_eq!(greet[0]["content"], "API-Bank_lv2_test_1");
}

#[test]
fn test_lv1_search_results_are_not_candidates() {
    let input = "User: Find a tool\n\
                 API-Request: [ToolSearcher(keywords='meeting')]->{'name': 'AddMeeting', 'description': 'Add', 'input_parameters': {}, 'output_parameters': {}}\n\
                 API-Request: [AddMeeting(topic='sync')]->'ok'\n";
    let records = vec![json!({
        "instruction": lv2_instruction(),
        "input": input,
        "expected_output": "Done",
        "file": "f",
        "id": 3
    })];
    let out = convert_test(&records, Level::Lv1);
    assert_eq!(out.summary.accepted, 0);
    assert_eq!(out.summary.rejected, 1);
}

#[test]
fn test_lv3_groups_by_sample_id() {
    let records = vec![
        json!({"instruction": "", "input": format!("{QUERY_ALARM}\nUser: alarm?\n"), "output": "first", "sample_id": 7, "api_id": 2}),
        json!({"instruction": "", "input": format!("{QUERY_ALARM}\nUser: alarm?\n"), "output": "second", "sample_id": 7, "api_id": 1}),
    ];
    let out = convert_test(&records, Level::Lv3);
    assert_eq!(out.conversations.len(), 1);
    let value = serde_json::to_value(&out.conversations[0]).unwrap();
    assert_eq!(value[0]["content"], "API-Bank_lv3_test_0");
    assert_eq!(value[3]["content"], "first");
}

#[test]
fn malformed_test_record_is_counted() {
    let records = vec![json!({"file": "f", "id": 1})];
    let out = convert_test(&records, Level::Lv2);
    assert_eq!(out.summary.errors, 1);
    assert!(out.conversations.is_empty());
}

#[test]
fn level_labels_and_paths() {
    assert_eq!(Level::from_label("lv2"), Some(Level::Lv2));
    assert_eq!(Level::from_number("3"), Some(Level::Lv3));
    assert_eq!(Level::from_label("lv4"), None);
    assert_eq!(
        Level::Lv1.input_file(Split::Train),
        "training-data/lv1-response-train.json"
    );
    assert_eq!(
        Level::Lv3.input_file(Split::Test),
        "test-data/level-3-batch-inf-response.json"
    );
    assert_eq!(Level::Lv2.input_file(Split::Test), "test-data/level-2-response.json");
    assert_eq!(Level::Lv3.output_file(Split::Train), "lv3_train.jsonl");
    assert_eq!(Level::Lv3.output_file(Split::Test), "lv3_test.jsonl");
}
