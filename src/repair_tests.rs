use super::*;
use serde_json::json;

// -- individual passes --------------------------------------------------

#[test]
fn swap_quotes_converts_single_quoted_document() {
    assert_eq!(
        swap_quotes("{'name': 'GetUser', 'limit': 3}"),
        r#"{"name": "GetUser", "limit": 3}"#
    );
}

#[test]
fn swap_quotes_keeps_apostrophe_inside_double_quoted_value() {
    assert_eq!(
        swap_quotes(r#"{'description': "Get the user's id"}"#),
        r#"{"description": "Get the user's id"}"#
    );
}

#[test]
fn swap_quotes_ignores_unpaired_trailing_quote() {
    assert_eq!(swap_quotes(r#"'a' "b"#), r#""a" "b"#);
}

#[test]
fn swap_quotes_preserves_multibyte_text() {
    assert_eq!(swap_quotes("{'城市': '北京'}"), "{\"城市\": \"北京\"}");
}

#[test]
fn booleans_normalized() {
    assert_eq!(
        normalize_booleans(r#"{"required": True, "x": False}"#),
        r#"{"required": true, "x": false}"#
    );
}

#[test]
fn backslashes_stripped() {
    assert_eq!(strip_backslashes(r#"{\"a\": 1}"#), r#"{"a": 1}"#);
}

#[test]
fn bare_types_quoted() {
    assert_eq!(
        bare_type_literals(r#"{"type": str, "n": {"type": int}}"#),
        r#"{"type": "str", "n": {"type": "int"}}"#
    );
}

#[test]
fn possessives_restored() {
    assert_eq!(
        possessives(r#"the user"s name and the patient"s id"#),
        "the user's name and the patient's id"
    );
}

#[test]
fn none_placeholders_become_empty_objects() {
    assert_eq!(
        none_placeholders(r#"{"a": {"none"}, "output_parameters": None}"#),
        r#"{"a": {}, "output_parameters": {}}"#
    );
}

#[test]
fn lab_test_record_patched() {
    let patched = lab_test_scheduler_record(&format!("prefix {LAB_TEST_TRUNCATED}"));
    assert_eq!(patched, format!("prefix {LAB_TEST_COMPLETE}"));
    let value: Value = serde_json::from_str(LAB_TEST_COMPLETE).unwrap();
    assert_eq!(value["output_parameters"]["appointment_id"]["type"], "int");
}

// -- pipeline -----------------------------------------------------------

#[test]
fn passes_run_in_declared_order() {
    fn upper(s: &str) -> String {
        s.to_uppercase()
    }
    fn suffix(s: &str) -> String {
        format!("{s}-done")
    }
    let passes = [
        RewritePass {
            name: "upper",
            rewrite: upper,
        },
        RewritePass {
            name: "suffix",
            rewrite: suffix,
        },
    ];
    assert_eq!(apply_passes("ab", &passes), "AB-done");
}

#[test]
fn search_api_passes_are_uniquely_named() {
    let mut names: Vec<&str> = SEARCH_API_PASSES.iter().map(|p| p.name).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), SEARCH_API_PASSES.len());
}

#[test]
fn parse_python_style_tool_document() {
    let raw = "{'name': 'QueryStock', 'description': \"Query a stock's price\", \
               'input_parameters': {'stock_code': {'type': str, 'description': 'The code.'}}, \
               'output_parameters': {'stock_price': {'type': 'float', 'required': True}}}";
    assert_eq!(
        parse_search_api(raw),
        json!({
            "name": "QueryStock",
            "description": "Query a stock's price",
            "input_parameters": {"stock_code": {"type": "str", "description": "The code."}},
            "output_parameters": {"stock_price": {"type": "float", "required": true}}
        })
    );
}

#[test]
fn parse_none_output_parameters() {
    let raw = "{'name': 'Ping', 'description': 'x', 'input_parameters': {}, 'output_parameters': None}";
    assert_eq!(parse_search_api(raw)["output_parameters"], json!({}));
}

#[test]
fn parse_unrepairable_is_empty_mapping() {
    assert_eq!(parse_search_api("name: Ping, nothing else"), json!({}));
}
