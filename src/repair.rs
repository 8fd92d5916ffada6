//! Best-effort repair of quasi-JSON API descriptions.
//!
//! The ToolSearcher transcripts print tool documents with single quotes,
//! capitalized booleans, stray backslashes and a handful of known-bad
//! records. Repair is an ordered list of named textual passes; each pass is a
//! plain function so it can be tested on its own.

use memchr::memchr_iter;
use serde_json::Value;

/// One named textual rewrite.
#[derive(Debug, Clone, Copy)]
pub struct RewritePass {
    pub name: &'static str,
    pub rewrite: fn(&str) -> String,
}

/// Passes applied to ToolSearcher API strings, in order.
pub const SEARCH_API_PASSES: &[RewritePass] = &[
    RewritePass {
        name: "swap_quotes",
        rewrite: swap_quotes,
    },
    RewritePass {
        name: "normalize_booleans",
        rewrite: normalize_booleans,
    },
    RewritePass {
        name: "strip_backslashes",
        rewrite: strip_backslashes,
    },
    RewritePass {
        name: "bare_type_literals",
        rewrite: bare_type_literals,
    },
    RewritePass {
        name: "possessives",
        rewrite: possessives,
    },
    RewritePass {
        name: "none_placeholders",
        rewrite: none_placeholders,
    },
    RewritePass {
        name: "lab_test_scheduler_record",
        rewrite: lab_test_scheduler_record,
    },
];

/// Run `passes` over `input` in order.
#[must_use]
pub fn apply_passes(input: &str, passes: &[RewritePass]) -> String {
    let mut text = input.to_string();
    for pass in passes {
        let next = (pass.rewrite)(&text);
        if next != text {
            tracing::trace!(pass = pass.name, "rewrite pass changed input");
        }
        text = next;
    }
    text
}

/// Repair a ToolSearcher API string and parse it.
///
/// Anything that still fails to parse becomes an empty mapping.
#[must_use]
pub fn parse_search_api(input: &str) -> Value {
    let repaired = apply_passes(input, SEARCH_API_PASSES);
    serde_json::from_str(&repaired).unwrap_or_else(|err| {
        tracing::debug!("repaired API string still invalid: {err}");
        Value::Object(serde_json::Map::new())
    })
}

/// Turn `'` into `"`, then restore apostrophes inside spans that were
/// already double-quoted in the input (`"user's id"` stays one string).
///
/// Spans are the pairs (1st, 2nd), (3rd, 4th), ... of the original `"`
/// positions. Only ASCII bytes are swapped, so UTF-8 stays valid.
fn swap_quotes(input: &str) -> String {
    let mut bytes = input.as_bytes().to_vec();
    let positions: Vec<usize> = memchr_iter(b'"', &bytes).collect();
    for byte in &mut bytes {
        if *byte == b'\'' {
            *byte = b'"';
        }
    }
    for pair in positions.chunks_exact(2) {
        for byte in &mut bytes[pair[0] + 1..pair[1]] {
            if *byte == b'"' {
                *byte = b'\'';
            }
        }
    }
    String::from_utf8(bytes).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

fn normalize_booleans(input: &str) -> String {
    input.replace("True", "true").replace("False", "false")
}

fn strip_backslashes(input: &str) -> String {
    input.replace('\\', "")
}

fn bare_type_literals(input: &str) -> String {
    input
        .replace(r#""type": str"#, r#""type": "str""#)
        .replace(r#""type": int"#, r#""type": "int""#)
}

fn possessives(input: &str) -> String {
    input
        .replace(r#"user"s"#, "user's")
        .replace(r#"patient"s"#, "patient's")
}

fn none_placeholders(input: &str) -> String {
    input
        .replace(r#"{"none"}"#, "{}")
        .replace(r#""output_parameters": None"#, r#""output_parameters": {}"#)
}

const LAB_TEST_TRUNCATED: &str = r#"{"name": "LabTestAppointmentScheduler", "description": "API for scheduling lab test appointments in a specific location.", "input_parameters": {"test_type": {"type": "str", "description": "The type of lab test to be performed."}, "location": {"type...test appoinment.", "time_slot": {"type": "datetime", "description": "The desired time slot for the lab test appointment.", "format": "YYYY-MM-DD HH:MM:SS"}}}"#;

const LAB_TEST_COMPLETE: &str = r#"{"name": "LabTestAppointmentScheduler", "description": "API for scheduling lab test appointments.", "input_parameters": {"test_type": {"type": "str", "description": "The type of lab test to be conducted."}, "appointment_date": {"type": "str", "description": "The desired date for the appointment."}, "appointment_time": {"type": "str", "description": "The desired time for the appointment."}}, "output_parameters": {"appointment_id": {"type": "int", "description": "The unique ID for the scheduled appointment."}}}"#;

/// One ToolSearcher record is truncated mid-document in the corpus.
fn lab_test_scheduler_record(input: &str) -> String {
    input.replace(LAB_TEST_TRUNCATED, LAB_TEST_COMPLETE)
}

#[cfg(test)]
#[path = "repair_tests.rs"]
mod tests;
