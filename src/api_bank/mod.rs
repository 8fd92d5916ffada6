//! API-Bank conversion.
//!
//! Train files hold step-level snapshots of growing transcripts; test files
//! are grouped by `file` (levels 1 and 2) or `sample_id` (level 3). The last
//! snapshot of every conversation becomes one normalized record.

pub mod candidates;
pub mod dialogue;
pub mod request;
pub mod segment;

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use self::dialogue::{first_user_query, parse_dialogue, RawTurn};
use crate::conversation::{ConversationBuilder, Turn};
use crate::error::ConvertError;
use crate::observability::FileSummary;
use crate::schema::{ToolCatalog, ToolSchema};
use crate::validate::{first_unknown_call, with_id};

const SEARCH_TOOL: &str = "ToolSearcher";
const API_REQUEST_MARKER: &str = "API-Request: ";
const AI_MARKER: &str = "AI:";

/// Difficulty level of an API-Bank file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Lv1,
    Lv2,
    Lv3,
}

/// Which half of the corpus a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Lv1, Level::Lv2, Level::Lv3];

    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Level::Lv1 => 1,
            Level::Lv2 => 2,
            Level::Lv3 => 3,
        }
    }

    /// `"lv1"` ... `"lv3"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Level::Lv1 => "lv1",
            Level::Lv2 => "lv2",
            Level::Lv3 => "lv3",
        }
    }

    /// Parse a train level label (`lv1`).
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.label() == label)
    }

    /// Parse a test level number (`1`).
    #[must_use]
    pub fn from_number(number: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.number().to_string() == number)
    }

    /// Whether `ToolSearcher` results count as candidate tools.
    #[must_use]
    pub fn exposes_tool_search(self) -> bool {
        matches!(self, Level::Lv2 | Level::Lv3)
    }

    /// Input path relative to the corpus source directory.
    #[must_use]
    pub fn input_file(self, split: Split) -> String {
        match (split, self) {
            (Split::Train, _) => format!("training-data/{}-response-train.json", self.label()),
            (Split::Test, Level::Lv3) => "test-data/level-3-batch-inf-response.json".to_string(),
            (Split::Test, _) => format!("test-data/level-{}-response.json", self.number()),
        }
    }

    /// Output file name.
    #[must_use]
    pub fn output_file(self, split: Split) -> String {
        match split {
            Split::Train => format!("{}_train.jsonl", self.label()),
            Split::Test => format!("lv{}_test.jsonl", self.number()),
        }
    }

    fn record_id(self, split: Split, index: usize) -> String {
        match split {
            Split::Train => format!("API-Bank_{}_train_{index}", self.label()),
            Split::Test => format!("API-Bank_lv{}_test_{index}", self.number()),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TrainRecord {
    input: String,
    output: String,
}

#[derive(Debug, Deserialize)]
struct TestRecord {
    #[serde(default)]
    instruction: String,
    input: String,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    expected_output: Option<String>,
}

/// Converted records of one file plus the tools they declared.
#[derive(Debug, Default)]
pub struct LevelOutput {
    pub conversations: Vec<Vec<Turn>>,
    pub catalog: ToolCatalog,
    pub summary: FileSummary,
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// Convert a train file's records.
#[must_use]
pub fn convert_train(records: &[Value], level: Level) -> LevelOutput {
    let queries: Vec<Option<&str>> = records
        .iter()
        .map(|record| record.get("input").and_then(Value::as_str).and_then(first_user_query))
        .collect();
    let results = segment::conversation_ends(&queries)
        .into_iter()
        .map(|idx| format_train_record(&records[idx], level));
    collect_level(results, level, Split::Train)
}

/// Convert a test file's records.
#[must_use]
pub fn convert_test(records: &[Value], level: Level) -> LevelOutput {
    let (group_field, step_field) = match level {
        Level::Lv3 => ("sample_id", "api_id"),
        Level::Lv1 | Level::Lv2 => ("file", "id"),
    };
    let keyed = records.iter().map(|record| {
        let group = record.get(group_field).map(Value::to_string).unwrap_or_default();
        let step = record
            .get(step_field)
            .and_then(step_value)
            .unwrap_or(f64::NEG_INFINITY);
        (group, step)
    });
    let results = segment::latest_per_group(keyed)
        .into_iter()
        .map(|idx| format_test_record(&records[idx], level));
    collect_level(results, level, Split::Test)
}

fn step_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn collect_level(
    results: impl Iterator<Item = Result<Vec<Turn>, ConvertError>>,
    level: Level,
    split: Split,
) -> LevelOutput {
    let mut out = LevelOutput {
        summary: FileSummary::new(level.output_file(split)),
        ..LevelOutput::default()
    };
    for (index, result) in results.enumerate() {
        let turns = match result {
            Ok(turns) => turns,
            Err(err) => {
                tracing::warn!(%level, index, "record dropped: {err}");
                out.summary.errors += 1;
                continue;
            }
        };
        if let Some(Turn::CandidateTools { content }) = turns.first() {
            out.catalog.extend(content.iter().cloned());
        }
        if let Some(name) = first_unknown_call(&turns) {
            tracing::debug!(%level, index, tool = name, "conversation calls a tool outside its candidates");
            out.summary.rejected += 1;
            continue;
        }
        out.conversations.push(with_id(level.record_id(split, index), turns));
        out.summary.accepted += 1;
    }
    out.summary.log();
    out
}

fn format_train_record(record: &Value, level: Level) -> Result<Vec<Turn>, ConvertError> {
    let record = TrainRecord::deserialize(record)
        .map_err(|err| ConvertError::malformed(format!("train record: {err}")))?;
    let mut dialogue = parse_dialogue(&record.input);
    if record.output.contains(API_REQUEST_MARKER) {
        dialogue.push(RawTurn::ApiRequest(record.output.clone()));
    } else {
        let reply = record
            .output
            .split(AI_MARKER)
            .nth(1)
            .ok_or_else(|| ConvertError::malformed("train output has neither API-Request nor AI reply"))?;
        dialogue.push(RawTurn::Ai(reply.trim().to_string()));
    }
    let declared = candidates::by_api_code(&record.input)?;
    assemble(dialogue, declared, level, Split::Train)
}

fn format_test_record(record: &Value, level: Level) -> Result<Vec<Turn>, ConvertError> {
    let record = TestRecord::deserialize(record)
        .map_err(|err| ConvertError::malformed(format!("test record: {err}")))?;
    let expected = match level {
        Level::Lv3 => record.output,
        Level::Lv1 | Level::Lv2 => record.expected_output,
    }
    .ok_or_else(|| ConvertError::malformed("test record has no expected output"))?;
    let mut dialogue = parse_dialogue(&record.input);
    dialogue.push(RawTurn::Ai(expected));
    let declared = match level {
        Level::Lv3 => candidates::by_api_code(&record.input)?,
        Level::Lv1 | Level::Lv2 => candidates::by_name(&record.instruction)?,
    };
    assemble(dialogue, declared, level, Split::Test)
}

/// Build the normalized turns; the candidate turn unions declared tools
/// with those found through `ToolSearcher`.
fn assemble(
    dialogue: Vec<RawTurn>,
    declared: Vec<ToolSchema>,
    level: Level,
    split: Split,
) -> Result<Vec<Turn>, ConvertError> {
    let mut builder = ConversationBuilder::new();
    let mut candidates = ToolCatalog::new();
    for raw in dialogue {
        match raw {
            RawTurn::User(content) => builder.user(content.trim()),
            RawTurn::Ai(content) => builder.assistant(content.trim()),
            RawTurn::ApiRequest(content) => {
                let content = content.trim();
                if content.contains(SEARCH_TOOL) {
                    request::tool_search(content, level, split, &mut builder, &mut candidates)?;
                } else {
                    request::api_request(content, &mut builder);
                }
            }
        }
    }
    candidates.extend(declared);

    let mut turns = vec![Turn::CandidateTools {
        content: candidates.into_tools(),
    }];
    turns.extend(builder.finish());
    Ok(turns)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
