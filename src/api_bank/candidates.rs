//! Candidate tool documents embedded in API-Bank prompts.

use crate::error::ConvertError;
use crate::json_scan::{extract_objects_after, extract_objects_at};
use crate::schema::{normalize_api, ApiConvention, ToolSchema};

const API_CODE_MARKER: &str = "{\"apiCode\"";
const DESCRIPTIONS_MARKER: &str = "API descriptions:";

/// Every `{"apiCode": ...}` document in `text`.
///
/// # Errors
///
/// Returns [`ConvertError::MalformedRecord`] when a parsed document lacks
/// its `apiCode`.
pub fn by_api_code(text: &str) -> Result<Vec<ToolSchema>, ConvertError> {
    extract_objects_at(text, API_CODE_MARKER)
        .iter()
        .map(|api| normalize_api(api, ApiConvention::ApiCode))
        .collect()
}

/// The run of `name`-keyed documents after `API descriptions:`.
///
/// # Errors
///
/// Returns [`ConvertError::MalformedRecord`] when a document lacks its `name`.
pub fn by_name(text: &str) -> Result<Vec<ToolSchema>, ConvertError> {
    extract_objects_after(text, DESCRIPTIONS_MARKER)
        .iter()
        .map(|api| normalize_api(api, ApiConvention::Named))
        .collect()
}
