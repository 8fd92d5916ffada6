use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConvertError;
use crate::schema::ToolCatalog;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ConvertError + '_ {
    move |source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a whole JSON document.
///
/// # Errors
///
/// Returns [`ConvertError::Io`] or [`ConvertError::Json`] naming `path`.
pub fn read_json(path: &Path) -> Result<Value, ConvertError> {
    let text = fs::read_to_string(path).map_err(io_err(path))?;
    serde_json::from_str(&text).map_err(|source| ConvertError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a JSON document whose top level is an array of records.
///
/// # Errors
///
/// As [`read_json`], plus [`ConvertError::Internal`] when the top level is
/// not an array.
pub fn read_records(path: &Path) -> Result<Vec<Value>, ConvertError> {
    match read_json(path)? {
        Value::Array(records) => Ok(records),
        _ => Err(ConvertError::Internal(format!(
            "{} does not hold a list of records",
            path.display()
        ))),
    }
}

/// Write one JSON value per line, joined by `\n`, creating parent directories.
///
/// # Errors
///
/// Returns [`ConvertError::Io`] on filesystem failure.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<(), ConvertError> {
    let lines = items
        .iter()
        .map(|item| {
            serde_json::to_string(item)
                .map_err(|err| ConvertError::Internal(format!("serialization: {err}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    write_lines(path, lines.iter().map(String::as_str))
}

/// Write a catalog as canonical JSON lines.
///
/// # Errors
///
/// Returns [`ConvertError::Io`] on filesystem failure.
pub fn write_catalog(path: &Path, catalog: &ToolCatalog) -> Result<(), ConvertError> {
    write_lines(path, catalog.canonical_lines())
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a str>) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let body = lines.collect::<Vec<_>>().join("\n");
    fs::write(path, body).map_err(io_err(path))?;
    tracing::debug!(path = %path.display(), "written");
    Ok(())
}
