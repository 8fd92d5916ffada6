//! Per-corpus driver: read source files, convert, write records and catalogs.

pub mod io;

use std::path::{Path, PathBuf};

pub use crate::schema::ToolCatalog;

use crate::api_bank::{self, Level, Split};
use crate::config::{ApiBankConfig, AppConfig, PathsConfig, ToolAlpacaConfig};
use crate::error::ConvertError;
use crate::observability::RunSummary;
use crate::tool_alpaca;

pub const API_BANK_DIR: &str = "API-Bank";
pub const TOOL_ALPACA_DIR: &str = "ToolAlpaca";
pub const CATALOG_FILE: &str = "tools_with_doc.jsonl";

/// Which corpora a run converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corpus {
    ApiBank,
    ToolAlpaca,
    All,
}

/// Source, output and catalog directories of one corpus.
#[derive(Debug, Clone)]
pub struct CorpusDirs {
    pub source: PathBuf,
    pub output: PathBuf,
    pub catalog: PathBuf,
}

impl CorpusDirs {
    #[must_use]
    pub fn new(paths: &PathsConfig, corpus_dir: &str) -> Self {
        Self {
            source: paths.source_root.join(corpus_dir),
            output: paths.output_root.join(corpus_dir),
            catalog: paths.catalog_root.join(corpus_dir),
        }
    }
}

/// Convert every configured API-Bank level and write its catalog.
///
/// # Errors
///
/// Fails on an unreadable input file, an unknown level, or a write error.
pub fn run_api_bank(
    dirs: &CorpusDirs,
    settings: &ApiBankConfig,
    summary: &mut RunSummary,
) -> Result<ToolCatalog, ConvertError> {
    let mut catalog = ToolCatalog::new();
    for label in &settings.train_levels {
        let level = Level::from_label(label)
            .ok_or_else(|| ConvertError::Config(format!("unknown train level '{label}'")))?;
        let records = io::read_records(&dirs.source.join(level.input_file(Split::Train)))?;
        tracing::info!(%level, records = records.len(), "converting API-Bank train data");
        let out = api_bank::convert_train(&records, level);
        io::write_jsonl(&dirs.output.join(level.output_file(Split::Train)), &out.conversations)?;
        catalog.merge(out.catalog);
        summary.push(out.summary);
    }
    for number in &settings.test_levels {
        let level = Level::from_number(number)
            .ok_or_else(|| ConvertError::Config(format!("unknown test level '{number}'")))?;
        let records = io::read_records(&dirs.source.join(level.input_file(Split::Test)))?;
        tracing::info!(%level, records = records.len(), "converting API-Bank test data");
        let out = api_bank::convert_test(&records, level);
        io::write_jsonl(&dirs.output.join(level.output_file(Split::Test)), &out.conversations)?;
        catalog.merge(out.catalog);
        summary.push(out.summary);
    }
    write_catalog(&dirs.catalog, &catalog)?;
    Ok(catalog)
}

/// Convert ToolAlpaca's entry file and write its catalog.
///
/// # Errors
///
/// Fails on an unreadable input file or a write error.
pub fn run_tool_alpaca(
    dirs: &CorpusDirs,
    settings: &ToolAlpacaConfig,
    summary: &mut RunSummary,
) -> Result<ToolCatalog, ConvertError> {
    let entries = io::read_records(&dirs.source.join(&settings.input_file))?;
    tracing::info!(entries = entries.len(), "converting ToolAlpaca data");
    let out = tool_alpaca::convert(&entries);
    io::write_jsonl(&dirs.output.join(tool_alpaca::OUTPUT_FILE), &out.conversations)?;
    write_catalog(&dirs.catalog, &out.catalog)?;
    summary.push(out.summary);
    Ok(out.catalog)
}

fn write_catalog(dir: &Path, catalog: &ToolCatalog) -> Result<(), ConvertError> {
    let path = dir.join(CATALOG_FILE);
    io::write_catalog(&path, catalog)?;
    tracing::info!(tools = catalog.len(), path = %path.display(), "tool catalog written");
    Ok(())
}

/// Run the selected corpora. Corpora disabled in the config are skipped.
///
/// # Errors
///
/// Returns the first run-level failure; per-record failures are only counted.
pub fn run(config: &AppConfig, corpus: Corpus) -> Result<RunSummary, ConvertError> {
    let mut summary = RunSummary::default();
    if matches!(corpus, Corpus::ApiBank | Corpus::All) {
        if config.api_bank.enabled {
            let dirs = CorpusDirs::new(&config.paths, API_BANK_DIR);
            let catalog = run_api_bank(&dirs, &config.api_bank, &mut summary)?;
            summary.catalog_tools += catalog.len();
        } else {
            tracing::info!("API-Bank disabled, skipping");
        }
    }
    if matches!(corpus, Corpus::ToolAlpaca | Corpus::All) {
        if config.tool_alpaca.enabled {
            let dirs = CorpusDirs::new(&config.paths, TOOL_ALPACA_DIR);
            let catalog = run_tool_alpaca(&dirs, &config.tool_alpaca, &mut summary)?;
            summary.catalog_tools += catalog.len();
        } else {
            tracing::info!("ToolAlpaca disabled, skipping");
        }
    }
    summary.log();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_dirs_nest_under_roots() {
        let paths = PathsConfig {
            source_root: PathBuf::from("in"),
            output_root: PathBuf::from("out"),
            catalog_root: PathBuf::from("tools"),
        };
        let dirs = CorpusDirs::new(&paths, API_BANK_DIR);
        assert_eq!(dirs.source, PathBuf::from("in/API-Bank"));
        assert_eq!(dirs.output, PathBuf::from("out/API-Bank"));
        assert_eq!(dirs.catalog, PathBuf::from("tools/API-Bank"));
    }

    #[test]
    fn missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            source_root: dir.path().join("src"),
            output_root: dir.path().join("out"),
            catalog_root: dir.path().join("tools"),
        };
        let config = AppConfig {
            paths,
            ..AppConfig::default()
        };
        let err = run(&config, Corpus::ToolAlpaca).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
