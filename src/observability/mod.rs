use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with the configured log level.
///
/// Maps config log levels to tracing levels:
/// - "DISABLED" -> no subscriber installed
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (DEBUG, INFO, ERROR)
///
/// `log_format` `"json"` emits one JSON object per event; anything else is
/// the plain text format.
pub fn init_tracing(log_level: &str, log_format: &str) {
    let level = log_level.to_uppercase();

    if level == "DISABLED" {
        return;
    }

    let tracing_level = match level.as_str() {
        "WARNING" => "WARN",
        "CRITICAL" => "ERROR",
        other => other,
    };

    let filter = EnvFilter::try_new(tracing_level).unwrap_or_else(|_| EnvFilter::new("INFO"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);
    if log_format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Counters for one converted output file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub file: String,
    /// Conversations written.
    pub accepted: usize,
    /// Records or entries that failed to convert.
    pub errors: usize,
    /// Conversations dropped for calling a tool outside their candidates.
    pub rejected: usize,
    /// Tool calls cut out of otherwise kept conversations.
    pub excised: usize,
}

impl FileSummary {
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn log(&self) {
        tracing::info!(
            file = %self.file,
            accepted = self.accepted,
            errors = self.errors,
            rejected = self.rejected,
            excised = self.excised,
            "conversion finished"
        );
    }
}

/// Totals across a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files: Vec<FileSummary>,
    /// Distinct tools written to catalogs.
    pub catalog_tools: usize,
}

impl RunSummary {
    pub fn push(&mut self, summary: FileSummary) {
        self.files.push(summary);
    }

    #[must_use]
    pub fn accepted(&self) -> usize {
        self.files.iter().map(|f| f.accepted).sum()
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.files.iter().map(|f| f.errors).sum()
    }

    pub fn log(&self) {
        tracing::info!(
            files = self.files.len(),
            accepted = self.accepted(),
            errors = self.errors(),
            tools = self.catalog_tools,
            "run finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_summary_totals_files() {
        let mut run = RunSummary::default();
        run.push(FileSummary {
            accepted: 3,
            errors: 1,
            ..FileSummary::new("lv1_train.jsonl")
        });
        run.push(FileSummary {
            accepted: 2,
            rejected: 4,
            ..FileSummary::new("lv1_test.jsonl")
        });
        assert_eq!(run.accepted(), 5);
        assert_eq!(run.errors(), 1);
    }
}
