use std::path::PathBuf;

/// Error type shared by the extractor, both pipelines and the corpus driver.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    #[error("Literal parse error: {0}")]
    Literal(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ConvertError::MalformedRecord(msg.into())
    }
}
