//! Domain error types.

/// Why a raw table could not be turned into canonical bars.
///
/// Every variant that is raised after a table was parsed carries the column
/// names that were actually detected, so a failed run can be diagnosed
/// without opening the file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngestError {
    #[error("unable to parse table: {reason}")]
    Unreadable { reason: String },

    #[error("no datetime column found (detected columns: {columns:?})")]
    NoTimestampColumn { columns: Vec<String> },

    #[error("missing required column(s) {missing:?} (columns: {columns:?})")]
    MissingColumns {
        missing: Vec<String>,
        columns: Vec<String>,
    },

    #[error("no valid rows after cleaning (columns: {columns:?})")]
    NoValidRows { columns: Vec<String> },
}

/// Top-level error type for crosstrader.
#[derive(Debug, thiserror::Error)]
pub enum CrosstraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to ingest {path}: {source}")]
    Ingestion {
        path: String,
        #[source]
        source: IngestError,
    },

    #[error("failed to write {path}: {reason}")]
    Journal { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CrosstraderError> for std::process::ExitCode {
    fn from(err: &CrosstraderError) -> Self {
        let code: u8 = match err {
            CrosstraderError::Io(_) => 1,
            CrosstraderError::ConfigParse { .. }
            | CrosstraderError::ConfigInvalid { .. } => 2,
            CrosstraderError::Ingestion { .. } => 3,
            CrosstraderError::Journal { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
