//! Error types for loading, analyzing and rendering lineup data.

use std::path::PathBuf;

use thiserror::Error;

/// A single CSV row that could not be interpreted.
///
/// Row errors never abort a load: the row is skipped, logged, and collected
/// so callers can report them afterwards.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{file}:{line}: column {column}: invalid numeric value {value:?}", file = .path.display())]
pub struct RowError {
    pub path: PathBuf,
    /// 1-based line number in the source file.
    pub line: u64,
    pub column: String,
    pub value: String,
}

/// Errors that can occur in the lineup pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no data found for team {team}: {reason}")]
    DataNotFound { team: String, reason: String },
    #[error(transparent)]
    Parse(#[from] RowError),
    #[error("missing column {column} in {file}", file = .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("render error: {0}")]
    Render(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for lineup operations.
pub type Result<T> = std::result::Result<T, Error>;
