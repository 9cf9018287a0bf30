use std::path::PathBuf;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum EEIOError {
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionError {
        context: String,
        expected: String,
        actual: String,
    },
    #[error("Index mismatch in {context}: position {position} is {left:?} on one side and {right:?} on the other")]
    IndexMismatch {
        context: String,
        position: usize,
        left: Option<Vec<String>>,
        right: Option<Vec<String>>,
    },
    #[error("Invalid index: {0}")]
    InvalidIndex(String),
    #[error("Label {label:?} not found in {axis}")]
    LookupError { label: String, axis: String },
    #[error("Matrix (I - A) is singular or ill-conditioned ({0}). The Leontief inverse does not exist.")]
    SingularMatrix(String),
    #[error("Could not parse value {value:?} at line {line}, column {column}")]
    ParseError {
        line: usize,
        column: usize,
        value: String,
    },
    #[error("Malformed table: {0}")]
    MalformedTable(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read delimited text: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown unit {0:?}")]
    UnknownUnit(String),
}

impl EEIOError {
    pub(crate) fn dimension(
        context: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        EEIOError::DimensionError {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Convenience type for `Result<T, EEIOError>`.
pub type EEIOResult<T> = Result<T, EEIOError>;
