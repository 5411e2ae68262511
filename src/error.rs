use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by pipeline construction and execution.
///
/// Every variant is fatal: a run that hits any of these aborts and no partial dataset is
/// returned.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A column specification or option was malformed. Raised before anything runs.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A custom column declared dependencies that are not present in the table when it runs.
    #[error("column '{column}' is missing required columns: {}", missing.join(", "))]
    MissingDependency { column: String, missing: Vec<String> },

    /// A row-wise transform failed for a specific row.
    #[error("row transform for column '{column}' failed at row {row}: {source}")]
    RowTransform {
        column: String,
        row: usize,
        #[source]
        source: TransformError,
    },

    /// A whole-table transform failed.
    #[error("full transform for column '{column}' failed: {source}")]
    FullTransform {
        column: String,
        #[source]
        source: TransformError,
    },

    /// A whole-table transform returned a table that is not well formed.
    #[error("column '{column}' produced a malformed table: {message}")]
    MalformedResult { column: String, message: String },

    /// A generator column failed or returned the wrong number of values.
    #[error("generator for column '{column}' failed: {message}")]
    Generator { column: String, message: String },

    /// Underlying I/O error while writing an artifact.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV rendering error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON rendering error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Name of the column whose specification caused the error, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::MissingDependency { column, .. }
            | Self::RowTransform { column, .. }
            | Self::FullTransform { column, .. }
            | Self::MalformedResult { column, .. }
            | Self::Generator { column, .. } => Some(column),
            Self::Configuration { .. } | Self::Io(_) | Self::Csv(_) | Self::Json(_) => None,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Failure raised by a user-supplied transform or generator.
///
/// Transforms return this from their closures; the engine wraps it with the column name (and
/// row index for row-wise transforms).
#[derive(Debug)]
pub struct TransformError {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl TransformError {
    /// Create an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{}: {}", self.message, src),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for TransformError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<&str> for TransformError {
    fn from(message: &str) -> Self {
        Self::msg(message)
    }
}

impl From<String> for TransformError {
    fn from(message: String) -> Self {
        Self::msg(message)
    }
}

impl From<TableError> for TransformError {
    fn from(err: TableError) -> Self {
        Self::with_source("table operation failed", err)
    }
}

/// Error type returned by [`crate::types::DataSet`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The named column does not exist.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// A column was supplied with a different number of values than the table has rows.
    #[error("column '{column}' has {actual} values but the table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A column name appears more than once.
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// A row does not have one value per column.
    #[error("row {row} has {actual} values but the schema has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// The table has no columns.
    #[error("table has no columns")]
    EmptySchema,
}
