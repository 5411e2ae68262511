//! Custom column specifications.
//!
//! A [`CustomColumn`] names the column it produces, the columns it reads, how it is evaluated
//! and whether it survives into the final dataset. Evaluation is one of exactly two shapes
//! (see [`ColumnOperation`]): a per-row function producing one value, or a whole-table function
//! producing a replacement table.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult, TransformError};
use crate::generators::{CategorySampler, ColumnGenerator, FnGenerator, UniformIntSampler};
use crate::types::{DataSet, Row, Value};

/// Per-row transform: one row in, one value out.
pub type RowFn = dyn Fn(Row<'_>) -> Result<Value, TransformError> + Send + Sync;

/// Whole-table transform: the current table in, a replacement table out.
pub type FullFn = dyn Fn(DataSet) -> Result<DataSet, TransformError> + Send + Sync;

/// Evaluation mode of a custom column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Evaluated once per row.
    Row,
    /// Evaluated once over the whole table; may change the row count.
    Full,
}

impl OperationType {
    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = PipelineError;

    /// Parse `row` or `full` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "row" => Ok(Self::Row),
            "full" => Ok(Self::Full),
            other => Err(PipelineError::config(format!(
                "unknown operation type '{other}' (expected 'row' or 'full')"
            ))),
        }
    }
}

/// The callable behind a custom column, tagged by evaluation mode.
#[derive(Clone)]
pub enum ColumnOperation {
    /// Called once per row; the result is stored under the column name in that row.
    Row(Arc<RowFn>),
    /// Called once with the whole table; the result replaces the table.
    Full(Arc<FullFn>),
}

impl ColumnOperation {
    /// Wrap a per-row function.
    pub fn row<F>(f: F) -> Self
    where
        F: Fn(Row<'_>) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self::Row(Arc::new(f))
    }

    /// Wrap a whole-table function.
    pub fn full<F>(f: F) -> Self
    where
        F: Fn(DataSet) -> Result<DataSet, TransformError> + Send + Sync + 'static,
    {
        Self::Full(Arc::new(f))
    }

    /// The evaluation mode of this operation.
    pub fn operation_type(&self) -> OperationType {
        match self {
            Self::Row(_) => OperationType::Row,
            Self::Full(_) => OperationType::Full,
        }
    }
}

impl fmt::Debug for ColumnOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnOperation::{:?}(<fn>)", self.operation_type())
    }
}

/// A user-defined column in a pipeline.
///
/// Immutable once constructed; the engine only reads it.
#[derive(Debug, Clone)]
pub struct CustomColumn {
    name: String,
    required_cols: Vec<String>,
    operation: ColumnOperation,
    drop: bool,
}

impl CustomColumn {
    /// Create a retained custom column.
    ///
    /// Fails with [`PipelineError::Configuration`] if `name` or any required column name is
    /// blank.
    pub fn new<I, S>(
        name: impl Into<String>,
        required_cols: I,
        operation: ColumnOperation,
    ) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PipelineError::config("custom column name must not be empty"));
        }
        let required_cols: Vec<String> = required_cols.into_iter().map(Into::into).collect();
        if required_cols.iter().any(|c| c.trim().is_empty()) {
            return Err(PipelineError::config(format!(
                "custom column '{name}' lists an empty required column name"
            )));
        }
        Ok(Self {
            name,
            required_cols,
            operation,
            drop: false,
        })
    }

    /// Shorthand for a per-row column.
    pub fn row<I, S, F>(name: impl Into<String>, required_cols: I, f: F) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Row<'_>) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self::new(name, required_cols, ColumnOperation::row(f))
    }

    /// Shorthand for a whole-table column.
    pub fn full<I, S, F>(name: impl Into<String>, required_cols: I, f: F) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(DataSet) -> Result<DataSet, TransformError> + Send + Sync + 'static,
    {
        Self::new(name, required_cols, ColumnOperation::full(f))
    }

    /// Construct from loosely-typed parts, e.g. values read from a config document.
    ///
    /// `operation_type` is parsed with [`OperationType::from_str`] and must agree with the
    /// shape of `operation`.
    pub fn from_parts<I, S>(
        name: impl Into<String>,
        required_cols: I,
        operation_type: &str,
        operation: ColumnOperation,
        drop: bool,
    ) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let declared: OperationType = operation_type.parse()?;
        let column = Self::new(name, required_cols, operation)?;
        if declared != column.operation_type() {
            return Err(PipelineError::config(format!(
                "custom column '{}' declares operation type '{declared}' \
                 but was given a '{}' function",
                column.name,
                column.operation_type()
            )));
        }
        Ok(column.with_drop(drop))
    }

    /// Set whether the column is removed right after it has been computed.
    ///
    /// Dropped columns still feed the specification that follows them.
    pub fn with_drop(mut self, drop: bool) -> Self {
        self.drop = drop;
        self
    }

    /// Name of the produced column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns that must exist when this column runs.
    pub fn required_cols(&self) -> &[String] {
        &self.required_cols
    }

    /// The callable.
    pub fn operation(&self) -> &ColumnOperation {
        &self.operation
    }

    /// Evaluation mode.
    pub fn operation_type(&self) -> OperationType {
        self.operation.operation_type()
    }

    /// Whether the column is removed after it runs.
    pub fn drop(&self) -> bool {
        self.drop
    }

    /// Whether the column survives into the final dataset.
    pub fn retain(&self) -> bool {
        !self.drop
    }
}

/// One entry of a pipeline's ordered column list.
#[derive(Clone)]
pub enum ColumnSpec {
    /// Produced by an external generator before any custom column runs.
    Generator(Arc<dyn ColumnGenerator>),
    /// Produced by a user-defined transform.
    Custom(CustomColumn),
}

impl ColumnSpec {
    /// Wrap any generator.
    pub fn generator(generator: impl ColumnGenerator + 'static) -> Self {
        Self::Generator(Arc::new(generator))
    }

    /// Name of the produced column.
    pub fn name(&self) -> &str {
        match self {
            Self::Generator(g) => g.name(),
            Self::Custom(c) => c.name(),
        }
    }

    /// Columns that must exist before this entry runs.
    pub fn required_cols(&self) -> &[String] {
        match self {
            Self::Generator(g) => g.required_cols(),
            Self::Custom(c) => c.required_cols(),
        }
    }
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generator(g) => f
                .debug_struct("Generator")
                .field("name", &g.name())
                .field("required_cols", &g.required_cols())
                .finish(),
            Self::Custom(c) => fmt::Debug::fmt(c, f),
        }
    }
}

impl From<CustomColumn> for ColumnSpec {
    fn from(column: CustomColumn) -> Self {
        Self::Custom(column)
    }
}

impl From<CategorySampler> for ColumnSpec {
    fn from(generator: CategorySampler) -> Self {
        Self::generator(generator)
    }
}

impl From<UniformIntSampler> for ColumnSpec {
    fn from(generator: UniformIntSampler) -> Self {
        Self::generator(generator)
    }
}

impl From<FnGenerator> for ColumnSpec {
    fn from(generator: FnGenerator) -> Self {
        Self::generator(generator)
    }
}

impl From<Arc<dyn ColumnGenerator>> for ColumnSpec {
    fn from(generator: Arc<dyn ColumnGenerator>) -> Self {
        Self::Generator(generator)
    }
}
