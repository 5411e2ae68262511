//! `synth-pipeline` builds synthetic datasets column by column.
//!
//! A pipeline is an ordered list of columns. Some are produced by generators (category
//! samplers, numeric samplers, model-backed structured generators); others are *custom
//! columns* computed by user functions over what already exists. The result is an in-memory
//! [`types::DataSet`].
//!
//! ## Custom columns
//!
//! A [`column::CustomColumn`] has a name, the columns it requires, an operation and a drop
//! flag. The operation is one of two shapes:
//!
//! - [`column::ColumnOperation::Row`]: called once per row with a [`types::Row`] view, returns
//!   one [`types::Value`] stored under the column name in that row
//! - [`column::ColumnOperation::Full`]: called once with the whole table, returns a replacement
//!   table (which may have a different number of rows, e.g. after [`types::DataSet::explode`])
//!
//! Columns run strictly in declaration order. Before a custom column runs, its required columns
//! must already exist, otherwise the run fails with [`PipelineError::MissingDependency`]. A
//! column marked `drop` is removed once the later columns that require it have run, so it never
//! reaches the final dataset.
//!
//! ## Example: sample, derive, explode
//!
//! ```rust
//! use synth_pipeline::column::CustomColumn;
//! use synth_pipeline::generators::{CategorySampler, FnGenerator};
//! use synth_pipeline::pipeline::{PipelineBuilder, PipelineOptions};
//! use synth_pipeline::types::Value;
//!
//! # fn main() -> Result<(), synth_pipeline::PipelineError> {
//! let mut builder = PipelineBuilder::new();
//! builder
//!     .add_column(CategorySampler::new("a", [2_i64, 3, 4])?)
//!     // Stand-in for a model that returns {"words": [...]} with `a` entries.
//!     .add_column(FnGenerator::new("doc", ["a"], |row, _rng| {
//!         let n = row.i64("a")?;
//!         let words: Vec<Value> = (0..n).map(|i| Value::from(format!("w{i}"))).collect();
//!         Ok(serde_json::json!({ "words": Value::List(words).to_json() }).into())
//!     })?)
//!     .add_column(
//!         CustomColumn::row("split_words", ["doc"], |row| Ok(row.require("doc.words")?.clone()))?
//!             .with_drop(true),
//!     )
//!     .add_column(CustomColumn::full("word", ["split_words"], |table| {
//!         let mut table = table.explode("split_words")?;
//!         table.map_column("word", |row| Ok(row.require("split_words")?.clone()))?;
//!         Ok(table)
//!     })?);
//!
//! let pipeline = builder.build(PipelineOptions::default())?;
//! let ds = pipeline.create(4)?;
//! assert!(ds.has_column("word"));
//! assert!(!ds.has_column("split_words"));
//! assert!(ds.row_count() >= 8);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: structured values, schema, the in-memory dataset and row views
//! - [`column`]: custom column specifications
//! - [`generators`]: generator columns and the seeded generation context
//! - [`execution`]: the engine that runs columns, plus observers and metrics
//! - [`pipeline`]: the builder/facade most callers use
//! - [`output`]: JSON/NDJSON/CSV rendering of a finished dataset
//! - [`error`]: error types

pub mod column;
pub mod error;
pub mod execution;
pub mod generators;
pub mod output;
pub mod pipeline;
pub mod types;

pub use error::{PipelineError, PipelineResult, TableError, TransformError};
