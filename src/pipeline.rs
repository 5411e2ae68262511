//! Pipeline facade.
//!
//! A [`PipelineBuilder`] collects generator and custom columns in the order they must run.
//! [`PipelineBuilder::build`] freezes the list into a [`Pipeline`], which can then create
//! datasets any number of times.
//!
//! ```rust
//! use synth_pipeline::column::CustomColumn;
//! use synth_pipeline::generators::CategorySampler;
//! use synth_pipeline::pipeline::{PipelineBuilder, PipelineOptions};
//! use synth_pipeline::types::Value;
//!
//! # fn main() -> Result<(), synth_pipeline::PipelineError> {
//! let mut builder = PipelineBuilder::new();
//! builder
//!     .add_column(CategorySampler::new("a", [2_i64, 3, 4])?)
//!     .add_column(CategorySampler::new("b", [1_i64, 2, 3])?)
//!     .add_column(CustomColumn::row("sum_ab", ["a", "b"], |row| {
//!         Ok(Value::Int64(row.i64("a")? + row.i64("b")?))
//!     })?);
//!
//! let pipeline = builder.build(PipelineOptions::default())?;
//! let ds = pipeline.create(10)?;
//! assert_eq!(ds.row_count(), 10);
//! for row in ds.rows() {
//!     let (a, b) = (row.i64("a").unwrap(), row.i64("b").unwrap());
//!     assert_eq!(row.i64("sum_ab").unwrap(), a + b);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::column::ColumnSpec;
use crate::error::{PipelineError, PipelineResult};
use crate::execution::{
    check_declared_order, check_name_collisions, ExecutionEngine, ExecutionMetrics,
    ExecutionObserver, ExecutionOptions,
};
use crate::types::{DataSet, Schema};

/// Options controlling pipeline runs.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Seed for generator columns. The same seed, columns and row count give the same dataset
    /// (provided custom transforms are pure).
    pub seed: u64,
    /// Parallelism and chunking for row-wise custom columns.
    pub execution: ExecutionOptions,
    /// Optional observer for logging/metrics.
    pub observer: Option<Arc<dyn ExecutionObserver>>,
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("seed", &self.seed)
            .field("execution", &self.execution)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            execution: ExecutionOptions::default(),
            observer: None,
        }
    }
}

/// Append-only, ordered list of columns being authored.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    columns: Vec<ColumnSpec>,
}

impl PipelineBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Columns run in the order they are added.
    pub fn add_column(&mut self, column: impl Into<ColumnSpec>) -> &mut Self {
        self.columns.push(column.into());
        self
    }

    /// Append several columns in order.
    pub fn add_columns<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnSpec>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Columns added so far, in order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Freeze the column list.
    ///
    /// Fails with [`PipelineError::Configuration`] if no columns were added, a custom column
    /// is declared before a generator column of the same name, or the execution options are
    /// invalid.
    pub fn build(self, options: PipelineOptions) -> PipelineResult<Pipeline> {
        if self.columns.is_empty() {
            return Err(PipelineError::config("pipeline has no columns"));
        }
        check_name_collisions(&self.columns)?;
        let mut engine = ExecutionEngine::new(options.execution.clone())?;
        if let Some(observer) = options.observer.clone() {
            engine = engine.with_observer(observer);
        }
        Ok(Pipeline {
            columns: self.columns.into(),
            seed: options.seed,
            engine,
        })
    }
}

/// A frozen pipeline, ready to produce datasets.
#[derive(Debug)]
pub struct Pipeline {
    columns: Arc<[ColumnSpec]>,
    seed: u64,
    engine: ExecutionEngine,
}

impl Pipeline {
    /// Create a dataset of `num_records` rows.
    ///
    /// Generator columns produce `num_records` values each; custom columns then run in
    /// declaration order. Whole-table custom columns may change the final row count.
    pub fn create(&self, num_records: usize) -> PipelineResult<DataSet> {
        if num_records == 0 {
            return Err(PipelineError::config("num_records must be > 0"));
        }
        self.run_on(DataSet::with_row_count(num_records))
    }

    /// Run the pipeline over a table seeded by the caller.
    ///
    /// Generator columns are sized to the table's row count; existing columns are available to
    /// every custom column.
    pub fn run_on(&self, table: DataSet) -> PipelineResult<DataSet> {
        self.engine.run(table, &self.columns, self.seed)
    }

    /// Check declared dependencies against declaration order without running anything.
    ///
    /// `initial` lists the columns present before the run (empty for [`Self::create`]). The
    /// same rules as a real run apply: a generator column only counts once its declaration is
    /// reached, even if `initial` already has a column of that name, and dropped columns
    /// disappear after their last consumer. Whole-table columns are assumed to add only their
    /// own name.
    pub fn check_order(&self, initial: &Schema) -> PipelineResult<()> {
        check_declared_order(&self.columns, initial)
    }

    /// The frozen column list.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Names of the declared columns, in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(ColumnSpec::name)
    }

    /// Seed used for generator columns.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Metrics of the most recent run.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        self.engine.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineBuilder, PipelineOptions};
    use crate::column::CustomColumn;
    use crate::error::PipelineError;
    use crate::execution::ExecutionOptions;
    use crate::generators::{CategorySampler, FnGenerator, UniformIntSampler};
    use crate::types::{DataSet, Schema, Value};

    fn constant_column(name: &str, value: i64) -> CustomColumn {
        CustomColumn::row(name, Vec::<String>::new(), move |_| Ok(Value::Int64(value))).unwrap()
    }

    fn sequential() -> PipelineOptions {
        PipelineOptions {
            seed: 42,
            execution: ExecutionOptions::sequential(),
            observer: None,
        }
    }

    #[test]
    fn empty_pipeline_is_rejected() {
        let err = PipelineBuilder::new().build(sequential()).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration { .. }));
    }

    #[test]
    fn create_rejects_zero_records() {
        let mut builder = PipelineBuilder::new();
        builder.add_column(CategorySampler::new("a", [1_i64]).unwrap());
        let pipeline = builder.build(sequential()).unwrap();
        assert!(pipeline.create(0).is_err());
    }

    #[test]
    fn declaration_order_is_preserved() {
        let mut builder = PipelineBuilder::new();
        builder.add_columns([
            CategorySampler::new("z", [1_i64]).unwrap(),
            CategorySampler::new("a", [2_i64]).unwrap(),
        ]);
        builder.add_column(CustomColumn::row("m", ["a"], |_| Ok(Value::Null)).unwrap());
        let pipeline = builder.build(sequential()).unwrap();
        assert_eq!(pipeline.column_names().collect::<Vec<_>>(), vec!["z", "a", "m"]);

        let ds = pipeline.create(2).unwrap();
        assert_eq!(ds.schema, Schema::new(["z", "a", "m"]));
    }

    #[test]
    fn run_on_uses_caller_seeded_columns() {
        let mut builder = PipelineBuilder::new();
        builder.add_column(
            CustomColumn::row("greeting", ["name"], |row| {
                Ok(format!("hello {}", row.str("name")?).into())
            })
            .unwrap(),
        );
        let pipeline = builder.build(sequential()).unwrap();
        let seed = DataSet::new(
            Schema::new(["name"]),
            vec![vec![Value::from("ada")], vec![Value::from("grace")]],
        );
        let out = pipeline.run_on(seed).unwrap();
        assert_eq!(
            out.column("greeting").unwrap(),
            vec![&Value::from("hello ada"), &Value::from("hello grace")]
        );
    }

    #[test]
    fn check_order_flags_forward_references() {
        let mut builder = PipelineBuilder::new();
        builder
            .add_column(CustomColumn::row("early", ["n"], |_| Ok(Value::Null)).unwrap())
            .add_column(UniformIntSampler::new("n", 0, 9).unwrap());
        let pipeline = builder.build(sequential()).unwrap();

        let err = pipeline.check_order(&Schema::default()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingDependency { ref column, .. } if column == "early"
        ));
    }

    #[test]
    fn check_order_agrees_with_run_on_seeded_table() {
        let mut builder = PipelineBuilder::new();
        builder
            .add_column(CustomColumn::row("early", ["n"], |_| Ok(Value::Null)).unwrap())
            .add_column(UniformIntSampler::new("n", 0, 9).unwrap());
        let pipeline = builder.build(sequential()).unwrap();

        let seeded = DataSet::new(Schema::new(["n"]), vec![vec![Value::Int64(1)]]);
        let dry = pipeline.check_order(&seeded.schema);
        let real = pipeline.run_on(seeded);
        for result in [dry.map(|_| ()), real.map(|_| ())] {
            assert!(matches!(
                result,
                Err(PipelineError::MissingDependency { ref column, .. }) if column == "early"
            ));
        }
    }

    #[test]
    fn check_order_accepts_what_a_run_accepts() {
        let mut builder = PipelineBuilder::new();
        builder
            .add_column(UniformIntSampler::new("n", 0, 9).unwrap())
            .add_column(
                CustomColumn::row("tmp", ["n", "seeded"], |row| Ok(Value::Int64(row.i64("n")?)))
                    .unwrap()
                    .with_drop(true),
            )
            .add_column(
                CustomColumn::row("out", ["tmp"], |row| Ok(row.require("tmp")?.clone())).unwrap(),
            );
        let pipeline = builder.build(sequential()).unwrap();

        let seeded = DataSet::new(Schema::new(["seeded"]), vec![vec![Value::Null]; 3]);
        assert!(pipeline.check_order(&seeded.schema).is_ok());
        assert!(pipeline.run_on(seeded).is_ok());
        assert!(pipeline.check_order(&Schema::default()).is_err());
    }

    #[test]
    fn generator_reading_a_later_generator_is_flagged() {
        let mut builder = PipelineBuilder::new();
        builder
            .add_column(FnGenerator::new("g", ["n"], |_, _| Ok(Value::Null)).unwrap())
            .add_column(UniformIntSampler::new("n", 0, 9).unwrap());
        let pipeline = builder.build(sequential()).unwrap();

        assert!(pipeline.check_order(&Schema::default()).is_err());
        assert!(pipeline.create(2).is_err());
    }

    #[test]
    fn custom_column_before_same_named_generator_is_rejected() {
        let mut builder = PipelineBuilder::new();
        builder
            .add_column(constant_column("a", 1))
            .add_column(CategorySampler::new("a", [5_i64]).unwrap());
        let err = builder.build(sequential()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Configuration { ref message } if message.contains("'a'")
        ));
    }

    #[test]
    fn custom_column_after_same_named_generator_overwrites_it() {
        let mut builder = PipelineBuilder::new();
        builder
            .add_column(CategorySampler::new("a", [5_i64]).unwrap())
            .add_column(constant_column("a", 1));
        let ds = builder.build(sequential()).unwrap().create(2).unwrap();
        assert_eq!(ds.column("a").unwrap(), vec![&Value::Int64(1); 2]);
    }

    #[test]
    fn same_seed_gives_same_dataset() {
        let build = |seed| {
            let mut builder = PipelineBuilder::new();
            builder
                .add_column(UniformIntSampler::new("n", 0, 1_000_000).unwrap())
                .add_column(
                    CustomColumn::row("n2", ["n"], |row| Ok(Value::Int64(row.i64("n")? * 2)))
                        .unwrap(),
                );
            builder
                .build(PipelineOptions {
                    seed,
                    ..PipelineOptions::default()
                })
                .unwrap()
        };
        assert_eq!(build(5).create(64).unwrap(), build(5).create(64).unwrap());
        assert_ne!(build(5).create(64).unwrap(), build(6).create(64).unwrap());
    }
}
