//! Execution engine for custom columns.
//!
//! The engine walks a pipeline's column list in declaration order and, for every custom column:
//!
//! - checks that its declared dependencies exist in the current table
//! - evaluates it (row-wise in parallel chunks, or once over the whole table)
//! - merges the result into the table and applies the drop policy
//!
//! Row-wise columns are split into chunks and evaluated on a rayon pool, bounded by
//! [`ExecutionOptions::max_in_flight_chunks`]. Results are reassembled by position, so the
//! output is the same as a sequential evaluation. Any failure aborts the run.

mod limiter;
mod observer;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::column::{ColumnOperation, ColumnSpec, CustomColumn, FullFn, RowFn};
use crate::error::{PipelineError, PipelineResult, TransformError};
use crate::generators::{apply_generator, GenerationContext};
use crate::types::{DataSet, Schema, Value};

pub use observer::{
    CompositeExecutionObserver, ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot,
    ExecutionObserver, StdErrExecutionObserver, TracingExecutionObserver,
};

use limiter::ChunkLimiter;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used for row-wise columns.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Number of rows per chunk.
    pub chunk_size: usize,
    /// Upper bound on concurrently evaluated chunks.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_chunks: usize,
}

impl ExecutionOptions {
    /// Options that evaluate every column on a single thread, one chunk at a time.
    pub fn sequential() -> Self {
        Self {
            num_threads: Some(1),
            chunk_size: 4_096,
            max_in_flight_chunks: 1,
        }
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.chunk_size == 0 {
            return Err(PipelineError::config("chunk_size must be > 0"));
        }
        if self.max_in_flight_chunks == 0 {
            return Err(PipelineError::config("max_in_flight_chunks must be > 0"));
        }
        if self.num_threads == Some(0) {
            return Err(PipelineError::config("num_threads must be > 0 when set"));
        }
        Ok(())
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            chunk_size: 4_096,
            max_in_flight_chunks: n.max(1),
        }
    }
}

/// Runs a pipeline's column list against a table.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("opts", &self.opts)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails with [`PipelineError::Configuration`] if the options are invalid or the worker
    /// pool cannot be started.
    pub fn new(opts: ExecutionOptions) -> PipelineResult<Self> {
        opts.validate()?;

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("synth-pipeline-{i}"))
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build worker pool: {e}")))?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Options the engine was built with.
    pub fn options(&self) -> &ExecutionOptions {
        &self.opts
    }

    /// Run `specs` against `table`.
    ///
    /// Generator columns are materialized first, in declaration order, each with an RNG derived
    /// from `seed` and its position. Custom columns then run in declaration order. A custom
    /// column may only depend on columns that were in `table` on entry or that are produced by
    /// an entry declared before it.
    pub fn run(&self, table: DataSet, specs: &[ColumnSpec], seed: u64) -> PipelineResult<DataSet> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            columns: specs.len(),
            rows: table.row_count(),
        });

        let result = self.pool.install(|| self.run_impl(table, specs, seed));

        match &result {
            Ok(out) => {
                self.metrics.end_run(start.elapsed());
                self.emit(ExecutionEvent::RunFinished {
                    elapsed: start.elapsed(),
                    rows: out.row_count(),
                    columns: out.column_count(),
                    metrics: self.metrics.snapshot(),
                });
            }
            Err(e) => {
                self.metrics.end_run(start.elapsed());
                self.emit(ExecutionEvent::RunFailed {
                    column: e.column().map(str::to_string),
                    message: e.to_string(),
                });
            }
        }
        result
    }

    /// Run a single custom column against `table`, returning the updated table.
    ///
    /// A dropped column is removed right after it has been computed.
    pub fn execute_column(&self, table: DataSet, column: &CustomColumn) -> PipelineResult<DataSet> {
        self.pool.install(|| {
            let mut table = self.execute_column_impl(table, column, &HashSet::new())?;
            if column.drop() {
                self.drop_columns(&mut table, &[column.name()][..]);
            }
            Ok(table)
        })
    }

    fn run_impl(
        &self,
        mut table: DataSet,
        specs: &[ColumnSpec],
        seed: u64,
    ) -> PipelineResult<DataSet> {
        check_name_collisions(specs)?;
        for (position, spec) in specs.iter().enumerate() {
            if let ColumnSpec::Generator(generator) = spec {
                let mut ctx = GenerationContext::new(seed, position);
                apply_generator(generator.as_ref(), &mut table, &mut ctx)?;
                self.metrics.on_generator_applied();
                self.emit(ExecutionEvent::GeneratorFinished {
                    column: generator.name().to_string(),
                    rows: table.row_count(),
                });
            }
        }

        // Generator columns count as produced only once the walk reaches their declaration.
        let mut not_yet_declared = generator_names(specs);
        let drops = drop_schedule(specs);

        for (position, spec) in specs.iter().enumerate() {
            match spec {
                ColumnSpec::Generator(generator) => {
                    not_yet_declared.remove(generator.name());
                }
                ColumnSpec::Custom(column) => {
                    table = self.execute_column_impl(table, column, &not_yet_declared)?;
                }
            }
            if let Some(names) = drops.get(&position) {
                self.drop_columns(&mut table, names.as_slice());
            }
        }
        Ok(table)
    }

    fn execute_column_impl(
        &self,
        mut table: DataSet,
        column: &CustomColumn,
        not_yet_declared: &HashSet<&str>,
    ) -> PipelineResult<DataSet> {
        check_dependencies(&table, column, not_yet_declared)?;

        let start = Instant::now();
        let rows_before = table.row_count();
        self.emit(ExecutionEvent::ColumnStarted {
            column: column.name().to_string(),
            operation: column.operation_type(),
            rows: rows_before,
        });

        table = match column.operation() {
            ColumnOperation::Row(f) => {
                let values = self.eval_rows(&table, column.name(), f.as_ref())?;
                table
                    .set_column(column.name(), values)
                    .map_err(|e| PipelineError::MalformedResult {
                        column: column.name().to_string(),
                        message: e.to_string(),
                    })?;
                table
            }
            ColumnOperation::Full(f) => eval_full(table, column.name(), f.as_ref())?,
        };
        self.metrics.on_column_executed();

        self.emit(ExecutionEvent::ColumnFinished {
            column: column.name().to_string(),
            operation: column.operation_type(),
            rows_before,
            rows_after: table.row_count(),
            elapsed: start.elapsed(),
        });
        Ok(table)
    }

    /// Remove columns whose owners asked not to be retained. A column a transform already
    /// removed is skipped.
    fn drop_columns<S: AsRef<str>>(&self, table: &mut DataSet, names: &[S]) {
        for name in names {
            let name = name.as_ref();
            if table.drop_column(name).is_ok() {
                self.metrics.on_column_dropped();
                self.emit(ExecutionEvent::ColumnDropped {
                    column: name.to_string(),
                });
            }
        }
    }

    /// Evaluate a row-wise transform over every row.
    ///
    /// On failure, reports the lowest failing row index and returns nothing.
    fn eval_rows(&self, table: &DataSet, column: &str, f: &RowFn) -> PipelineResult<Vec<Value>> {
        let limiter = ChunkLimiter::new(self.opts.max_in_flight_chunks);
        let chunk_ranges = chunk_ranges(table.row_count(), self.opts.chunk_size);

        let per_chunk: Vec<Result<Vec<Value>, (usize, TransformError)>> = chunk_ranges
            .into_par_iter()
            .map(|range| {
                let permit = limiter.acquire();
                let waited = permit.waited();
                if waited > Duration::ZERO {
                    self.metrics.on_throttle_wait(waited);
                    self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                }

                self.metrics.on_chunk_start();
                self.emit(ExecutionEvent::ChunkStarted {
                    start_row: range.start,
                    row_count: range.len(),
                });

                let mut out = Vec::with_capacity(range.len());
                let mut failed = None;
                for row in table.rows_in(range.clone()) {
                    self.metrics.on_row_processed();
                    match f(row) {
                        Ok(v) => out.push(v),
                        Err(e) => {
                            failed = Some((row.index(), e));
                            break;
                        }
                    }
                }

                self.emit(ExecutionEvent::ChunkFinished {
                    output_rows: out.len(),
                });
                self.metrics.on_chunk_end();
                drop(permit);
                match failed {
                    Some(err) => Err(err),
                    None => Ok(out),
                }
            })
            .collect();

        let mut values = Vec::with_capacity(table.row_count());
        for chunk in per_chunk {
            match chunk {
                Ok(chunk_values) => values.extend(chunk_values),
                Err((row, source)) => {
                    return Err(PipelineError::RowTransform {
                        column: column.to_string(),
                        row,
                        source,
                    });
                }
            }
        }
        Ok(values)
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

/// For every position, the dropped columns to remove once that entry has run.
///
/// A dropped column stays until the last later entry that lists it in `required_cols` has
/// run. If a later entry redefines the same name, the original is replaced anyway and is not
/// scheduled.
fn drop_schedule(specs: &[ColumnSpec]) -> HashMap<usize, Vec<&str>> {
    let mut schedule: HashMap<usize, Vec<&str>> = HashMap::new();
    for (owner, spec) in specs.iter().enumerate() {
        let ColumnSpec::Custom(column) = spec else {
            continue;
        };
        if !column.drop() {
            continue;
        }
        let name = column.name();
        let mut last_consumer = Some(owner);
        for (position, later) in specs.iter().enumerate().skip(owner + 1) {
            if later.required_cols().iter().any(|c| c == name) {
                last_consumer = Some(position);
            }
            if later.name() == name {
                last_consumer = None;
                break;
            }
        }
        if let Some(position) = last_consumer {
            schedule.entry(position).or_default().push(name);
        }
    }
    schedule
}

fn check_dependencies(
    table: &DataSet,
    column: &CustomColumn,
    not_yet_declared: &HashSet<&str>,
) -> PipelineResult<()> {
    let missing = missing_dependencies(column.required_cols(), not_yet_declared, |c| {
        table.has_column(c)
    });
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingDependency {
            column: column.name().to_string(),
            missing,
        })
    }
}

/// Names produced by generator entries.
fn generator_names(specs: &[ColumnSpec]) -> HashSet<&str> {
    specs
        .iter()
        .filter_map(|s| match s {
            ColumnSpec::Generator(g) => Some(g.name()),
            ColumnSpec::Custom(_) => None,
        })
        .collect()
}

/// Required columns that are absent, or that belong to a generator the walk has not reached.
fn missing_dependencies(
    required: &[String],
    not_yet_declared: &HashSet<&str>,
    present: impl Fn(&str) -> bool,
) -> Vec<String> {
    required
        .iter()
        .filter(|c| !present(c.as_str()) || not_yet_declared.contains(c.as_str()))
        .cloned()
        .collect()
}

/// Reject a custom column that shares its name with a generator declared after it.
pub(crate) fn check_name_collisions(specs: &[ColumnSpec]) -> PipelineResult<()> {
    for (position, spec) in specs.iter().enumerate() {
        let ColumnSpec::Custom(column) = spec else {
            continue;
        };
        let later_generator = specs[position + 1..]
            .iter()
            .any(|s| matches!(s, ColumnSpec::Generator(g) if g.name() == column.name()));
        if later_generator {
            return Err(PipelineError::config(format!(
                "custom column '{}' is declared before a generator column of the same name",
                column.name()
            )));
        }
    }
    Ok(())
}

/// Walk `specs` the way [`ExecutionEngine::run`] does, tracking column names only.
///
/// `initial` is the schema of the table the run starts from. Whole-table columns are assumed
/// to add only their own name.
pub(crate) fn check_declared_order(specs: &[ColumnSpec], initial: &Schema) -> PipelineResult<()> {
    check_name_collisions(specs)?;
    let mut available: HashSet<&str> = initial.column_names().collect();

    let no_pending = HashSet::new();
    for spec in specs {
        if let ColumnSpec::Generator(generator) = spec {
            let missing = missing_dependencies(generator.required_cols(), &no_pending, |c| {
                available.contains(c)
            });
            if !missing.is_empty() {
                return Err(PipelineError::MissingDependency {
                    column: generator.name().to_string(),
                    missing,
                });
            }
            available.insert(generator.name());
        }
    }

    let mut not_yet_declared = generator_names(specs);
    let drops = drop_schedule(specs);
    for (position, spec) in specs.iter().enumerate() {
        match spec {
            ColumnSpec::Generator(generator) => {
                not_yet_declared.remove(generator.name());
            }
            ColumnSpec::Custom(column) => {
                let missing = missing_dependencies(column.required_cols(), &not_yet_declared, |c| {
                    available.contains(c)
                });
                if !missing.is_empty() {
                    return Err(PipelineError::MissingDependency {
                        column: column.name().to_string(),
                        missing,
                    });
                }
                available.insert(column.name());
            }
        }
        if let Some(names) = drops.get(&position) {
            for name in names {
                available.remove(name);
            }
        }
    }
    Ok(())
}

/// Call a whole-table transform and check the table it returns.
fn eval_full(table: DataSet, column: &str, f: &FullFn) -> PipelineResult<DataSet> {
    let out = f(table).map_err(|source| PipelineError::FullTransform {
        column: column.to_string(),
        source,
    })?;
    out.validate().map_err(|e| PipelineError::MalformedResult {
        column: column.to_string(),
        message: e.to_string(),
    })?;
    if !out.has_column(column) {
        return Err(PipelineError::MalformedResult {
            column: column.to_string(),
            message: format!("result does not contain column '{column}'"),
        });
    }
    Ok(out)
}

fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<std::ops::Range<usize>> {
    if row_count == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(row_count.div_ceil(chunk_size));
    let mut start = 0usize;
    while start < row_count {
        let end = (start + chunk_size).min(row_count);
        out.push(start..end);
        start = end;
    }
    out
}
