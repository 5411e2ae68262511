use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::column::OperationType;

/// Execution events emitted by the engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { columns: usize, rows: usize },
    GeneratorFinished { column: String, rows: usize },
    ColumnStarted {
        column: String,
        operation: OperationType,
        rows: usize,
    },
    ThrottleWaited { duration: Duration },
    ChunkStarted { start_row: usize, row_count: usize },
    ChunkFinished { output_rows: usize },
    ColumnFinished {
        column: String,
        operation: OperationType,
        rows_before: usize,
        rows_after: usize,
        elapsed: Duration,
    },
    ColumnDropped { column: String },
    RunFailed {
        column: Option<String>,
        message: String,
    },
    RunFinished {
        elapsed: Duration,
        rows: usize,
        columns: usize,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// A simple stderr logger for execution events.
#[derive(Debug, Default)]
pub struct StdErrExecutionObserver;

impl ExecutionObserver for StdErrExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        eprintln!("[pipeline] {event:?}");
    }
}

/// Forwards execution events to `tracing`.
///
/// Column and run boundaries are logged at `info`, chunk traffic at `trace`, failures at
/// `error`.
#[derive(Debug, Default)]
pub struct TracingExecutionObserver;

impl ExecutionObserver for TracingExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunStarted { columns, rows } => {
                tracing::info!(columns, rows, "pipeline run started");
            }
            ExecutionEvent::GeneratorFinished { column, rows } => {
                tracing::debug!(column = %column, rows, "generator column materialized");
            }
            ExecutionEvent::ColumnStarted {
                column,
                operation,
                rows,
            } => {
                tracing::info!(
                    column = %column,
                    operation = %operation,
                    rows,
                    "custom column started"
                );
            }
            ExecutionEvent::ThrottleWaited { duration } => {
                tracing::trace!(?duration, "chunk waited for an in-flight slot");
            }
            ExecutionEvent::ChunkStarted {
                start_row,
                row_count,
            } => {
                tracing::trace!(start_row, row_count, "chunk started");
            }
            ExecutionEvent::ChunkFinished { output_rows } => {
                tracing::trace!(output_rows, "chunk finished");
            }
            ExecutionEvent::ColumnFinished {
                column,
                operation,
                rows_before,
                rows_after,
                elapsed,
            } => {
                tracing::info!(
                    column = %column,
                    operation = %operation,
                    rows_before,
                    rows_after,
                    ?elapsed,
                    "custom column finished"
                );
            }
            ExecutionEvent::ColumnDropped { column } => {
                tracing::debug!(column = %column, "column dropped after use");
            }
            ExecutionEvent::RunFailed { column, message } => {
                tracing::error!(column = ?column, %message, "pipeline run failed");
            }
            ExecutionEvent::RunFinished {
                elapsed,
                rows,
                columns,
                metrics,
            } => {
                tracing::info!(?elapsed, rows, columns, %metrics, "pipeline run finished");
            }
        }
    }
}

/// An observer that fans out events to a list of observers.
#[derive(Default)]
pub struct CompositeExecutionObserver {
    observers: Vec<Arc<dyn ExecutionObserver>>,
}

impl CompositeExecutionObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn ExecutionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeExecutionObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeExecutionObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ExecutionObserver for CompositeExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}

/// Monotonic counter reset at the start of every run.
#[derive(Debug, Default)]
struct Counter(AtomicU64);

impl Counter {
    fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    fn bump(&self) {
        self.add(1);
    }

    fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Live counters for the current (or most recent) pipeline run.
///
/// Shared between the engine and callers through an `Arc`; read it with [`Self::snapshot`].
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: Counter,
    generators: Counter,
    columns: Counter,
    dropped: Counter,
    rows: Counter,
    chunks_in: Counter,
    chunks_out: Counter,
    throttle_ns: Counter,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run: bump the run id and zero every counter.
    pub fn begin_run(&self) {
        self.run_id.fetch_add(1, Ordering::SeqCst);
        for c in [
            &self.elapsed_ns,
            &self.generators,
            &self.columns,
            &self.dropped,
            &self.rows,
            &self.chunks_in,
            &self.chunks_out,
            &self.throttle_ns,
        ] {
            c.reset();
        }
        self.in_flight.store(0, Ordering::SeqCst);
        self.peak_in_flight.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns.reset();
        self.elapsed_ns.add(saturating_nanos(elapsed).max(1));
    }

    pub fn on_generator_applied(&self) {
        self.generators.bump();
    }

    pub fn on_column_executed(&self) {
        self.columns.bump();
    }

    pub fn on_column_dropped(&self) {
        self.dropped.bump();
    }

    pub fn on_row_processed(&self) {
        self.rows.bump();
    }

    pub fn on_chunk_start(&self) {
        self.chunks_in.bump();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    pub fn on_chunk_end(&self) {
        self.chunks_out.bump();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_throttle_wait(&self, waited: Duration) {
        self.throttle_ns.add(saturating_nanos(waited));
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed = match self.elapsed_ns.get() {
            0 => None,
            ns => Some(Duration::from_nanos(ns)),
        };
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            generators_applied: self.generators.get(),
            columns_executed: self.columns.get(),
            columns_dropped: self.dropped.get(),
            rows_processed: self.rows.get(),
            chunks_started: self.chunks_in.get(),
            chunks_finished: self.chunks_out.get(),
            throttle_wait: Duration::from_nanos(self.throttle_ns.get()),
            max_active_chunks: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub generators_applied: u64,
    pub columns_executed: u64,
    pub columns_dropped: u64,
    pub rows_processed: u64,
    pub chunks_started: u64,
    pub chunks_finished: u64,
    pub throttle_wait: Duration,
    pub max_active_chunks: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run #{}: {} generator(s), ", self.run_id, self.generators_applied)?;
        write!(
            f,
            "{} custom column(s) ({} dropped), ",
            self.columns_executed, self.columns_dropped
        )?;
        write!(
            f,
            "{} row evaluation(s) in {}/{} chunk(s), ",
            self.rows_processed, self.chunks_finished, self.chunks_started
        )?;
        write!(f, "peak {} in flight, throttled {:?}", self.max_active_chunks, self.throttle_wait)?;
        match self.elapsed {
            Some(elapsed) => write!(f, ", took {elapsed:?}"),
            None => Ok(()),
        }
    }
}
