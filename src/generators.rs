//! Generator-backed columns.
//!
//! Generators seed the table before any custom column runs. Each one produces exactly one value
//! per row and may read columns produced by generators declared before it. Randomness comes
//! from a per-generator RNG derived from the pipeline seed, so a pipeline run is reproducible.

use std::fmt;
use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PipelineError, PipelineResult, TransformError};
use crate::types::{DataSet, Row, Value};

/// Randomness and position handed to a generator while it runs.
#[derive(Debug)]
pub struct GenerationContext {
    rng: StdRng,
    position: usize,
}

impl GenerationContext {
    /// Create a context for the generator at `position` in the pipeline.
    ///
    /// Distinct positions get independent, reproducible streams for the same `seed`.
    pub fn new(seed: u64, position: usize) -> Self {
        let mixed = seed ^ (position as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            rng: StdRng::seed_from_u64(mixed),
            position,
        }
    }

    /// The generator's RNG.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Position of the generator in the pipeline's column list.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// A column whose values are produced by an external collaborator (sampler, model, ...).
pub trait ColumnGenerator: Send + Sync {
    /// Name of the produced column.
    fn name(&self) -> &str;

    /// Columns this generator reads.
    fn required_cols(&self) -> &[String] {
        &[]
    }

    /// Produce one value per row of `table`.
    fn generate(
        &self,
        table: &DataSet,
        ctx: &mut GenerationContext,
    ) -> Result<Vec<Value>, TransformError>;
}

/// Run `generator` against `table` and store its output as a column.
///
/// The generator must return exactly one value per row, and its required columns must already
/// be present.
pub fn apply_generator(
    generator: &dyn ColumnGenerator,
    table: &mut DataSet,
    ctx: &mut GenerationContext,
) -> PipelineResult<()> {
    let missing: Vec<String> = generator
        .required_cols()
        .iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::MissingDependency {
            column: generator.name().to_string(),
            missing,
        });
    }

    let values = generator.generate(table, ctx).map_err(|e| PipelineError::Generator {
        column: generator.name().to_string(),
        message: e.to_string(),
    })?;
    table
        .set_column(generator.name(), values)
        .map_err(|e| PipelineError::Generator {
            column: generator.name().to_string(),
            message: e.to_string(),
        })
}

/// Samples uniformly (or by weight) from a fixed list of category values.
#[derive(Debug, Clone)]
pub struct CategorySampler {
    name: String,
    values: Vec<Value>,
    weights: Option<Vec<f64>>,
}

impl CategorySampler {
    /// Uniform sampler over `values`.
    pub fn new<V>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> PipelineResult<Self>
    where
        V: Into<Value>,
    {
        let name = name.into();
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if name.trim().is_empty() {
            return Err(PipelineError::config("sampler column name must not be empty"));
        }
        if values.is_empty() {
            return Err(PipelineError::config(format!(
                "category sampler '{name}' needs at least one value"
            )));
        }
        Ok(Self {
            name,
            values,
            weights: None,
        })
    }

    /// Weight each value; `weights` must be the same length as the values and not all zero.
    pub fn with_weights(mut self, weights: Vec<f64>) -> PipelineResult<Self> {
        if weights.len() != self.values.len() {
            return Err(PipelineError::config(format!(
                "category sampler '{}' has {} values but {} weights",
                self.name,
                self.values.len(),
                weights.len()
            )));
        }
        WeightedIndex::new(&weights).map_err(|e| {
            PipelineError::config(format!(
                "category sampler '{}' has invalid weights: {e}",
                self.name
            ))
        })?;
        self.weights = Some(weights);
        Ok(self)
    }
}

impl ColumnGenerator for CategorySampler {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(
        &self,
        table: &DataSet,
        ctx: &mut GenerationContext,
    ) -> Result<Vec<Value>, TransformError> {
        let n = table.row_count();
        match &self.weights {
            Some(weights) => {
                let dist = WeightedIndex::new(weights)
                    .map_err(|e| TransformError::with_source("invalid weights", e))?;
                Ok((0..n)
                    .map(|_| self.values[dist.sample(ctx.rng())].clone())
                    .collect())
            }
            None => Ok((0..n)
                .map(|_| self.values[ctx.rng().gen_range(0..self.values.len())].clone())
                .collect()),
        }
    }
}

/// Samples integers uniformly from an inclusive range.
#[derive(Debug, Clone)]
pub struct UniformIntSampler {
    name: String,
    low: i64,
    high: i64,
}

impl UniformIntSampler {
    /// Sampler over `low..=high`.
    pub fn new(name: impl Into<String>, low: i64, high: i64) -> PipelineResult<Self> {
        let name = name.into();
        if low > high {
            return Err(PipelineError::config(format!(
                "uniform sampler '{name}' has low {low} > high {high}"
            )));
        }
        Ok(Self { name, low, high })
    }
}

impl ColumnGenerator for UniformIntSampler {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(
        &self,
        table: &DataSet,
        ctx: &mut GenerationContext,
    ) -> Result<Vec<Value>, TransformError> {
        Ok((0..table.row_count())
            .map(|_| Value::Int64(ctx.rng().gen_range(self.low..=self.high)))
            .collect())
    }
}

type RowGenFn = dyn Fn(Row<'_>, &mut StdRng) -> Result<Value, TransformError> + Send + Sync;

/// Generator driven by a closure evaluated once per row, in row order.
///
/// Stands in for model-backed generators: the closure may read earlier generator columns from
/// the row and return a nested [`Value::Object`] as the cell value.
#[derive(Clone)]
pub struct FnGenerator {
    name: String,
    required_cols: Vec<String>,
    f: Arc<RowGenFn>,
}

impl FnGenerator {
    /// Create a generator from a per-row closure.
    ///
    /// The name and every required column must be non-blank.
    pub fn new<I, S, F>(name: impl Into<String>, required_cols: I, f: F) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Row<'_>, &mut StdRng) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PipelineError::config("generator column name must not be empty"));
        }
        let required_cols: Vec<String> = required_cols.into_iter().map(Into::into).collect();
        if required_cols.iter().any(|c| c.trim().is_empty()) {
            return Err(PipelineError::config(format!(
                "generator '{name}' lists an empty required column"
            )));
        }
        Ok(Self {
            name,
            required_cols,
            f: Arc::new(f),
        })
    }
}

impl fmt::Debug for FnGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGenerator")
            .field("name", &self.name)
            .field("required_cols", &self.required_cols)
            .finish()
    }
}

impl ColumnGenerator for FnGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_cols(&self) -> &[String] {
        &self.required_cols
    }

    fn generate(
        &self,
        table: &DataSet,
        ctx: &mut GenerationContext,
    ) -> Result<Vec<Value>, TransformError> {
        table
            .rows()
            .map(|row| {
                (self.f)(row, ctx.rng())
                    .map_err(|e| TransformError::with_source(format!("row {}", row.index()), e))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::Rng;

    use super::{
        apply_generator, CategorySampler, FnGenerator, GenerationContext, UniformIntSampler,
    };
    use crate::error::{PipelineError, TransformError};
    use crate::types::{DataSet, Row, Value};

    #[test]
    fn category_sampler_draws_only_listed_values() {
        let generator = CategorySampler::new("a", [2_i64, 3, 4]).unwrap();
        let mut table = DataSet::with_row_count(50);
        apply_generator(&generator, &mut table, &mut GenerationContext::new(7, 0)).unwrap();

        let allowed = [Value::Int64(2), Value::Int64(3), Value::Int64(4)];
        let col = table.column("a").unwrap();
        assert_eq!(col.len(), 50);
        assert!(col.iter().all(|v| allowed.contains(v)));
    }

    #[test]
    fn same_seed_and_position_is_reproducible() {
        let generator = UniformIntSampler::new("n", 0, 1_000).unwrap();
        let run = |seed, pos| {
            let mut t = DataSet::with_row_count(20);
            apply_generator(&generator, &mut t, &mut GenerationContext::new(seed, pos)).unwrap();
            t
        };
        assert_eq!(run(1, 0), run(1, 0));
        assert_ne!(run(1, 0), run(1, 1));
    }

    #[test]
    fn zero_weight_values_are_never_drawn() {
        let generator = CategorySampler::new("c", ["x", "y"])
            .unwrap()
            .with_weights(vec![0.0, 1.0])
            .unwrap();
        let mut table = DataSet::with_row_count(30);
        apply_generator(&generator, &mut table, &mut GenerationContext::new(3, 0)).unwrap();
        assert!(table.column("c").unwrap().iter().all(|v| **v == Value::from("y")));
    }

    #[test]
    fn invalid_sampler_configs_are_rejected() {
        assert!(CategorySampler::new("a", Vec::<i64>::new()).is_err());
        assert!(CategorySampler::new("a", [1_i64]).unwrap().with_weights(vec![]).is_err());
        assert!(CategorySampler::new("a", [1_i64]).unwrap().with_weights(vec![0.0]).is_err());
        assert!(UniformIntSampler::new("u", 5, 1).is_err());
    }

    #[test]
    fn fn_generator_reads_earlier_columns() {
        let mut table = DataSet::with_row_count(3);
        table
            .set_column("a", vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)])
            .unwrap();
        let generator = FnGenerator::new("double", ["a"], |row, rng| {
            let _ = rng.r#gen::<u8>();
            Ok(Value::Int64(row.i64("a")? * 2))
        })
        .unwrap();
        apply_generator(&generator, &mut table, &mut GenerationContext::new(0, 1)).unwrap();
        assert_eq!(
            table.column("double").unwrap(),
            vec![&Value::Int64(2), &Value::Int64(4), &Value::Int64(6)]
        );
    }

    #[test]
    fn generator_missing_input_reports_dependency() {
        let generator = FnGenerator::new("g", ["nope"], |_, _| Ok(Value::Null)).unwrap();
        let mut table = DataSet::with_row_count(1);
        let err = apply_generator(&generator, &mut table, &mut GenerationContext::new(0, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingDependency { ref missing, .. } if missing == &["nope".to_string()]
        ));
    }

    #[test]
    fn generator_failure_is_wrapped_with_column_name() {
        let generator = FnGenerator::new("g", Vec::<String>::new(), |_, _| {
            Err("model unavailable".into())
        })
        .unwrap();
        let mut table = DataSet::with_row_count(2);
        let err = apply_generator(&generator, &mut table, &mut GenerationContext::new(0, 0))
            .unwrap_err();
        assert_eq!(err.column(), Some("g"));
        assert!(err.to_string().contains("model unavailable"));
    }

    #[test]
    fn fn_generator_rejects_blank_names() {
        let ok = |_: Row<'_>, _: &mut StdRng| -> Result<Value, TransformError> { Ok(Value::Null) };
        assert!(matches!(
            FnGenerator::new("  ", Vec::<String>::new(), ok),
            Err(PipelineError::Configuration { .. })
        ));
        assert!(matches!(
            FnGenerator::new("g", [""], ok),
            Err(PipelineError::Configuration { .. })
        ));
        assert!(FnGenerator::new("g", ["a"], ok).is_ok());
    }
}
