//! Sample two numbers, ask a (fake) model for `a` greetings, then split the greetings into one
//! row each.
//!
//! Run with `cargo run --example greetings`.

use std::sync::Arc;

use rand::seq::SliceRandom;

use synth_pipeline::column::{ColumnOperation, CustomColumn};
use synth_pipeline::execution::{ExecutionOptions, StdErrExecutionObserver};
use synth_pipeline::generators::{CategorySampler, FnGenerator};
use synth_pipeline::output;
use synth_pipeline::pipeline::{PipelineBuilder, PipelineOptions};
use synth_pipeline::types::Value;
use synth_pipeline::PipelineResult;

const PHRASES: &[&str] = &[
    "Hello",
    "Bonjour",
    "Hola",
    "Ciao",
    "Hallo",
    "Olá",
    "Namaste",
    "Konnichiwa",
    "Merhaba",
    "Salam",
];

fn main() -> PipelineResult<()> {
    let mut builder = PipelineBuilder::new();

    builder.add_column(CategorySampler::new("a", [2_i64, 3, 4])?);

    // Stands in for a structured model call returning {"greetings": [...]}.
    builder.add_column(FnGenerator::new("greetings", ["a"], |row, rng| {
        let n = row.i64("a")? as usize;
        let picked: Vec<serde_json::Value> = PHRASES
            .choose_multiple(rng, n)
            .map(|s| serde_json::Value::from(*s))
            .collect();
        Ok(serde_json::json!({ "greetings": picked }).into())
    })?);

    builder.add_column(CategorySampler::new("b", [1_i64, 2, 3])?);

    builder.add_column(CustomColumn::from_parts(
        "sum_ab",
        ["a", "b"],
        "row",
        ColumnOperation::row(|row| Ok(Value::Int64(row.i64("a")? + row.i64("b")?))),
        false,
    )?);

    builder.add_column(CustomColumn::from_parts(
        "split_greetings",
        ["greetings"],
        "row",
        ColumnOperation::row(|row| Ok(row.require("greetings.greetings")?.clone())),
        true,
    )?);

    builder.add_column(CustomColumn::from_parts(
        "greeting",
        ["split_greetings"],
        "full",
        ColumnOperation::full(|table| {
            let mut table = table.explode("split_greetings")?;
            table.map_column("greeting", |row| Ok(row.require("split_greetings")?.clone()))?;
            Ok(table)
        }),
        false,
    )?);

    let pipeline = builder.build(PipelineOptions {
        seed: 2024,
        execution: ExecutionOptions::default(),
        observer: Some(Arc::new(StdErrExecutionObserver)),
    })?;

    let ds = pipeline.create(2)?;
    println!("{ds}");
    println!("{}", pipeline.metrics().snapshot());

    output::write_json(&ds, std::io::stdout().lock())?;
    println!();
    Ok(())
}
