//! Rendering a finished [`DataSet`] for hand-off.
//!
//! Supported outputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//! - CSV with a header row. Nested values are written as compact JSON text and nulls as empty
//!   cells.

use std::io::Write;

use crate::error::PipelineResult;
use crate::types::{DataSet, Value};

/// Render the dataset as a JSON array of objects, preserving column order.
pub fn to_json_records(dataset: &DataSet) -> serde_json::Value {
    serde_json::Value::Array(
        dataset
            .rows()
            .map(|row| {
                serde_json::Value::Object(
                    row.iter()
                        .map(|(k, v)| (k.to_string(), v.to_json()))
                        .collect(),
                )
            })
            .collect(),
    )
}

/// Write the dataset as a pretty-printed JSON array of objects.
pub fn write_json<W: Write>(dataset: &DataSet, writer: W) -> PipelineResult<()> {
    serde_json::to_writer_pretty(writer, &to_json_records(dataset))?;
    Ok(())
}

/// Write the dataset as NDJSON, one object per line.
pub fn write_ndjson<W: Write>(dataset: &DataSet, mut writer: W) -> PipelineResult<()> {
    for row in dataset.rows() {
        let obj: serde_json::Map<String, serde_json::Value> =
            row.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect();
        serde_json::to_writer(&mut writer, &obj)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the dataset as CSV with a header row.
pub fn write_csv<W: Write>(dataset: &DataSet, writer: W) -> PipelineResult<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(dataset.schema.column_names())?;
    for row in &dataset.rows {
        w.write_record(row.iter().map(csv_cell))?;
    }
    w.flush()?;
    Ok(())
}

fn csv_cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
