//! Core data model: structured [`Value`]s, the column [`Schema`] and the in-memory [`DataSet`]
//! that every pipeline step reads from and writes into.
//!
//! Cells hold untyped structured values. A generator may store a nested object in a single
//! cell, and a later row-wise transform can read fields out of it by name or dot path.

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{TableError, TransformError};

/// A single structured value stored in a [`DataSet`] cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// Insertion-ordered mapping of field name to value.
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer payload, if this is an [`Value::Int64`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload widened to `f64` (integers included).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(v) => Some(*v),
            Self::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// List payload.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Object payload.
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Field of an object value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Walk nested objects using a dot path (e.g. `user.name`).
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Convert to a `serde_json::Value`.
    ///
    /// Non-finite floats become JSON `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int64(n) => serde_json::Value::from(*n),
            Self::Float64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Utf8(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int64(i),
                None => n.as_f64().map(Self::Float64).unwrap_or(Self::Null),
            },
            serde_json::Value::String(s) => Self::Utf8(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Utf8(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int64(n) => write!(f, "{n}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Utf8(s) => f.write_str(s),
            Self::List(_) | Self::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Ordered list of column names describing the row shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Column names, in row order.
    pub columns: Vec<String>,
}

impl Schema {
    /// Create a schema from column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Iterate column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns `true` if the schema contains `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Borrowed view of one row, addressable by column name.
///
/// This is what row-wise transforms receive.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    schema: &'a Schema,
    values: &'a [Value],
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of the row in its table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of a column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.schema.index_of(column).and_then(|i| self.values.get(i))
    }

    /// Value at a dot path: the first segment names the column, the rest walk nested objects.
    pub fn get_path(&self, path: &str) -> Option<&'a Value> {
        match path.split_once('.') {
            Some((column, rest)) => self.get(column)?.get_path(rest),
            None => self.get(path),
        }
    }

    /// Value of a column, or an error naming the missing column.
    pub fn require(&self, column: &str) -> Result<&'a Value, TransformError> {
        self.get_path(column).ok_or_else(|| {
            TransformError::msg(format!("row {} has no field '{column}'", self.index))
        })
    }

    /// Integer value of a column.
    pub fn i64(&self, column: &str) -> Result<i64, TransformError> {
        let v = self.require(column)?;
        v.as_i64()
            .ok_or_else(|| TransformError::msg(format!("field '{column}' is not an integer: {v}")))
    }

    /// Numeric value of a column, widened to `f64`.
    pub fn f64(&self, column: &str) -> Result<f64, TransformError> {
        let v = self.require(column)?;
        v.as_f64()
            .ok_or_else(|| TransformError::msg(format!("field '{column}' is not a number: {v}")))
    }

    /// String value of a column.
    pub fn str(&self, column: &str) -> Result<&'a str, TransformError> {
        let v = self.require(column)?;
        v.as_str()
            .ok_or_else(|| TransformError::msg(format!("field '{column}' is not a string: {v}")))
    }

    /// Raw values in schema order.
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Iterate `(column, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + use<'a> {
        let (schema, values) = (self.schema, self.values);
        schema.column_names().zip(values.iter())
    }

    /// Owned copy of the row as an ordered mapping.
    pub fn to_record(&self) -> IndexMap<String, Value> {
        self.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }
}

/// In-memory tabular dataset: the table state a pipeline builds up.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] columns. A table
/// may have rows but no columns (a freshly sized table before any generator has run).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A table with `n` rows and no columns, ready to receive generated columns.
    pub fn with_row_count(n: usize) -> Self {
        Self {
            schema: Schema::default(),
            rows: vec![Vec::new(); n],
        }
    }

    /// Build a table from records. Columns are the union of record keys in first-seen order;
    /// keys missing from a record become [`Value::Null`].
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = IndexMap<String, Value>>,
    {
        let records: Vec<_> = records.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for record in &records {
            for key in record.keys() {
                if seen.insert(key.clone()) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|c| record.swap_remove(c).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self {
            schema: Schema { columns },
            rows,
        }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    /// Returns `true` if `name` is a current column.
    pub fn has_column(&self, name: &str) -> bool {
        self.schema.contains(name)
    }

    /// Borrow one row.
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            schema: &self.schema,
            values,
            index,
        })
    }

    /// Iterate rows as named views.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = Row<'_>> {
        self.rows.iter().enumerate().map(|(index, values)| Row {
            schema: &self.schema,
            values,
            index,
        })
    }

    /// Iterate the rows in `range` as named views, without walking the rows before it.
    ///
    /// The range is clamped to the row count.
    pub fn rows_in(&self, range: Range<usize>) -> impl ExactSizeIterator<Item = Row<'_>> {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        self.rows[start..end]
            .iter()
            .zip(start..end)
            .map(move |(values, index)| Row {
                schema: &self.schema,
                values,
                index,
            })
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>, TableError> {
        let idx = self.index_or_err(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Add a column, or overwrite it if it already exists.
    ///
    /// `values` must hold exactly one value per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<(), TableError> {
        if values.len() != self.row_count() {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.row_count(),
                actual: values.len(),
            });
        }
        match self.schema.index_of(name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.schema.columns.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        Ok(())
    }

    /// Consuming variant of [`Self::set_column`], convenient inside whole-table transforms.
    pub fn with_column(mut self, name: &str, values: Vec<Value>) -> Result<Self, TableError> {
        self.set_column(name, values)?;
        Ok(self)
    }

    /// Derive a column by evaluating `f` on every row.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<(), TransformError>
    where
        F: FnMut(Row<'_>) -> Result<Value, TransformError>,
    {
        let values = self.rows().map(&mut f).collect::<Result<Vec<_>, _>>()?;
        self.set_column(name, values)?;
        Ok(())
    }

    /// Remove a column, returning its values.
    pub fn drop_column(&mut self, name: &str) -> Result<Vec<Value>, TableError> {
        let idx = self.index_or_err(name)?;
        self.schema.columns.remove(idx);
        Ok(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Rename a column in place.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<(), TableError> {
        if from != to && self.has_column(to) {
            return Err(TableError::DuplicateColumn(to.to_string()));
        }
        let idx = self.index_or_err(from)?;
        self.schema.columns[idx] = to.to_string();
        Ok(())
    }

    /// New table holding only the listed columns, in the listed order.
    pub fn select(&self, columns: &[&str]) -> Result<Self, TableError> {
        let idxs = columns
            .iter()
            .map(|c| self.index_or_err(c))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Self::new(Schema::new(columns.iter().copied()), rows))
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(Row<'_>) -> bool,
    {
        let rows = self
            .rows()
            .filter(|row| predicate(*row))
            .map(|row| row.values().to_vec())
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Expand a list-valued column into one row per element.
    ///
    /// Other columns are copied verbatim into every produced row. An empty list yields a single
    /// row holding [`Value::Null`]; a non-list cell is kept as a single unchanged row.
    pub fn explode(self, column: &str) -> Result<Self, TableError> {
        let idx = self.index_or_err(column)?;
        let mut rows = Vec::with_capacity(self.rows.len());
        for mut row in self.rows {
            match std::mem::take(&mut row[idx]) {
                Value::List(items) if items.is_empty() => rows.push(row),
                Value::List(items) => {
                    for item in items {
                        let mut out = row.clone();
                        out[idx] = item;
                        rows.push(out);
                    }
                }
                other => {
                    row[idx] = other;
                    rows.push(row);
                }
            }
        }
        Ok(Self {
            schema: self.schema,
            rows,
        })
    }

    /// Check structural well-formedness: at least one column, unique column names and one
    /// value per column in every row.
    pub fn validate(&self) -> Result<(), TableError> {
        if self.schema.is_empty() {
            return Err(TableError::EmptySchema);
        }
        let mut seen = HashSet::with_capacity(self.schema.len());
        for name in self.schema.column_names() {
            if !seen.insert(name) {
                return Err(TableError::DuplicateColumn(name.to_string()));
            }
        }
        let expected = self.schema.len();
        for (row, values) in self.rows.iter().enumerate() {
            if values.len() != expected {
                return Err(TableError::RaggedRow {
                    row,
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }

    /// Owned copy of every row as an ordered mapping.
    pub fn to_records(&self) -> Vec<IndexMap<String, Value>> {
        self.rows().map(|row| row.to_record()).collect()
    }

    fn index_or_err(&self, name: &str) -> Result<usize, TableError> {
        self.schema
            .index_of(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }
}

/// Renders the table as a plain-text grid (nested values as compact JSON).
impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .schema
            .column_names()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(i).map(String::len))
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .schema
            .column_names()
            .zip(&widths)
            .map(|(name, &w)| format!("{name:<w$}"))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;
        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| format!("{cell:<w$}"))
                .collect();
            writeln!(f, "{}", line.join(" | ").trim_end())?;
        }
        write!(f, "[{} rows x {} columns]", self.row_count(), self.column_count())
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::{DataSet, Schema, Value};
    use crate::error::TableError;

    fn sample_dataset() -> DataSet {
        let schema = Schema::new(["id", "tags", "name"]);
        let rows = vec![
            vec![Value::Int64(1), Value::from(vec!["x", "y"]), Value::from("a")],
            vec![Value::Int64(2), Value::List(vec![]), Value::from("b")],
            vec![Value::Int64(3), Value::from("solo"), Value::from("c")],
        ];
        DataSet::new(schema, rows)
    }

    #[test]
    fn rows_in_yields_absolute_indices_and_clamps() {
        let ds = DataSet::new(
            Schema::new(["n"]),
            (0..5_i64).map(|n| vec![Value::Int64(n)]).collect(),
        );
        let picked: Vec<(usize, i64)> = ds
            .rows_in(2..4)
            .map(|row| (row.index(), row.i64("n").unwrap()))
            .collect();
        assert_eq!(picked, vec![(2, 2), (3, 3)]);
        assert_eq!(ds.rows_in(3..99).len(), 2);
        assert_eq!(ds.rows_in(7..9).len(), 0);
    }

    #[test]
    fn schema_index_of_works() {
        let ds = sample_dataset();
        assert_eq!(ds.schema.index_of("id"), Some(0));
        assert_eq!(ds.schema.index_of("name"), Some(2));
        assert_eq!(ds.schema.index_of("missing"), None);
    }

    #[test]
    fn row_view_reads_nested_paths() {
        let mut inner = IndexMap::new();
        inner.insert("greetings".to_string(), Value::from(vec!["hi", "hola"]));
        let ds = DataSet::new(
            Schema::new(["greetings"]),
            vec![vec![Value::Object(inner)]],
        );
        let row = ds.row(0).unwrap();
        assert_eq!(
            row.get_path("greetings.greetings"),
            Some(&Value::from(vec!["hi", "hola"]))
        );
        assert!(row.require("greetings.missing").is_err());
        assert!(row.i64("greetings").is_err());
    }

    #[test]
    fn set_column_appends_then_overwrites() {
        let mut ds = sample_dataset();
        ds.set_column("score", vec![Value::Int64(10), Value::Int64(20), Value::Int64(30)])
            .unwrap();
        assert_eq!(ds.schema.columns.last().map(String::as_str), Some("score"));
        assert_eq!(ds.column_count(), 4);

        ds.set_column("id", vec![Value::Null, Value::Null, Value::Null])
            .unwrap();
        assert_eq!(ds.column_count(), 4);
        assert_eq!(ds.column("id").unwrap(), vec![&Value::Null; 3]);
    }

    #[test]
    fn set_column_rejects_wrong_length() {
        let mut ds = sample_dataset();
        let err = ds.set_column("score", vec![Value::Int64(1)]).unwrap_err();
        assert_eq!(
            err,
            TableError::LengthMismatch {
                column: "score".to_string(),
                expected: 3,
                actual: 1,
            }
        );
        assert!(!ds.has_column("score"));
    }

    #[test]
    fn drop_column_removes_values_from_every_row() {
        let mut ds = sample_dataset();
        let dropped = ds.drop_column("tags").unwrap();
        assert_eq!(dropped.len(), 3);
        assert_eq!(ds.schema, Schema::new(["id", "name"]));
        assert!(ds.rows.iter().all(|r| r.len() == 2));
        assert_eq!(
            ds.drop_column("tags"),
            Err(TableError::UnknownColumn("tags".to_string()))
        );
    }

    #[test]
    fn explode_expands_lists_and_copies_other_columns() {
        let out = sample_dataset().explode("tags").unwrap();
        assert_eq!(out.row_count(), 4);
        assert_eq!(
            out.rows,
            vec![
                vec![Value::Int64(1), Value::from("x"), Value::from("a")],
                vec![Value::Int64(1), Value::from("y"), Value::from("a")],
                vec![Value::Int64(2), Value::Null, Value::from("b")],
                vec![Value::Int64(3), Value::from("solo"), Value::from("c")],
            ]
        );
    }

    #[test]
    fn validate_detects_ragged_rows_and_duplicates() {
        let ragged = DataSet::new(
            Schema::new(["a", "b"]),
            vec![vec![Value::Int64(1), Value::Int64(2)], vec![Value::Int64(3)]],
        );
        assert_eq!(
            ragged.validate(),
            Err(TableError::RaggedRow {
                row: 1,
                expected: 2,
                actual: 1
            })
        );

        let dup = DataSet::new(Schema::new(["a", "a"]), vec![]);
        assert_eq!(dup.validate(), Err(TableError::DuplicateColumn("a".to_string())));
        assert_eq!(DataSet::with_row_count(2).validate(), Err(TableError::EmptySchema));
    }

    #[test]
    fn from_records_unions_keys_in_first_seen_order() {
        let mut r1 = IndexMap::new();
        r1.insert("a".to_string(), Value::Int64(1));
        let mut r2 = IndexMap::new();
        r2.insert("b".to_string(), Value::Int64(2));
        r2.insert("a".to_string(), Value::Int64(3));

        let ds = DataSet::from_records(vec![r1, r2]);
        assert_eq!(ds.schema, Schema::new(["a", "b"]));
        assert_eq!(
            ds.rows,
            vec![
                vec![Value::Int64(1), Value::Null],
                vec![Value::Int64(3), Value::Int64(2)],
            ]
        );
        assert_eq!(ds.to_records()[1].get("b"), Some(&Value::Int64(2)));
    }

    #[test]
    fn filter_rows_preserves_schema() {
        let ds = sample_dataset();
        let out = ds.filter_rows(|row| row.i64("id").map(|v| v > 1).unwrap_or(false));
        assert_eq!(out.schema, ds.schema);
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn json_conversion_keeps_nested_shape() {
        let json = serde_json::json!({"n": 1, "f": 1.5, "xs": ["a", null], "o": {"k": true}});
        let v = Value::from(json.clone());
        assert_eq!(v.get("n"), Some(&Value::Int64(1)));
        assert_eq!(v.get_path("o.k"), Some(&Value::Bool(true)));
        assert_eq!(v.to_json(), json);
    }

    #[test]
    fn display_renders_header_and_shape() {
        let text = sample_dataset().to_string();
        assert!(text.starts_with("id | tags"));
        assert!(text.ends_with("[3 rows x 3 columns]"));
    }
}
