use crate::error::{Result, RowforgeError};
use crate::value::Value;

/// A materialized result row: column names and their values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn value(&self, column: &str) -> Result<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
            .ok_or_else(|| RowforgeError::decode(column, "no such column in result"))
    }

    fn present(&self, column: &str) -> Result<&Value> {
        match self.value(column)? {
            Value::Null => Err(RowforgeError::decode(column, "unexpected NULL")),
            value => Ok(value),
        }
    }

    pub fn integer(&self, column: &str) -> Result<i64> {
        match self.present(column)? {
            Value::Integer(i) => Ok(*i),
            other => Err(mismatch(column, "INTEGER", other)),
        }
    }
    /// Integers are widened, as SQLite does when reading REAL affinity.
    pub fn real(&self, column: &str) -> Result<f64> {
        match self.present(column)? {
            Value::Real(r) => Ok(*r),
            Value::Integer(i) => Ok(*i as f64),
            other => Err(mismatch(column, "REAL", other)),
        }
    }
    pub fn text(&self, column: &str) -> Result<String> {
        match self.present(column)? {
            Value::Text(t) => Ok(t.clone()),
            other => Err(mismatch(column, "TEXT", other)),
        }
    }
    pub fn bytes(&self, column: &str) -> Result<Vec<u8>> {
        match self.present(column)? {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(mismatch(column, "BLOB", other)),
        }
    }

    pub fn optional_integer(&self, column: &str) -> Result<Option<i64>> {
        self.optional(column, Self::integer)
    }
    pub fn optional_real(&self, column: &str) -> Result<Option<f64>> {
        self.optional(column, Self::real)
    }
    pub fn optional_text(&self, column: &str) -> Result<Option<String>> {
        self.optional(column, Self::text)
    }
    pub fn optional_bytes(&self, column: &str) -> Result<Option<Vec<u8>>> {
        self.optional(column, Self::bytes)
    }

    fn optional<T>(&self, column: &str, read: fn(&Self, &str) -> Result<T>) -> Result<Option<T>> {
        if self.value(column)?.is_null() {
            Ok(None)
        } else {
            read(self, column).map(Some)
        }
    }
}

fn mismatch(column: &str, expected: &str, found: &Value) -> RowforgeError {
    RowforgeError::decode(column, format!("expected {}, found {}", expected, found.kind()))
}
