//! Result handling and typed deserialization
//!
//! This module provides utilities for working with query results, including
//! type-safe deserialization into Rust structs.

use crate::error::{Error, Result};
use graphtx::{QueryResult, Row, Value};
use serde::de::DeserializeOwned;

/// Materialized query result with type-safe accessors
///
/// Building a TypedResult drains the lazy [`QueryResult`], so it must happen
/// while the producing transaction is still open. The rows stay usable after
/// the transaction finishes.
///
/// # Examples
///
/// ```no_run
/// use serde::Deserialize;
/// use graphtx_sdk::{QueryEngine, MemoryBackend, SessionExt, TypedResult};
///
/// #[derive(Deserialize, Debug)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// # fn main() -> Result<(), graphtx_sdk::Error> {
/// let engine = QueryEngine::new(MemoryBackend::new());
/// let mut session = engine.session();
/// let mut tx = session.transaction()?;
/// let typed = tx.query("MATCH (p:Person) RETURN p.name AS name, p.age AS age")?;
/// tx.commit()?;
///
/// for person in typed.deserialize_rows::<Person>()? {
///     println!("Person: {:?}", person);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TypedResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl TypedResult {
    /// Drain a QueryResult into memory
    pub fn collect(result: QueryResult) -> Result<Self> {
        let columns = result.columns().to_vec();
        let rows = result.collect_rows()?;
        Ok(TypedResult { columns, rows })
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the column names
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Get a specific row by index
    pub fn get_row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Check if the result is empty (no rows)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Deserialize all rows into a vector of the given type
    ///
    /// Each row is converted to a JSON object keyed by column name and then
    /// deserialized into the target type using serde.
    pub fn deserialize_rows<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.rows
            .iter()
            .map(|row| self.deserialize_row(row))
            .collect()
    }

    /// Deserialize a single row into the given type
    pub fn deserialize_row<T: DeserializeOwned>(&self, row: &Row) -> Result<T> {
        let object: serde_json::Map<String, serde_json::Value> = row
            .columns()
            .iter()
            .zip(row.values())
            .map(|(column, value)| (column.clone(), value_to_json(value)))
            .collect();
        Ok(serde_json::from_value(serde_json::Value::Object(object))?)
    }

    /// Get the first row as the given type
    pub fn first<T: DeserializeOwned>(&self) -> Result<T> {
        let row = self
            .get_row(0)
            .ok_or_else(|| Error::NotFound("No rows returned".to_string()))?;

        self.deserialize_row(row)
    }

    /// Get a single value from the first row and first column
    ///
    /// Useful for queries that return a single scalar value.
    pub fn scalar<T: DeserializeOwned>(&self) -> Result<T> {
        let row = self
            .get_row(0)
            .ok_or_else(|| Error::NotFound("No rows returned".to_string()))?;

        let value = row
            .get_index(0)
            .ok_or_else(|| Error::NotFound("No columns returned".to_string()))?;

        value_to_type(value)
    }
}

impl TryFrom<QueryResult> for TypedResult {
    type Error = Error;

    fn try_from(result: QueryResult) -> Result<Self> {
        TypedResult::collect(result)
    }
}

/// Convert a GraphTx Value to a Rust type
fn value_to_type<T: DeserializeOwned>(value: &Value) -> Result<T> {
    serde_json::from_value(value_to_json(value)).map_err(|e| {
        Error::TypeConversion(format!("cannot convert {} value: {}", value.type_name(), e))
    })
}

/// Convert a GraphTx Value to a serde_json Value
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        // Integral numbers become JSON integers so they deserialize into integer fields
        Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            serde_json::json!(*n as i64)
        }
        Value::Number(n) => serde_json::json!(n),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), value_to_json(item)))
                .collect(),
        ),
    }
}
