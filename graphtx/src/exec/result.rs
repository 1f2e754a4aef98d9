// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lazily consumed query results
//!
//! A `QueryResult` pulls rows from the backend one at a time. It stays bound
//! to the physical transaction that produced it: once that transaction
//! finishes, any further read fails with `ResultDetached` instead of touching
//! a connection that has already been released.
//!
//! ```ignore
//! let result = session.execute("MATCH (n:Person) RETURN n.name")?;
//! for row in result.take(10) {
//!     println!("{}", row?.get("n.name").unwrap_or(&Value::Null));
//! }
//! ```

use crate::backend::RawResultSet;
use crate::exec::error::{EngineError, Result};
use crate::session::TransactionLease;
use crate::types::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One result row with positional values and the result's column names
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Value of the named column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|index| self.values.get(index))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Column name to value map
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.columns
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

/// Forward-only cursor over the rows of one execution
pub struct QueryResult {
    query: String,
    columns: Arc<[String]>,
    raw: Box<dyn RawResultSet>,
    lease: Arc<TransactionLease>,
    rows_read: usize,
    exhausted: bool,
    /// Set once the iterator yielded an error; iteration stops afterwards
    failed: bool,
}

impl QueryResult {
    pub(crate) fn new(
        query: String,
        raw: Box<dyn RawResultSet>,
        lease: Arc<TransactionLease>,
    ) -> Self {
        let columns: Arc<[String]> = raw.columns().to_vec().into();
        Self {
            query,
            columns,
            raw,
            lease,
            rows_read: 0,
            exhausted: false,
            failed: false,
        }
    }

    /// Query text that produced this result
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether the producing transaction is still open
    pub fn is_attached(&self) -> bool {
        !self.lease.is_finished()
    }

    /// Fetch the next row
    ///
    /// # Returns
    /// * `Ok(Some(row))` for each row, then `Ok(None)` once exhausted
    /// * `ResultDetached` if the producing transaction has finished
    /// * `QueryExecution` if the backend fails while fetching
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if self.lease.is_finished() {
            return Err(EngineError::ResultDetached);
        }
        if self.exhausted {
            return Ok(None);
        }

        match self.raw.next_row() {
            Ok(Some(values)) => {
                self.rows_read += 1;
                Ok(Some(Row::new(self.columns.clone(), values)))
            }
            Ok(None) => {
                self.exhausted = true;
                Ok(None)
            }
            Err(source) => Err(EngineError::query(&self.query, source)),
        }
    }

    /// Drain the remaining rows
    pub fn collect_rows(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

impl Iterator for QueryResult {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_row() {
            Ok(row) => row.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("query", &self.query)
            .field("columns", &self.columns)
            .field("rows_read", &self.rows_read)
            .field("exhausted", &self.exhausted)
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendResult};
    use std::collections::VecDeque;

    struct ScriptedRows {
        columns: Vec<String>,
        rows: VecDeque<BackendResult<Vec<Value>>>,
    }

    impl RawResultSet for ScriptedRows {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        fn next_row(&mut self) -> BackendResult<Option<Vec<Value>>> {
            self.rows.pop_front().transpose()
        }
    }

    fn result_of(rows: Vec<BackendResult<Vec<Value>>>) -> (QueryResult, Arc<TransactionLease>) {
        let lease = Arc::new(TransactionLease::new());
        let raw = ScriptedRows {
            columns: vec!["name".to_string(), "age".to_string()],
            rows: rows.into(),
        };
        let query = "MATCH (p) RETURN p.name AS name, p.age AS age".to_string();
        let result = QueryResult::new(query, Box::new(raw), lease.clone());
        (result, lease)
    }

    #[test]
    fn test_lazy_iteration() {
        let (mut result, _lease) = result_of(vec![
            Ok(vec![Value::from("Ada"), Value::from(36)]),
            Ok(vec![Value::from("Alan"), Value::from(41)]),
        ]);

        assert_eq!(result.rows_read(), 0);
        let first = result.next_row().unwrap().unwrap();
        assert_eq!(first.get("name"), Some(&Value::from("Ada")));
        assert_eq!(first.get_index(1), Some(&Value::Number(36.0)));
        assert_eq!(result.rows_read(), 1);

        let rest: Vec<Row> = result.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(rest.len(), 1);
        assert!(result.is_exhausted());
        assert!(result.next_row().unwrap().is_none());
    }

    #[test]
    fn test_read_after_finish_fails() {
        let (mut result, lease) = result_of(vec![Ok(vec![Value::from("Ada"), Value::Null])]);
        lease.expire();

        assert!(!result.is_attached());
        let err = result.next_row().unwrap_err();
        assert!(matches!(err, EngineError::ResultDetached));
        let next = result.next();
        assert!(matches!(next, Some(Err(EngineError::ResultDetached))));
        assert!(result.next().is_none());
    }

    #[test]
    fn test_fetch_error_carries_query() {
        let (result, _lease) = result_of(vec![Err(BackendError::transport("reset by peer"))]);
        match result.collect_rows() {
            Err(EngineError::QueryExecution { query, source }) => {
                assert!(query.starts_with("MATCH (p)"));
                assert_eq!(source.message(), "reset by peer");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_row_to_map() {
        let columns: Arc<[String]> = vec!["a".to_string(), "b".to_string()].into();
        let row = Row::new(columns, vec![Value::from(1), Value::from(true)]);
        let map = row.to_map();
        assert_eq!(map.get("b"), Some(&Value::Boolean(true)));
        assert_eq!(row.len(), 2);
        assert!(row.get("c").is_none());
    }
}
