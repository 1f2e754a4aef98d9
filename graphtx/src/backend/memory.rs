// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-process scripted backend
//!
//! `MemoryBackend` answers queries from regex-matched canned responses and
//! records every physical operation in a journal. It is the backend used by
//! the test suite and benchmarks, and is handy for applications that want a
//! backend double.

use super::{BackendError, BackendResult, Connection, ConnectionProvider, RawResultSet, Statement};
use crate::types::Value;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Numbered placeholders ($1, {0}) count once per distinct index, `?` counts
// once per occurrence.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d+)|\{(\d+)\}|\?").expect("placeholder pattern is valid"));

/// Number of positional parameters a query expects
pub fn placeholder_count(query: &str) -> usize {
    let mut numbered = HashSet::new();
    let mut anonymous = 0;
    for caps in PLACEHOLDER.captures_iter(query) {
        match caps.get(1).or_else(|| caps.get(2)) {
            Some(index) => {
                numbered.insert(index.as_str().to_string());
            }
            None => anonymous += 1,
        }
    }
    numbered.len() + anonymous
}

/// Physical operation observed by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Acquired { connection: u64 },
    Prepared { connection: u64, query: String },
    Executed {
        connection: u64,
        query: String,
        params: Vec<Value>,
    },
    Committed { connection: u64 },
    RolledBack { connection: u64 },
    Closed { connection: u64 },
}

impl BackendEvent {
    /// Connection the event happened on
    pub fn connection(&self) -> u64 {
        match self {
            BackendEvent::Acquired { connection }
            | BackendEvent::Prepared { connection, .. }
            | BackendEvent::Executed { connection, .. }
            | BackendEvent::Committed { connection }
            | BackendEvent::RolledBack { connection }
            | BackendEvent::Closed { connection } => *connection,
        }
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Fail(BackendError),
}

#[derive(Debug)]
struct Rule {
    pattern: Regex,
    outcome: Outcome,
}

#[derive(Debug, Default)]
struct PendingFailures {
    acquire: Option<BackendError>,
    commit: Option<BackendError>,
    rollback: Option<BackendError>,
    close: Option<BackendError>,
}

#[derive(Debug, Default)]
struct Shared {
    rules: Vec<Rule>,
    events: Vec<BackendEvent>,
    next_connection: u64,
    /// Closed flags of connections that have not been closed yet
    live: HashMap<u64, Arc<AtomicBool>>,
    pending: PendingFailures,
}

impl Shared {
    fn outcome_for(&self, query: &str) -> Outcome {
        // Most recently registered rule wins
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.pattern.is_match(query))
            .map(|rule| rule.outcome.clone())
            .unwrap_or(Outcome::Rows {
                columns: Vec::new(),
                rows: Vec::new(),
            })
    }
}

/// Scripted in-process backend and connection provider
///
/// Every physical operation is appended to an event journal that is never
/// trimmed on its own. Long-running users should call
/// [`MemoryBackend::clear_events`] periodically.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries matching `pattern` with the given rows
    pub fn respond(
        &self,
        pattern: &str,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<(), regex::Error> {
        let rule = Rule {
            pattern: Regex::new(pattern)?,
            outcome: Outcome::Rows {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
            },
        };
        self.shared.lock().rules.push(rule);
        Ok(())
    }

    /// Fail every execution of queries matching `pattern`
    pub fn fail_query(&self, pattern: &str, error: BackendError) -> Result<(), regex::Error> {
        let rule = Rule {
            pattern: Regex::new(pattern)?,
            outcome: Outcome::Fail(error),
        };
        self.shared.lock().rules.push(rule);
        Ok(())
    }

    pub fn fail_next_acquire(&self, error: BackendError) {
        self.shared.lock().pending.acquire = Some(error);
    }

    pub fn fail_next_commit(&self, error: BackendError) {
        self.shared.lock().pending.commit = Some(error);
    }

    pub fn fail_next_rollback(&self, error: BackendError) {
        self.shared.lock().pending.rollback = Some(error);
    }

    pub fn fail_next_close(&self, error: BackendError) {
        self.shared.lock().pending.close = Some(error);
    }

    /// Close a connection from the backend side
    ///
    /// Later operations on it, including reads from its result sets, fail
    /// with a `Closed` error. Returns false if the connection is not live.
    pub fn kill_connection(&self, connection: u64) -> bool {
        match self.shared.lock().live.get(&connection) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the event journal
    pub fn events(&self) -> Vec<BackendEvent> {
        self.shared.lock().events.clone()
    }

    /// Journal entries for one connection
    pub fn events_for(&self, connection: u64) -> Vec<BackendEvent> {
        self.shared
            .lock()
            .events
            .iter()
            .filter(|event| event.connection() == connection)
            .cloned()
            .collect()
    }

    pub fn clear_events(&self) {
        self.shared.lock().events.clear();
    }

    fn count(&self, predicate: impl Fn(&BackendEvent) -> bool) -> usize {
        self.shared
            .lock()
            .events
            .iter()
            .filter(|e| predicate(*e))
            .count()
    }

    pub fn acquisitions(&self) -> usize {
        self.count(|e| matches!(e, BackendEvent::Acquired { .. }))
    }

    pub fn commits(&self) -> usize {
        self.count(|e| matches!(e, BackendEvent::Committed { .. }))
    }

    pub fn rollbacks(&self) -> usize {
        self.count(|e| matches!(e, BackendEvent::RolledBack { .. }))
    }

    pub fn closes(&self) -> usize {
        self.count(|e| matches!(e, BackendEvent::Closed { .. }))
    }

    /// Connections handed out and not yet closed
    pub fn open_connections(&self) -> usize {
        self.shared.lock().live.len()
    }

    /// Ids of connections handed out and not yet closed
    pub fn live_connections(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.shared.lock().live.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Query texts executed so far, in order
    pub fn executed_queries(&self) -> Vec<String> {
        self.shared
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                BackendEvent::Executed { query, .. } => Some(query.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ConnectionProvider for MemoryBackend {
    fn acquire(&self) -> BackendResult<Box<dyn Connection>> {
        let mut shared = self.shared.lock();
        if let Some(error) = shared.pending.acquire.take() {
            return Err(error);
        }

        shared.next_connection += 1;
        let id = shared.next_connection;
        let closed = Arc::new(AtomicBool::new(false));
        shared.live.insert(id, closed.clone());
        let event = BackendEvent::Acquired { connection: id };
        shared.events.push(event);

        Ok(Box::new(MemoryConnection {
            id,
            shared: self.shared.clone(),
            closed,
            next_statement: 0,
        }))
    }
}

struct MemoryConnection {
    id: u64,
    shared: Arc<Mutex<Shared>>,
    closed: Arc<AtomicBool>,
    next_statement: u64,
}

impl MemoryConnection {
    fn ensure_open(&self) -> BackendResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::closed(format!(
                "connection {} is closed",
                self.id
            )));
        }
        Ok(())
    }
}

impl Connection for MemoryConnection {
    fn prepare(&mut self, query: &str) -> BackendResult<Statement> {
        self.ensure_open()?;
        self.next_statement += 1;
        self.shared.lock().events.push(BackendEvent::Prepared {
            connection: self.id,
            query: query.to_string(),
        });
        Ok(Statement::new(query, self.next_statement))
    }

    fn execute_query(
        &mut self,
        statement: &Statement,
        params: &[Value],
    ) -> BackendResult<Box<dyn RawResultSet>> {
        self.ensure_open()?;

        let expected = placeholder_count(statement.query());
        if expected != params.len() {
            return Err(BackendError::parameter(format!(
                "statement expects {} parameter(s), {} bound",
                expected,
                params.len()
            )));
        }

        let mut shared = self.shared.lock();
        let outcome = shared.outcome_for(statement.query());
        shared.events.push(BackendEvent::Executed {
            connection: self.id,
            query: statement.query().to_string(),
            params: params.to_vec(),
        });

        match outcome {
            Outcome::Rows { columns, rows } => Ok(Box::new(MemoryResultSet {
                columns,
                rows: rows.into(),
                closed: self.closed.clone(),
            })),
            Outcome::Fail(error) => Err(error),
        }
    }

    fn commit(&mut self) -> BackendResult<()> {
        self.ensure_open()?;
        let mut shared = self.shared.lock();
        if let Some(error) = shared.pending.commit.take() {
            return Err(error);
        }
        shared.events.push(BackendEvent::Committed {
            connection: self.id,
        });
        Ok(())
    }

    fn rollback(&mut self) -> BackendResult<()> {
        self.ensure_open()?;
        let mut shared = self.shared.lock();
        if let Some(error) = shared.pending.rollback.take() {
            return Err(error);
        }
        shared.events.push(BackendEvent::RolledBack {
            connection: self.id,
        });
        Ok(())
    }

    fn close(&mut self) -> BackendResult<()> {
        let mut shared = self.shared.lock();
        if let Some(error) = shared.pending.close.take() {
            return Err(error);
        }
        if shared.live.remove(&self.id).is_none() {
            return Err(BackendError::closed(format!(
                "connection {} already closed",
                self.id
            )));
        }
        self.closed.store(true, Ordering::SeqCst);
        shared.events.push(BackendEvent::Closed {
            connection: self.id,
        });
        Ok(())
    }
}

struct MemoryResultSet {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    closed: Arc<AtomicBool>,
}

impl RawResultSet for MemoryResultSet {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> BackendResult<Option<Vec<Value>>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::closed("result set's connection is closed"));
        }
        Ok(self.rows.pop_front())
    }
}
