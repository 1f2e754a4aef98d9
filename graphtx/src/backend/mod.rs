// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Backend connection abstractions
//!
//! The engine never talks to a graph database directly. It is handed a
//! [`ConnectionProvider`] and works through the [`Connection`] and
//! [`RawResultSet`] traits, so any connection-oriented driver can sit
//! underneath. Pooling policy belongs to the provider.

pub mod memory;

use crate::types::Value;
use std::fmt;
use thiserror::Error;

pub use memory::{BackendEvent, MemoryBackend};

/// Broad classification of a backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// Network or protocol failure talking to the backend
    Transport,
    /// The backend rejected the query text
    Syntax,
    /// A constraint was violated while executing
    Constraint,
    /// Parameters did not match the statement's placeholders
    Parameter,
    /// The connection or result set was already closed
    Closed,
    Other,
}

impl BackendErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendErrorKind::Transport => "transport",
            BackendErrorKind::Syntax => "syntax",
            BackendErrorKind::Constraint => "constraint",
            BackendErrorKind::Parameter => "parameter",
            BackendErrorKind::Closed => "closed",
            BackendErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error reported by a backend driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error: {message}")]
pub struct BackendError {
    kind: BackendErrorKind,
    message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Transport, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Syntax, message)
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Constraint, message)
    }

    pub fn parameter(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Parameter, message)
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Closed, message)
    }

    pub fn kind(&self) -> BackendErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// A query prepared on a specific connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    query: String,
    handle: u64,
}

impl Statement {
    /// Create a statement; `handle` is the driver's identifier for it
    pub fn new(query: impl Into<String>, handle: u64) -> Self {
        Self {
            query: query.into(),
            handle,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }
}

/// Forward-only rows produced by one statement execution
pub trait RawResultSet: Send {
    /// Column names, in row order
    fn columns(&self) -> &[String];

    /// Fetch the next row, or `None` once the set is exhausted
    fn next_row(&mut self) -> BackendResult<Option<Vec<Value>>>;
}

/// A raw backend connection with an implicit open transaction
///
/// The engine owns at most one connection per caller and calls exactly one of
/// [`commit`](Connection::commit) or [`rollback`](Connection::rollback)
/// followed by [`close`](Connection::close) when the caller's outermost scope
/// ends.
pub trait Connection: Send {
    /// Prepare a query for execution on this connection
    fn prepare(&mut self, query: &str) -> BackendResult<Statement>;

    /// Execute a prepared statement with positionally bound parameters
    ///
    /// # Arguments
    /// * `statement` - Statement previously returned by [`prepare`](Connection::prepare)
    /// * `params` - Parameter values, bound in order
    ///
    /// # Returns
    /// * A lazily consumed result set on success
    fn execute_query(
        &mut self,
        statement: &Statement,
        params: &[Value],
    ) -> BackendResult<Box<dyn RawResultSet>>;

    fn commit(&mut self) -> BackendResult<()>;

    fn rollback(&mut self) -> BackendResult<()>;

    /// Release the connection back to wherever it came from
    fn close(&mut self) -> BackendResult<()>;
}

/// Source of raw connections
///
/// Implementations must be thread-safe; the engine calls [`acquire`] from
/// whichever caller opens an outermost transaction.
///
/// [`acquire`]: ConnectionProvider::acquire
pub trait ConnectionProvider: Send + Sync {
    fn acquire(&self) -> BackendResult<Box<dyn Connection>>;
}
