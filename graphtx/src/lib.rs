// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GraphTx - Nested transactional query execution for graph backends
//!
//! GraphTx sits between application code and a connection-oriented graph
//! query backend. Many callers can run concurrently, each with its own
//! connection and transaction context.
//!
//! # Features
//!
//! - **Per-caller isolation**: every caller owns its connection, nesting depth
//!   and rollback-only flag; callers never wait on each other's state
//! - **Nested demarcation**: begin/commit/rollback scopes nest freely and
//!   collapse into one physical commit or rollback at the outermost level
//! - **Rollback poisoning**: a rollback in any inner scope forces the whole
//!   transaction to roll back
//! - **Guaranteed release**: connections are closed when the outermost scope
//!   ends, even if the backend fails while committing
//! - **Lazy results**: rows are fetched on demand and refuse to be read once
//!   their transaction has finished
//!
//! # Usage
//!
//! ```no_run
//! use graphtx::{MemoryBackend, QueryEngine, TransactionDefinition, Value};
//!
//! let engine = QueryEngine::new(MemoryBackend::new());
//! let mut session = engine.session();
//!
//! session.begin(&TransactionDefinition::required())?;
//! session.execute_params("CREATE (p:Person {name: $1})", &[Value::from("Ada")])?;
//!
//! // Joins the outer transaction
//! session.begin(&TransactionDefinition::required())?;
//! session.execute("MATCH (p:Person) RETURN p.name")?;
//! session.commit()?;
//!
//! // Physical commit happens here
//! session.commit()?;
//! # Ok::<(), graphtx::EngineError>(())
//! ```

pub mod backend;
pub mod config;
pub mod engine;
pub mod exec;
pub mod session;
pub mod txn;
pub mod types;

pub use backend::{
    BackendError, BackendErrorKind, BackendEvent, Connection, ConnectionProvider, MemoryBackend,
    RawResultSet, Statement,
};
pub use config::{EngineConfig, OutsideTransactionPolicy};
pub use engine::{QueryEngine, StatsSnapshot};
pub use exec::{EngineError, QueryResult, Result, Row};
pub use session::{CallerId, Session};
pub use txn::{FinishAction, Propagation, TransactionDefinition};
pub use types::Value;

/// GraphTx version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
