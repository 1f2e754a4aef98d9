//! GraphTx SDK - Scoped transaction API for GraphTx
//!
//! This crate layers RAII transaction scopes and typed result handling on top
//! of GraphTx's session API. Scopes roll back when dropped, nested scopes join
//! the enclosing transaction, and results can be materialized into serde types.
//!
//! # Quick Start
//!
//! ```no_run
//! use graphtx_sdk::{Error, MemoryBackend, QueryEngine, SessionExt};
//!
//! # fn main() -> Result<(), Error> {
//! let engine = QueryEngine::new(MemoryBackend::new());
//! let mut session = engine.session();
//!
//! let mut tx = session.transaction()?;
//! let result = tx.query("MATCH (p:Person) RETURN p.name")?;
//! for row in result.rows() {
//!     println!("Name: {:?}", row.get("p.name"));
//! }
//! tx.commit()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Application Code (Your Rust App)      │
//! └─────────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  GraphTx SDK (this crate)               │
//! │  - Transaction (RAII scopes)            │
//! │  - SessionExt (scope entry points)      │
//! │  - TypedResult (deserialization)        │
//! └─────────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  GraphTx Core (graphtx crate)           │
//! │  - QueryEngine / Session                │
//! │  - TransactionCoordinator               │
//! │  - ConnectionProvider backends          │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`transaction`] - Transaction scopes
//! - [`result`] - Result handling and deserialization
//! - [`error`] - Error types and handling

// Re-export core types for convenience
pub use graphtx::{
    EngineConfig, EngineError, MemoryBackend, Propagation, QueryEngine, QueryResult, Row, Session,
    TransactionDefinition, Value,
};

// SDK modules
pub mod error;
pub mod result;
pub mod transaction;

pub use error::{Error, Result};
pub use result::TypedResult;
pub use transaction::{with_transaction, DropBehavior, SessionExt, Transaction};
