// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine error types

use crate::backend::BackendError;
use crate::txn::FinishAction;
use thiserror::Error;

/// Errors surfaced by the transaction and query engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unsupported propagation behavior: {0}")]
    UnsupportedPropagation(i32),

    #[error("Failed to acquire connection: {0}")]
    ConnectionAcquisition(#[source] BackendError),

    #[error("Query execution failed for '{query}': {source}")]
    QueryExecution {
        query: String,
        #[source]
        source: BackendError,
    },

    #[error("Illegal nesting state: {0}")]
    IllegalNestingState(String),

    #[error("No active transaction for session {0}")]
    NoActiveTransaction(String),

    /// The physical commit or rollback failed; the connection was still closed
    #[error("Failed to {action} transaction: {source}")]
    Finish {
        action: FinishAction,
        #[source]
        source: BackendError,
    },

    #[error("Failed to release connection: {0}")]
    ConnectionRelease(#[source] BackendError),

    #[error("Query result consumed after its transaction finished")]
    ResultDetached,

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl EngineError {
    pub(crate) fn query(query: &str, source: BackendError) -> Self {
        EngineError::QueryExecution {
            query: query.to_string(),
            source,
        }
    }

    /// Backend error underlying this failure, if any
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            EngineError::ConnectionAcquisition(source)
            | EngineError::ConnectionRelease(source)
            | EngineError::QueryExecution { source, .. }
            | EngineError::Finish { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
