// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query execution against the caller's connection

use crate::config::{EngineConfig, OutsideTransactionPolicy};
use crate::engine::stats::EngineStats;
use crate::exec::error::{EngineError, Result};
use crate::exec::result::QueryResult;
use crate::session::SessionState;
use crate::txn::TransactionCoordinator;
use crate::types::Value;
use std::sync::Arc;

/// Runs queries inside the caller's current transaction
pub struct QueryExecutor {
    coordinator: Arc<TransactionCoordinator>,
    config: Arc<EngineConfig>,
    stats: Arc<EngineStats>,
}

impl QueryExecutor {
    pub fn new(
        coordinator: Arc<TransactionCoordinator>,
        config: Arc<EngineConfig>,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            coordinator,
            config,
            stats,
        }
    }

    /// Execute a query on the caller's connection
    ///
    /// # Arguments
    /// * `session` - The caller's session state
    /// * `query` - Query text, passed to the backend unchanged
    /// * `params` - Positional parameters; `None` runs the query without any
    ///
    /// # Returns
    /// * A lazily consumed result bound to the current transaction
    /// * `QueryExecution` on any backend failure; the transaction stays open
    pub fn execute(
        &self,
        session: &mut SessionState,
        query: &str,
        params: Option<&[Value]>,
    ) -> Result<QueryResult> {
        self.ensure_transaction(session)?;
        self.log_query(query, params);

        let lease = session.lease().ok_or_else(|| {
            EngineError::IllegalNestingState(format!(
                "session {} is active without a transaction lease",
                session.caller()
            ))
        })?;
        let connection = session.connection_mut()?;

        let statement = connection
            .prepare(query)
            .map_err(|e| EngineError::query(query, e))?;
        let raw = connection
            .execute_query(&statement, params.unwrap_or(&[]))
            .map_err(|e| EngineError::query(query, e))?;

        self.stats.record_query();
        Ok(QueryResult::new(query.to_string(), raw, lease))
    }

    fn ensure_transaction(&self, session: &mut SessionState) -> Result<()> {
        if session.is_active() {
            return Ok(());
        }

        match self.config.outside_transaction {
            OutsideTransactionPolicy::AutoBegin => {
                let definition = &self.config.default_definition;
                self.coordinator.begin(session, definition)?;
                self.stats.record_auto_begin();
                log::error!(
                    "execute called outside a transaction for session {}, opened {} implicitly",
                    session.caller(),
                    definition
                );
                Ok(())
            }
            OutsideTransactionPolicy::Reject => Err(EngineError::NoActiveTransaction(
                session.caller().to_string(),
            )),
        }
    }

    fn log_query(&self, query: &str, params: Option<&[Value]>) {
        let level = self.config.query_log_level;
        log::log!(level, "running query {}", query);
        if let Some(params) = params {
            if self.config.log_parameters {
                log::log!(level, "   with params {:?}", params);
            } else {
                log::log!(level, "   with {} params", params.len());
            }
        }
    }
}
