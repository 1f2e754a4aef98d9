// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction demarcation
//!
//! Nested begin/commit/rollback calls collapse into a single physical
//! transaction per caller. Only the outermost scope touches the backend: the
//! first begin acquires a connection and the last commit or rollback finishes
//! the transaction and closes the connection.

use super::definition::TransactionDefinition;
use super::state::{FinishAction, Operation, Transition};
use crate::backend::{BackendResult, Connection, ConnectionProvider};
use crate::engine::stats::EngineStats;
use crate::exec::error::{EngineError, Result};
use crate::session::SessionState;
use std::sync::Arc;

/// Applies demarcation requests to a caller's session state
pub struct TransactionCoordinator {
    provider: Arc<dyn ConnectionProvider>,
    stats: Arc<EngineStats>,
}

impl TransactionCoordinator {
    pub fn new(provider: Arc<dyn ConnectionProvider>, stats: Arc<EngineStats>) -> Self {
        Self { provider, stats }
    }

    /// Open a transaction scope
    ///
    /// The outermost scope acquires a connection. On any error the session
    /// is left exactly as it was.
    pub fn begin(
        &self,
        session: &mut SessionState,
        definition: &TransactionDefinition,
    ) -> Result<()> {
        let (next, transition) = session
            .nesting()
            .apply(Operation::Begin(definition.clone()))?;

        if transition == Transition::Opened {
            session.acquire_connection(self.provider.as_ref())?;
        }
        session.set_nesting(next);

        log::debug!(
            "beginTx {} for session {} at depth {}",
            definition,
            session.caller(),
            session.depth()
        );
        Ok(())
    }

    pub fn commit(&self, session: &mut SessionState) -> Result<()> {
        self.end_scope(session, FinishAction::Commit)
    }

    pub fn rollback(&self, session: &mut SessionState) -> Result<()> {
        self.end_scope(session, FinishAction::Rollback)
    }

    fn end_scope(&self, session: &mut SessionState, requested: FinishAction) -> Result<()> {
        let marker = if requested == FinishAction::Commit && session.nesting().is_rollback_only() {
            " (rollback-only)"
        } else {
            ""
        };
        let operation = match requested {
            FinishAction::Commit => Operation::Commit,
            FinishAction::Rollback => Operation::Rollback,
        };
        let (next, transition) = session.nesting().apply(operation)?;

        match transition {
            Transition::Unbalanced => {
                log::warn!(
                    "{} called for session {} with no open transaction, ignoring",
                    requested,
                    session.caller()
                );
                self.stats.record_unbalanced();
                Ok(())
            }
            Transition::Nested { depth } => {
                session.set_nesting(next);
                log::debug!(
                    "{}{} for session {} at depth {}",
                    requested,
                    marker,
                    session.caller(),
                    depth
                );
                Ok(())
            }
            Transition::Finish(action) => {
                session.set_nesting(next);
                log::debug!(
                    "{}{} for session {} at depth 0",
                    requested,
                    marker,
                    session.caller()
                );
                self.finish(session, action)
            }
            Transition::Opened => Err(EngineError::IllegalNestingState(format!(
                "{} cannot open a transaction",
                requested
            ))),
        }
    }

    /// Physically end the caller's transaction and release its connection
    ///
    /// The connection reference is cleared before the backend is contacted,
    /// and the connection is closed whether or not the commit or rollback
    /// succeeds.
    pub fn finish(&self, session: &mut SessionState, action: FinishAction) -> Result<()> {
        if session.depth() != 0 {
            return Err(EngineError::IllegalNestingState(format!(
                "finish requested for session {} at depth {}",
                session.caller(),
                session.depth()
            )));
        }

        let connection = session.release_connection().ok_or_else(|| {
            EngineError::IllegalNestingState(format!(
                "session {} has no connection to {}",
                session.caller(),
                action
            ))
        })?;

        let mut guard = ConnectionGuard::new(connection, session.caller().to_string());
        let outcome = guard.end(action);
        let released = guard.close();

        match outcome {
            Ok(()) => {
                match action {
                    FinishAction::Commit => self.stats.record_commit(),
                    FinishAction::Rollback => self.stats.record_rollback(),
                }
                log::info!(
                    "Session {} finished transaction with {}",
                    session.caller(),
                    action
                );
                released.map_err(EngineError::ConnectionRelease)
            }
            Err(source) => {
                if let Err(close_error) = released {
                    log::warn!(
                        "Closing connection of session {} after failed {} also failed: {}",
                        session.caller(),
                        action,
                        close_error
                    );
                }
                Err(EngineError::Finish { action, source })
            }
        }
    }
}

/// Closes the wrapped connection on drop unless it was closed explicitly
struct ConnectionGuard {
    connection: Option<Box<dyn Connection>>,
    caller: String,
}

impl ConnectionGuard {
    fn new(connection: Box<dyn Connection>, caller: String) -> Self {
        Self {
            connection: Some(connection),
            caller,
        }
    }

    fn end(&mut self, action: FinishAction) -> BackendResult<()> {
        match self.connection.as_mut() {
            Some(connection) => match action {
                FinishAction::Commit => connection.commit(),
                FinishAction::Rollback => connection.rollback(),
            },
            None => Ok(()),
        }
    }

    fn close(mut self) -> BackendResult<()> {
        match self.connection.take() {
            Some(mut connection) => connection.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            log::warn!(
                "Closing connection of session {} during unwind",
                self.caller
            );
            if let Err(e) = connection.close() {
                log::warn!(
                    "Closing connection of session {} failed: {}",
                    self.caller,
                    e
                );
            }
        }
    }
}
