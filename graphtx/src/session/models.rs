// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-caller session state
//!
//! A `SessionState` is exclusively owned by one caller. It holds the caller's
//! connection while a transaction is open together with the nesting
//! bookkeeping, and releases the connection on every exit path.

use super::lease::TransactionLease;
use crate::backend::{Connection, ConnectionProvider};
use crate::engine::stats::EngineStats;
use crate::exec::error::{EngineError, Result};
use crate::txn::state::NestingState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity of a logical caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(String);

impl CallerId {
    /// Generate a fresh random identity
    pub fn new() -> Self {
        CallerId(uuid::Uuid::new_v4().to_string())
    }

    /// Identity derived from the current thread
    pub fn current_thread() -> Self {
        let thread = std::thread::current();
        CallerId(format!(
            "{}-{:?}",
            thread.name().unwrap_or("thread"),
            thread.id()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CallerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for CallerId {
    fn from(id: &str) -> Self {
        CallerId(id.to_string())
    }
}

impl From<String> for CallerId {
    fn from(id: String) -> Self {
        CallerId(id)
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection and nesting state of one caller
pub struct SessionState {
    caller: CallerId,
    /// Present iff `nesting.depth() > 0`
    connection: Option<Box<dyn Connection>>,
    nesting: NestingState,
    /// Shared with every result produced by the current physical transaction
    lease: Option<Arc<TransactionLease>>,
    stats: Arc<EngineStats>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl SessionState {
    pub(crate) fn new(caller: CallerId, stats: Arc<EngineStats>) -> Self {
        let now = Utc::now();
        Self {
            caller,
            connection: None,
            nesting: NestingState::new(),
            lease: None,
            stats,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    pub fn nesting(&self) -> &NestingState {
        &self.nesting
    }

    pub fn depth(&self) -> usize {
        self.nesting.depth()
    }

    pub fn is_active(&self) -> bool {
        self.nesting.is_active()
    }

    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub(crate) fn set_nesting(&mut self, nesting: NestingState) {
        self.nesting = nesting;
        self.last_activity = Utc::now();
    }

    pub(crate) fn mark_rollback_only(&mut self) -> bool {
        self.nesting.mark_rollback_only()
    }

    /// Acquire the connection for a new outermost transaction
    pub(crate) fn acquire_connection(&mut self, provider: &dyn ConnectionProvider) -> Result<()> {
        if self.connection.is_some() {
            return Err(EngineError::IllegalNestingState(format!(
                "session {} already holds a connection",
                self.caller
            )));
        }

        let connection = provider
            .acquire()
            .map_err(EngineError::ConnectionAcquisition)?;
        self.connection = Some(connection);
        self.lease = Some(Arc::new(TransactionLease::new()));
        self.stats.record_acquired();

        log::debug!("Session {} acquired connection", self.caller);
        Ok(())
    }

    pub(crate) fn connection_mut(&mut self) -> Result<&mut Box<dyn Connection>> {
        let caller = &self.caller;
        self.connection.as_mut().ok_or_else(|| {
            EngineError::IllegalNestingState(format!("session {} has no connection", caller))
        })
    }

    pub(crate) fn lease(&self) -> Option<Arc<TransactionLease>> {
        self.lease.clone()
    }

    /// Detach the connection, expiring every result it produced
    pub(crate) fn release_connection(&mut self) -> Option<Box<dyn Connection>> {
        if let Some(lease) = self.lease.take() {
            lease.expire();
        }
        let connection = self.connection.take()?;
        self.stats.record_released();
        self.last_activity = Utc::now();
        Some(connection)
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("caller", &self.caller)
            .field("depth", &self.nesting.depth())
            .field("rollback_only", &self.nesting.is_rollback_only())
            .field("has_connection", &self.connection.is_some())
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        let depth = self.nesting.depth();
        let Some(mut connection) = self.release_connection() else {
            return;
        };

        log::warn!(
            "Session {} dropped at depth {}, rolling back open transaction",
            self.caller,
            depth
        );
        match connection.rollback() {
            Ok(()) => self.stats.record_rollback(),
            Err(e) => log::warn!(
                "Rollback of abandoned session {} failed: {}",
                self.caller,
                e
            ),
        }
        if let Err(e) = connection.close() {
            log::warn!(
                "Closing connection of session {} failed: {}",
                self.caller,
                e
            );
        }
    }
}
