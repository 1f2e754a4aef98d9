// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Explicit session context

use super::models::{CallerId, SessionState};
use crate::engine::EngineCore;
use crate::exec::error::Result;
use crate::exec::result::QueryResult;
use crate::txn::TransactionDefinition;
use crate::types::Value;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// A caller's handle on the engine
///
/// Every operation takes `&mut self`, so one session is used by one caller at
/// a time; distinct sessions never share state. Dropping a session with an
/// open transaction rolls it back and closes the connection.
pub struct Session {
    core: Arc<EngineCore>,
    state: SessionState,
}

impl Session {
    pub(crate) fn new(core: Arc<EngineCore>, caller: CallerId) -> Self {
        let state = SessionState::new(caller, core.stats.clone());
        Self { core, state }
    }

    pub fn id(&self) -> &CallerId {
        self.state.caller()
    }

    /// Open a transaction scope, joining the current one if any
    pub fn begin(&mut self, definition: &TransactionDefinition) -> Result<()> {
        self.core.coordinator.begin(&mut self.state, definition)
    }

    /// Open a scope with the engine's default definition
    pub fn begin_default(&mut self) -> Result<()> {
        let definition = self.core.config.default_definition.clone();
        self.begin(&definition)
    }

    /// Close the innermost scope; the outermost commits unless rollback-only
    pub fn commit(&mut self) -> Result<()> {
        self.core.coordinator.commit(&mut self.state)
    }

    /// Close the innermost scope and mark the whole transaction rollback-only
    pub fn rollback(&mut self) -> Result<()> {
        self.core.coordinator.rollback(&mut self.state)
    }

    pub fn execute(&mut self, query: &str) -> Result<QueryResult> {
        self.core.executor.execute(&mut self.state, query, None)
    }

    pub fn execute_params(&mut self, query: &str, params: &[Value]) -> Result<QueryResult> {
        self.core
            .executor
            .execute(&mut self.state, query, Some(params))
    }

    /// Force the outermost scope to roll back; returns false when idle
    pub fn mark_rollback_only(&mut self) -> bool {
        self.state.mark_rollback_only()
    }

    pub fn depth(&self) -> usize {
        self.state.depth()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_rollback_only(&self) -> bool {
        self.state.nesting().is_rollback_only()
    }

    pub fn definitions(&self) -> &[TransactionDefinition] {
        self.state.nesting().definitions()
    }

    pub fn current_definition(&self) -> Option<&TransactionDefinition> {
        self.state.nesting().current_definition()
    }

    pub fn has_connection(&self) -> bool {
        self.state.has_connection()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.state.created_at()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.state.last_activity()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.core.id)
            .field("state", &self.state)
            .finish()
    }
}
