// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query Engine - Public API for transactional query execution
//!
//! Callers either hold an explicit [`Session`] or use the engine's
//! current-thread methods, which keep one implicit session per thread.

use super::stats::{EngineStats, StatsSnapshot};
use super::EngineCore;
use crate::backend::ConnectionProvider;
use crate::config::EngineConfig;
use crate::exec::error::{EngineError, Result};
use crate::exec::{QueryExecutor, QueryResult};
use crate::session::registry;
use crate::session::{CallerId, Session, SessionState};
use crate::txn::{TransactionCoordinator, TransactionDefinition};
use crate::types::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Query Engine - Coordinates nested transactions and query execution
///
/// Cloning an engine is cheap; clones share the provider, configuration and
/// counters, and address the same implicit per-thread sessions.
#[derive(Clone)]
pub struct QueryEngine {
    core: Arc<EngineCore>,
}

impl QueryEngine {
    /// Create an engine with the default configuration
    ///
    /// # Example
    /// ```no_run
    /// use graphtx::{MemoryBackend, QueryEngine, TransactionDefinition};
    ///
    /// let engine = QueryEngine::new(MemoryBackend::new());
    /// let mut session = engine.session();
    ///
    /// session.begin(&TransactionDefinition::required())?;
    /// let rows = session.execute("MATCH (n) RETURN n")?.collect_rows()?;
    /// session.commit()?;
    /// # Ok::<(), graphtx::EngineError>(())
    /// ```
    pub fn new(provider: impl ConnectionProvider + 'static) -> Self {
        Self::build(Arc::new(provider), EngineConfig::default())
    }

    /// Create an engine with an explicit configuration
    ///
    /// # Returns
    /// * `Configuration` error if the configuration does not validate
    pub fn with_config(
        provider: impl ConnectionProvider + 'static,
        config: EngineConfig,
    ) -> Result<Self> {
        Self::from_shared(Arc::new(provider), config)
    }

    /// Create an engine over a provider that is shared with other code
    pub fn from_shared(
        provider: Arc<dyn ConnectionProvider>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate().map_err(EngineError::Configuration)?;
        Ok(Self::build(provider, config))
    }

    fn build(provider: Arc<dyn ConnectionProvider>, config: EngineConfig) -> Self {
        let id = NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed);
        let stats = Arc::new(EngineStats::new());
        let config = Arc::new(config);
        let coordinator = Arc::new(TransactionCoordinator::new(provider, stats.clone()));
        let executor = QueryExecutor::new(coordinator.clone(), config.clone(), stats.clone());

        log::debug!("Created query engine {} with {:?}", id, config);
        Self {
            core: Arc::new(EngineCore {
                id,
                config,
                coordinator,
                executor,
                stats,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.core.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.core.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.core.stats.snapshot()
    }

    /// Open a new explicit session with a generated caller id
    pub fn session(&self) -> Session {
        Session::new(self.core.clone(), CallerId::new())
    }

    /// Open a new explicit session for a named caller
    pub fn session_for(&self, caller: impl Into<CallerId>) -> Session {
        Session::new(self.core.clone(), caller.into())
    }

    // === Current-thread API ===

    /// Open a transaction scope for the current thread
    pub fn begin(&self, definition: &TransactionDefinition) -> Result<()> {
        self.with_current(|core, state| core.coordinator.begin(state, definition))
    }

    pub fn begin_default(&self) -> Result<()> {
        self.with_current(|core, state| {
            core.coordinator
                .begin(state, &core.config.default_definition)
        })
    }

    pub fn commit(&self) -> Result<()> {
        self.with_current(|core, state| core.coordinator.commit(state))
    }

    pub fn rollback(&self) -> Result<()> {
        self.with_current(|core, state| core.coordinator.rollback(state))
    }

    pub fn execute(&self, query: &str) -> Result<QueryResult> {
        self.with_current(|core, state| core.executor.execute(state, query, None))
    }

    pub fn execute_params(&self, query: &str, params: &[Value]) -> Result<QueryResult> {
        self.with_current(|core, state| core.executor.execute(state, query, Some(params)))
    }

    /// Force the current thread's transaction to roll back; false when idle
    pub fn mark_rollback_only(&self) -> bool {
        self.with_current(|_, state| state.mark_rollback_only())
    }

    /// Nesting depth of the current thread's transaction
    pub fn current_depth(&self) -> usize {
        registry::inspect_thread_session(self.core.id, |state| {
            state.map_or(0, SessionState::depth)
        })
    }

    pub fn current_is_rollback_only(&self) -> bool {
        registry::inspect_thread_session(self.core.id, |state| {
            state.map_or(false, |s| s.nesting().is_rollback_only())
        })
    }

    /// Definitions of the current thread's open scopes, outermost first
    pub fn current_definitions(&self) -> Vec<TransactionDefinition> {
        registry::inspect_thread_session(self.core.id, |state| {
            state.map_or_else(Vec::new, |s| s.nesting().definitions().to_vec())
        })
    }

    /// Number of engines holding an open transaction on the current thread
    pub fn thread_sessions() -> usize {
        registry::thread_session_count()
    }

    fn with_current<R>(&self, f: impl FnOnce(&EngineCore, &mut SessionState) -> R) -> R {
        let core: &EngineCore = &self.core;
        registry::with_thread_session(core.id, &core.stats, |state| f(core, state))
    }
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("id", &self.core.id)
            .field("config", &self.core.config)
            .field("stats", &self.core.stats.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::txn::Propagation;

    #[test]
    fn test_engines_have_distinct_ids() {
        let a = QueryEngine::new(MemoryBackend::new());
        let b = QueryEngine::new(MemoryBackend::new());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config =
            EngineConfig::default().with_default_definition(TransactionDefinition::from_code(8));
        let err = QueryEngine::with_config(MemoryBackend::new(), config).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_current_thread_lifecycle() {
        let backend = MemoryBackend::new();
        let engine = QueryEngine::new(backend.clone());

        engine.begin(&TransactionDefinition::required()).unwrap();
        engine
            .begin(&TransactionDefinition::new(Propagation::Nested))
            .unwrap();
        assert_eq!(engine.current_depth(), 2);
        assert_eq!(engine.current_definitions().len(), 2);

        engine.commit().unwrap();
        engine.commit().unwrap();
        assert_eq!(engine.current_depth(), 0);
        assert_eq!(backend.commits(), 1);
        assert_eq!(engine.stats().open_connections(), 0);
    }

    #[test]
    fn test_engines_do_not_share_thread_sessions() {
        let first = QueryEngine::new(MemoryBackend::new());
        let second = QueryEngine::new(MemoryBackend::new());

        first.begin_default().unwrap();
        assert_eq!(first.current_depth(), 1);
        assert_eq!(second.current_depth(), 0);

        first.rollback().unwrap();
        assert_eq!(first.current_depth(), 0);
    }
}
