// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query Engine - Entry point binding sessions, transactions and execution
//!
//! The QueryEngine owns the connection provider, configuration and counters
//! shared by all callers, and hands out per-caller sessions.

pub mod query_engine;
pub mod stats;

pub use query_engine::QueryEngine;
pub use stats::{EngineStats, StatsSnapshot};

use crate::config::EngineConfig;
use crate::exec::QueryExecutor;
use crate::txn::TransactionCoordinator;
use std::sync::Arc;

/// Components shared by every session of one engine
pub(crate) struct EngineCore {
    pub(crate) id: u64,
    pub(crate) config: Arc<EngineConfig>,
    pub(crate) coordinator: Arc<TransactionCoordinator>,
    pub(crate) executor: QueryExecutor,
    pub(crate) stats: Arc<EngineStats>,
}
