// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine-wide counters
//!
//! Counters are plain relaxed atomics shared by every session of an engine.
//! They never gate an operation, so callers never contend on them.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct EngineStats {
    connections_acquired: AtomicU64,
    connections_released: AtomicU64,
    physical_commits: AtomicU64,
    physical_rollbacks: AtomicU64,
    queries_executed: AtomicU64,
    auto_begins: AtomicU64,
    unbalanced_calls: AtomicU64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_acquired(&self) {
        self.connections_acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_released(&self) {
        self.connections_released.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.physical_commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rollback(&self) {
        self.physical_rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_query(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_auto_begin(&self) {
        self.auto_begins.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unbalanced(&self) {
        self.unbalanced_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections_acquired: self.connections_acquired.load(Ordering::Relaxed),
            connections_released: self.connections_released.load(Ordering::Relaxed),
            physical_commits: self.physical_commits.load(Ordering::Relaxed),
            physical_rollbacks: self.physical_rollbacks.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            auto_begins: self.auto_begins.load(Ordering::Relaxed),
            unbalanced_calls: self.unbalanced_calls.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`EngineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub connections_acquired: u64,
    pub connections_released: u64,
    pub physical_commits: u64,
    pub physical_rollbacks: u64,
    pub queries_executed: u64,
    pub auto_begins: u64,
    pub unbalanced_calls: u64,
}

impl StatsSnapshot {
    /// Connections currently held by sessions
    pub fn open_connections(&self) -> u64 {
        self.connections_acquired
            .saturating_sub(self.connections_released)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Engine Stats: {} open ({} acquired, {} released), {} commits, {} rollbacks, \
             {} queries, {} auto-begins, {} unbalanced",
            self.open_connections(),
            self.connections_acquired,
            self.connections_released,
            self.physical_commits,
            self.physical_rollbacks,
            self.queries_executed,
            self.auto_begins,
            self.unbalanced_calls
        )
    }
}
