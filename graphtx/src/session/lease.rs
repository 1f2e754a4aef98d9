// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Liveness token tying query results to their physical transaction

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_LEASE_ID: AtomicU64 = AtomicU64::new(1);

/// Shared between a session's current connection and the results it produced
///
/// The session expires the lease when it releases the connection; results
/// check it before every fetch.
#[derive(Debug)]
pub struct TransactionLease {
    id: u64,
    finished: AtomicBool,
}

impl TransactionLease {
    pub(crate) fn new() -> Self {
        Self {
            id: NEXT_LEASE_ID.fetch_add(1, Ordering::Relaxed),
            finished: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub(crate) fn expire(&self) {
        self.finished.store(true, Ordering::Release);
    }
}
