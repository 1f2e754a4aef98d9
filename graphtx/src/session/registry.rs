// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Implicit current-thread sessions
//!
//! Each thread keeps at most one `SessionState` per engine. A state is created
//! on first use and dropped as soon as its depth returns to zero, so an idle
//! thread holds nothing.

use super::models::{CallerId, SessionState};
use crate::engine::stats::EngineStats;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

thread_local! {
    static THREAD_SESSIONS: RefCell<HashMap<u64, SessionState>> = RefCell::new(HashMap::new());
}

/// Run `f` against this thread's session for `engine_id`
///
/// The state is taken out of the map while `f` runs so no `RefCell` borrow is
/// held across backend calls.
pub(crate) fn with_thread_session<R>(
    engine_id: u64,
    stats: &Arc<EngineStats>,
    f: impl FnOnce(&mut SessionState) -> R,
) -> R {
    let mut state = THREAD_SESSIONS
        .with(|sessions| sessions.borrow_mut().remove(&engine_id))
        .unwrap_or_else(|| SessionState::new(CallerId::current_thread(), stats.clone()));

    let output = f(&mut state);

    if state.is_active() {
        THREAD_SESSIONS.with(|sessions| {
            sessions.borrow_mut().insert(engine_id, state);
        });
    }
    output
}

/// Inspect this thread's session for `engine_id` without creating one
pub(crate) fn inspect_thread_session<R>(
    engine_id: u64,
    f: impl FnOnce(Option<&SessionState>) -> R,
) -> R {
    THREAD_SESSIONS.with(|sessions| f(sessions.borrow().get(&engine_id)))
}

/// Number of engines with an open transaction on this thread
pub(crate) fn thread_session_count() -> usize {
    THREAD_SESSIONS.with(|sessions| sessions.borrow().len())
}
