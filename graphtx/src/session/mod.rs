// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session management for concurrent callers
//!
//! Every logical caller owns its own session state: the connection of its
//! open transaction, the nesting depth, the rollback-only flag and the stack
//! of transaction definitions. Nothing here is shared between callers, so no
//! caller ever waits on another caller's state.
//!
//! Callers are identified in one of two ways:
//!
//! - `Session`: an explicit context value obtained from the engine and passed
//!   by `&mut` to every operation. It can be moved to another thread or task.
//! - Current thread: the engine's implicit API keeps one state per thread in
//!   thread-local storage, created on first use and dropped at depth zero.

pub mod handle;
pub mod lease;
pub mod models;
pub(crate) mod registry;

pub use handle::Session;
pub use lease::TransactionLease;
pub use models::{CallerId, SessionState};
