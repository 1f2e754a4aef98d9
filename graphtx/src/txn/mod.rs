// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction management
//!
//! This module provides:
//! - Transaction definitions and propagation behaviors
//! - The per-caller nesting state machine
//! - The coordinator that maps nested demarcation onto one physical
//!   transaction per caller

pub mod coordinator;
pub mod definition;
pub mod state;

pub use coordinator::TransactionCoordinator;
pub use definition::{Propagation, TransactionDefinition};
pub use state::{FinishAction, NestingState, Operation, Transition};
