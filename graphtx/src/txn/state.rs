// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction nesting state
//!
//! Depth, the rollback-only flag and the definition stack are one value.
//! [`NestingState::apply`] computes the next value for an operation without
//! touching the current one, so the coordinator can perform the physical side
//! effects first and only store the new state once they succeed.

use super::definition::TransactionDefinition;
use crate::exec::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical action taken when the outermost scope ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinishAction {
    Commit,
    Rollback,
}

impl FinishAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishAction::Commit => "commit",
            FinishAction::Rollback => "rollback",
        }
    }
}

impl fmt::Display for FinishAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Demarcation request from a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Begin(TransactionDefinition),
    Commit,
    Rollback,
}

/// Effect an operation has on the physical transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Depth went from 0 to 1; a connection must be acquired
    Opened,
    /// Depth changed but the physical transaction is untouched
    Nested { depth: usize },
    /// Depth returned to 0; the physical transaction must be finished
    Finish(FinishAction),
    /// Commit or rollback without a matching begin; nothing changes
    Unbalanced,
}

/// Per-caller nesting bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestingState {
    depth: usize,
    rollback_only: bool,
    definitions: Vec<TransactionDefinition>,
}

impl NestingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Whether an inner scope rolled back and the outermost must roll back too
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only
    }

    /// Definitions of the open scopes, outermost first
    pub fn definitions(&self) -> &[TransactionDefinition] {
        &self.definitions
    }

    pub fn current_definition(&self) -> Option<&TransactionDefinition> {
        self.definitions.last()
    }

    /// Poison the open scopes; no-op when nothing is open
    pub fn mark_rollback_only(&mut self) -> bool {
        if self.is_active() {
            self.rollback_only = true;
        }
        self.rollback_only
    }

    /// Compute the state that follows `operation`
    ///
    /// # Returns
    /// * The next state and the transition the coordinator must carry out
    /// * `UnsupportedPropagation` for a begin with an unknown propagation code
    ///
    /// Each call clones the current state, definition stack included, so an
    /// operation costs O(depth). `self` is never modified.
    pub fn apply(&self, operation: Operation) -> Result<(NestingState, Transition), EngineError> {
        let mut next = self.clone();

        let transition = match operation {
            Operation::Begin(definition) => {
                definition.propagation()?;
                let transition = if next.depth == 0 {
                    next.rollback_only = false;
                    Transition::Opened
                } else {
                    Transition::Nested {
                        depth: next.depth + 1,
                    }
                };
                next.definitions.push(definition);
                next.depth += 1;
                transition
            }
            Operation::Commit | Operation::Rollback if next.depth == 0 => Transition::Unbalanced,
            Operation::Commit => next.close_scope(false),
            Operation::Rollback => next.close_scope(true),
        };

        debug_assert_eq!(next.definitions.len(), next.depth);
        Ok((next, transition))
    }

    fn close_scope(&mut self, rollback: bool) -> Transition {
        self.definitions.pop();
        self.depth -= 1;
        if rollback {
            self.rollback_only = true;
        }

        if self.depth > 0 {
            return Transition::Nested { depth: self.depth };
        }

        let action = if self.rollback_only {
            FinishAction::Rollback
        } else {
            FinishAction::Commit
        };
        self.rollback_only = false;
        Transition::Finish(action)
    }
}
