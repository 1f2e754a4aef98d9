// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine configuration

use crate::exec::error::EngineError;
use crate::txn::TransactionDefinition;
use serde::{Deserialize, Serialize};

/// What `execute` does when the caller has no open transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutsideTransactionPolicy {
    /// Open a transaction with the default definition and log the anomaly
    #[default]
    AutoBegin,
    /// Fail with `NoActiveTransaction`
    Reject,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Behavior of `execute` outside a transaction
    pub outside_transaction: OutsideTransactionPolicy,

    /// Definition used by auto-begin and `begin_default`
    pub default_definition: TransactionDefinition,

    /// Level of the per-query diagnostic record
    pub query_log_level: log::Level,

    /// Include parameter values in query diagnostics
    pub log_parameters: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            outside_transaction: OutsideTransactionPolicy::AutoBegin,
            default_definition: TransactionDefinition::required(),
            query_log_level: log::Level::Info,
            log_parameters: true,
        }
    }
}

impl EngineConfig {
    /// Configuration that refuses to run queries outside a transaction
    pub fn strict() -> Self {
        Self {
            outside_transaction: OutsideTransactionPolicy::Reject,
            ..Self::default()
        }
    }

    pub fn with_outside_transaction(mut self, policy: OutsideTransactionPolicy) -> Self {
        self.outside_transaction = policy;
        self
    }

    pub fn with_default_definition(mut self, definition: TransactionDefinition) -> Self {
        self.default_definition = definition;
        self
    }

    pub fn with_query_log_level(mut self, level: log::Level) -> Self {
        self.query_log_level = level;
        self
    }

    pub fn with_log_parameters(mut self, enabled: bool) -> Self {
        self.log_parameters = enabled;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        config.validate().map_err(EngineError::Configuration)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_definition.propagation().is_err() {
            return Err(format!(
                "Default transaction definition has unsupported propagation code {}",
                self.default_definition.propagation_code()
            ));
        }
        Ok(())
    }
}
