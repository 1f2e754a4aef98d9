// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction definitions and propagation behaviors
//!
//! Propagation codes follow the conventional numbering used by declarative
//! transaction frameworks so definitions can be built from integer
//! configuration values.

use crate::exec::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a transaction relates to one already open for the same caller
///
/// Every behavior joins the caller's current physical transaction when one is
/// open and opens one otherwise; the distinction is carried for diagnostics
/// and for callers that inspect the definition stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Propagation {
    /// REQUIRED - Join the current transaction or open one
    #[default]
    Required,
    /// SUPPORTS - Run within a transaction if one exists
    Supports,
    /// MANDATORY - Expect an existing transaction
    Mandatory,
    /// REQUIRES_NEW - Ask for an independent transaction
    RequiresNew,
    /// NOT_SUPPORTED - Ask to run outside a transaction
    NotSupported,
    /// NEVER - Expect no transaction
    Never,
    /// NESTED - Ask for a savepoint-scoped transaction
    Nested,
}

impl Propagation {
    pub const ALL: [Propagation; 7] = [
        Propagation::Required,
        Propagation::Supports,
        Propagation::Mandatory,
        Propagation::RequiresNew,
        Propagation::NotSupported,
        Propagation::Never,
        Propagation::Nested,
    ];

    /// Conventional integer code of this behavior
    pub fn code(&self) -> i32 {
        match self {
            Propagation::Required => 0,
            Propagation::Supports => 1,
            Propagation::Mandatory => 2,
            Propagation::RequiresNew => 3,
            Propagation::NotSupported => 4,
            Propagation::Never => 5,
            Propagation::Nested => 6,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Propagation::ALL.into_iter().find(|p| p.code() == code)
    }

    /// Get string representation for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Propagation::Required => "REQUIRED",
            Propagation::Supports => "SUPPORTS",
            Propagation::Mandatory => "MANDATORY",
            Propagation::RequiresNew => "REQUIRES_NEW",
            Propagation::NotSupported => "NOT_SUPPORTED",
            Propagation::Never => "NEVER",
            Propagation::Nested => "NESTED",
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Propagation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(' ', "_").as_str() {
            "REQUIRED" => Ok(Propagation::Required),
            "SUPPORTS" => Ok(Propagation::Supports),
            "MANDATORY" => Ok(Propagation::Mandatory),
            "REQUIRES_NEW" => Ok(Propagation::RequiresNew),
            "NOT_SUPPORTED" => Ok(Propagation::NotSupported),
            "NEVER" => Ok(Propagation::Never),
            "NESTED" => Ok(Propagation::Nested),
            _ => Err(format!("Unknown propagation behavior: {}", s)),
        }
    }
}

impl TryFrom<i32> for Propagation {
    type Error = EngineError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Propagation::from_code(code).ok_or(EngineError::UnsupportedPropagation(code))
    }
}

/// Caller-supplied description of a transaction scope
///
/// The propagation is stored as its raw code so definitions coming from
/// configuration are accepted as-is; an unknown code is rejected when the
/// definition is used to begin a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionDefinition {
    propagation: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl TransactionDefinition {
    pub fn new(propagation: Propagation) -> Self {
        Self {
            propagation: propagation.code(),
            name: None,
        }
    }

    /// Build a definition from a raw propagation code without validating it
    pub fn from_code(code: i32) -> Self {
        Self {
            propagation: code,
            name: None,
        }
    }

    pub fn required() -> Self {
        Self::new(Propagation::Required)
    }

    pub fn requires_new() -> Self {
        Self::new(Propagation::RequiresNew)
    }

    pub fn nested() -> Self {
        Self::new(Propagation::Nested)
    }

    /// Attach a name shown in diagnostics
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn propagation_code(&self) -> i32 {
        self.propagation
    }

    /// Validated propagation behavior
    pub fn propagation(&self) -> Result<Propagation, EngineError> {
        Propagation::try_from(self.propagation)
    }
}

impl Default for TransactionDefinition {
    fn default() -> Self {
        Self::required()
    }
}

impl From<Propagation> for TransactionDefinition {
    fn from(propagation: Propagation) -> Self {
        Self::new(propagation)
    }
}

impl fmt::Display for TransactionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Propagation::from_code(self.propagation) {
            Some(p) => write!(f, "PROPAGATION_{}", p)?,
            None => write!(f, "PROPAGATION_<{}>", self.propagation)?,
        }
        if let Some(name) = &self.name {
            write!(f, " '{}'", name)?;
        }
        Ok(())
    }
}
