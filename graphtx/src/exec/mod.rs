// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query execution
//!
//! Sends queries over the caller's connection and wraps the backend's rows
//! in a lazily consumed [`QueryResult`].

pub mod error;
pub mod executor;
pub mod result;

pub use error::{EngineError, Result};
pub use executor::QueryExecutor;
pub use result::{QueryResult, Row};
