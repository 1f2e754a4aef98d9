// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Value types exchanged with the backend
//!
//! Query parameters are bound as [`Value`]s and result cells are decoded into
//! them.

pub mod value;

pub use value::Value;
