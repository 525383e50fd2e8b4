// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reference in-memory execution of translated expressions
//!
//! Not part of the translation core: it gives tests and demos a data
//! source to run translated requests against.

pub mod error;
pub mod executor;
pub mod source;

pub use error::{ExecutionError, ExecutionResult};
pub use executor::{materialize, Executor, QueryOutput, QueryResult};
pub use source::{DataSource, InMemorySource};
