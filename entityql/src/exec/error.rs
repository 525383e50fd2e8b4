// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution error types

use crate::expr::eval::ScalarError;
use thiserror::Error;

/// Runtime faults of the reference executor
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Unknown entity set: {0}")]
    UnknownEntitySet(String),

    #[error("Parameter p{0} is not bound in this scope")]
    UnboundParameter(u32),

    #[error("No value bound for placeholder {0}")]
    UnboundPlaceholder(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Invalid bound: {0}")]
    InvalidBound(String),

    #[error("Aggregate {method} cannot be applied to {value}")]
    InvalidAggregateInput { method: String, value: String },

    #[error("Expression evaluation error: {0}")]
    Scalar(#[from] ScalarError),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
