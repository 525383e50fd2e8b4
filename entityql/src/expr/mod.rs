// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Native query expressions
//!
//! The output of translation: scalar expressions bound to row parameters
//! and the composable sequence operators that carry them.

pub mod eval;
pub mod explain;
pub mod expression;
pub mod query;

pub use expression::{
    BinaryOp, BoundKind, Expr, ExprType, Lambda, Parameter, ParameterId, Placeholder,
    PlaceholderId, UnaryOp,
};
pub use query::{
    AggregateCall, ItemType, OperatorSignature, QueryExpr, QueryOp, QueryOperator, SortKey,
};
