// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Structured query clauses produced by an external query-string parser

#[allow(clippy::module_inception)]
pub mod ast;

pub use ast::{
    AggregateExpression, AggregationMethod, ApplyClause, BinaryNode, BinaryOperator, ClausePath,
    ComputeItem, ConvertNode, ExpandItem, ExpandOptions, FilterClause, FunctionCallNode,
    GroupByKey, NavigationSegment, OrderByClause, OrderByItem, OrderDirection, PropertyPath,
    QueryNode, QueryRequest, SelectExpandClause, SelectItem, SkipTokenNameValue, UnaryNode,
    UnaryOperator,
};
