// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Composable query expressions
//!
//! A query expression is a chain of sequence operators over an abstract
//! source. Each node records the operator signature it was resolved with,
//! which fixes the shape of the items it yields.

use crate::ast::{AggregationMethod, OrderDirection};
use crate::expr::expression::{Expr, ExprType, Lambda, Parameter, Placeholder};
use crate::model::Shape;
use crate::types::ValueType;
use serde::Serialize;
use std::sync::Arc;

/// What a query yields
#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub enum ItemType {
    /// A sequence of rows of the given shape
    Rows(Arc<Shape>),
    /// A single scalar, e.g. a count
    Scalar(ValueType),
}

impl ItemType {
    pub fn shape(&self) -> Option<&Arc<Shape>> {
        match self {
            ItemType::Rows(shape) => Some(shape),
            ItemType::Scalar(_) => None,
        }
    }
}

/// Generic sequence operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueryOperator {
    Source,
    Collection,
    Where,
    Select,
    SelectMany,
    Aggregate,
    OrderBy,
    Skip,
    Take,
    Count,
}

/// An operator instantiated for concrete input and output shapes
#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub struct OperatorSignature {
    pub operator: QueryOperator,
    pub input: Option<Arc<Shape>>,
    pub output: ItemType,
}

#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub struct SortKey {
    pub expr: Expr,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub struct AggregateCall {
    pub method: AggregationMethod,
    pub argument: Option<Expr>,
    pub ty: ExprType,
}

#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub enum QueryOp {
    /// Rows of a named entity set
    Source { entity_set: String },
    /// Rows of a collection-valued (or single-valued) expression,
    /// correlated with an enclosing row
    Collection { collection: Expr },
    Where {
        source: Box<QueryExpr>,
        predicate: Lambda,
    },
    Select {
        source: Box<QueryExpr>,
        selector: Lambda,
    },
    SelectMany {
        source: Box<QueryExpr>,
        selector: Lambda,
    },
    /// Group by `keys` and compute `aggregates`; yields tuples of the keys
    /// followed by the aggregate results
    Aggregate {
        source: Box<QueryExpr>,
        parameter: Parameter,
        keys: Vec<Expr>,
        aggregates: Vec<AggregateCall>,
    },
    /// Stable multi-key ordering, primary key first
    OrderBy {
        source: Box<QueryExpr>,
        parameter: Parameter,
        keys: Vec<SortKey>,
    },
    Skip {
        source: Box<QueryExpr>,
        count: Placeholder,
    },
    Take {
        source: Box<QueryExpr>,
        count: Placeholder,
    },
    Count { source: Box<QueryExpr> },
}

#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub struct QueryExpr {
    pub op: QueryOp,
    pub signature: OperatorSignature,
}

impl QueryExpr {
    pub fn new(op: QueryOp, signature: OperatorSignature) -> Self {
        Self { op, signature }
    }

    pub fn item_type(&self) -> &ItemType {
        &self.signature.output
    }

    pub fn item_shape(&self) -> Option<&Arc<Shape>> {
        self.signature.output.shape()
    }

    pub fn operator(&self) -> QueryOperator {
        self.signature.operator
    }

    /// The input this operator wraps, `None` for sources
    pub fn source(&self) -> Option<&QueryExpr> {
        match &self.op {
            QueryOp::Source { .. } | QueryOp::Collection { .. } => None,
            QueryOp::Where { source, .. }
            | QueryOp::Select { source, .. }
            | QueryOp::SelectMany { source, .. }
            | QueryOp::Aggregate { source, .. }
            | QueryOp::OrderBy { source, .. }
            | QueryOp::Skip { source, .. }
            | QueryOp::Take { source, .. }
            | QueryOp::Count { source } => Some(source),
        }
    }

    /// Operators from the source outward
    pub fn operators(&self) -> Vec<QueryOperator> {
        let mut chain = vec![self.operator()];
        let mut current = self.source();
        while let Some(expr) = current {
            chain.push(expr.operator());
            current = expr.source();
        }
        chain.reverse();
        chain
    }

    /// Serialized form for diagnostics
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
