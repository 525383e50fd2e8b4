// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scalar expressions
//!
//! Translated predicates, selectors and keys. Every symbolic reference is
//! bound to a [`Parameter`] standing for the current row.

use crate::ast::ClausePath;
use crate::expr::query::{ItemType, QueryExpr};
use crate::functions::BuiltinFunction;
use crate::model::Shape;
use crate::types::{Value, ValueType};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ParameterId(pub u32);

/// The row variable of a lambda
#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub struct Parameter {
    pub id: ParameterId,
    pub shape: Arc<Shape>,
}

impl Parameter {
    pub fn new(id: ParameterId, shape: Arc<Shape>) -> Self {
        Self { id, shape }
    }

    pub fn to_expr(&self) -> Expr {
        Expr::Parameter(self.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PlaceholderId(pub u32);

/// Which literal a placeholder stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BoundKind {
    Skip,
    Top,
    /// Key value at the given position of a skip-token
    SkipToken(usize),
}

impl fmt::Display for BoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundKind::Skip => write!(f, "skip"),
            BoundKind::Top => write!(f, "top"),
            BoundKind::SkipToken(i) => write!(f, "skiptoken{}", i),
        }
    }
}

/// A parameterized literal slot, keyed by kind and originating clause path.
/// Its value lives in the request's constant map, never in the expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Placeholder {
    pub id: PlaceholderId,
    pub kind: BoundKind,
    pub path: ClausePath,
    pub ty: ValueType,
}

/// Static type of an expression
#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub enum ExprType {
    /// The untyped null literal
    Null,
    Scalar { ty: ValueType, nullable: bool },
    Record(Arc<Shape>),
    Collection(Arc<Shape>),
}

impl ExprType {
    pub fn scalar(ty: ValueType, nullable: bool) -> Self {
        ExprType::Scalar { ty, nullable }
    }

    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            ExprType::Scalar { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            ExprType::Null | ExprType::Record(_) => true,
            ExprType::Scalar { nullable, .. } => *nullable,
            ExprType::Collection(_) => false,
        }
    }

    /// Boolean-valued, or the null literal which reads as unknown
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            ExprType::Null
                | ExprType::Scalar {
                    ty: ValueType::Boolean,
                    ..
                }
        )
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprType::Null => write!(f, "null"),
            ExprType::Scalar { ty, nullable: true } => write!(f, "{}?", ty),
            ExprType::Scalar { ty, nullable: false } => write!(f, "{}", ty),
            ExprType::Record(shape) => write!(f, "{}", shape.name()),
            ExprType::Collection(shape) => write!(f, "Collection({})", shape.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Not,
    Negate,
    IsNull,
    IsNotNull,
}

/// Native scalar expression
#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub enum Expr {
    Parameter(Parameter),
    Member {
        target: Box<Expr>,
        name: String,
        ty: ExprType,
    },
    Constant(Value),
    Placeholder(Placeholder),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        ty: ExprType,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        ty: ExprType,
    },
    Call {
        function: BuiltinFunction,
        arguments: Vec<Expr>,
        ty: ExprType,
    },
    Convert {
        operand: Box<Expr>,
        to: ValueType,
        nullable: bool,
    },
    /// Record construction; `fields` align with the shape's members
    Record {
        shape: Arc<Shape>,
        fields: Vec<Expr>,
    },
    /// Nested query yielding its rows (or its scalar result)
    Query(Box<QueryExpr>),
    /// First row of a nested query, null when empty
    Single(Box<QueryExpr>),
}

impl Expr {
    pub fn member(target: Expr, name: &str, ty: ExprType) -> Self {
        Expr::Member {
            target: Box::new(target),
            name: name.to_string(),
            ty,
        }
    }

    pub fn ty(&self) -> ExprType {
        match self {
            Expr::Parameter(p) => ExprType::Record(p.shape.clone()),
            Expr::Member { ty, .. }
            | Expr::Binary { ty, .. }
            | Expr::Unary { ty, .. }
            | Expr::Call { ty, .. } => ty.clone(),
            Expr::Constant(value) => match value.value_type() {
                Some(ty) => ExprType::scalar(ty, false),
                None => ExprType::Null,
            },
            Expr::Placeholder(p) => ExprType::scalar(p.ty, false),
            Expr::Convert { to, nullable, .. } => ExprType::scalar(*to, *nullable),
            Expr::Record { shape, .. } => ExprType::Record(shape.clone()),
            Expr::Query(query) => match query.item_type() {
                ItemType::Rows(shape) => ExprType::Collection(shape.clone()),
                ItemType::Scalar(ty) => ExprType::scalar(*ty, false),
            },
            Expr::Single(query) => match query.item_type() {
                ItemType::Rows(shape) => ExprType::Record(shape.clone()),
                ItemType::Scalar(ty) => ExprType::scalar(*ty, true),
            },
        }
    }

    pub fn constant(&self) -> Option<&Value> {
        match self {
            Expr::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Name of the member when this is a direct member access on the given
    /// parameter, e.g. `p.Price`
    pub fn member_of(&self, parameter: &Parameter) -> Option<&str> {
        match self {
            Expr::Member { target, name, .. } => match target.as_ref() {
                Expr::Parameter(p) if p.id == parameter.id => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Single-parameter lambda
#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub struct Lambda {
    pub parameter: Parameter,
    pub body: Expr,
}

impl Lambda {
    pub fn new(parameter: Parameter, body: Expr) -> Self {
        Self { parameter, body }
    }
}
