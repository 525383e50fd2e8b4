// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Readable rendering of translated expressions
//!
//! Renders operator chains in method-call form, e.g.
//! `Orders.Where(p0 => (p0.Price > 5)).Take(@top[Orders])`.

use crate::ast::OrderDirection;
use crate::expr::expression::{Expr, Lambda, Parameter, UnaryOp};
use crate::expr::query::{QueryExpr, QueryOp};
use std::fmt;

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.id.0)
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.parameter, self.body)
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Parameter(p) => write!(f, "{}", p),
            Expr::Member { target, name, .. } => write!(f, "{}.{}", target, name),
            Expr::Constant(value) => write!(f, "{}", value),
            Expr::Placeholder(p) => write!(f, "@{}[{}]", p.kind, p.path),
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => write!(f, "!{}", operand),
                UnaryOp::Negate => write!(f, "-{}", operand),
                UnaryOp::IsNull => write!(f, "({} is null)", operand),
                UnaryOp::IsNotNull => write!(f, "({} is not null)", operand),
            },
            Expr::Call {
                function,
                arguments,
                ..
            } => {
                write!(f, "{}(", function.name())?;
                write_list(f, arguments)?;
                write!(f, ")")
            }
            Expr::Convert { operand, to, .. } => write!(f, "Convert({}, {})", operand, to),
            Expr::Record { shape, fields } => {
                write!(f, "new {} {{ ", shape.name())?;
                for (i, (member, field)) in shape.members().iter().zip(fields).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", member.name, field)?;
                }
                write!(f, " }}")
            }
            Expr::Query(query) => write!(f, "{}", query),
            Expr::Single(query) => write!(f, "{}.FirstOrDefault()", query),
        }
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            QueryOp::Source { entity_set } => write!(f, "{}", entity_set),
            QueryOp::Collection { collection } => write!(f, "{}", collection),
            QueryOp::Where { source, predicate } => write!(f, "{}.Where({})", source, predicate),
            QueryOp::Select { source, selector } => write!(f, "{}.Select({})", source, selector),
            QueryOp::SelectMany { source, selector } => {
                write!(f, "{}.SelectMany({})", source, selector)
            }
            QueryOp::Aggregate {
                source,
                parameter,
                keys,
                aggregates,
            } => {
                write!(f, "{}.GroupBy({} => (", source, parameter)?;
                write_list(f, keys)?;
                write!(f, ")).Aggregate(")?;
                for (i, aggregate) in aggregates.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match &aggregate.argument {
                        Some(argument) => write!(f, "{:?}({})", aggregate.method, argument)?,
                        None => write!(f, "{:?}()", aggregate.method)?,
                    }
                }
                write!(f, ")")
            }
            QueryOp::OrderBy {
                source,
                parameter,
                keys,
            } => {
                write!(f, "{}.OrderBy({} => ", source, parameter)?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let direction = match key.direction {
                        OrderDirection::Ascending => "asc",
                        OrderDirection::Descending => "desc",
                    };
                    write!(f, "{} {}", key.expr, direction)?;
                }
                write!(f, ")")
            }
            QueryOp::Skip { source, count } => {
                write!(f, "{}.Skip({})", source, Expr::Placeholder(count.clone()))
            }
            QueryOp::Take { source, count } => {
                write!(f, "{}.Take({})", source, Expr::Placeholder(count.clone()))
            }
            QueryOp::Count { source } => write!(f, "{}.Count()", source),
        }
    }
}
