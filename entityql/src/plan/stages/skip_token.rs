// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! SkipToken stage (keyset pagination)
//!
//! Given the ordering-key values of the last row of the previous page,
//! keeps only rows that sort strictly after that row:
//!
//! ```text
//! OR over i of ( AND over j < i of key_j == v_j ) AND after(key_i, v_i)
//! ```
//!
//! `after` honours the key's direction and where the store sorts nulls.
//! Non-null cursor values are registered as placeholders.

use super::StageOutput;
use crate::ast::{OrderByItem, OrderDirection, SkipTokenNameValue};
use crate::expr::{BinaryOp, BoundKind, Expr, ExprType, Lambda, QueryExpr, UnaryOp};
use crate::plan::context::TranslatorContext;
use crate::plan::error::{Clause, TranslationError, TranslationResult};
use crate::plan::options::NullOrdering;
use crate::plan::resolver::OperatorResolver;
use crate::plan::translator::NodeTranslator;
use crate::types::{TypeCoercion, Value, ValueType};

struct CursorKey {
    expr: Expr,
    direction: OrderDirection,
    /// `None` when the previous row held null for this key
    bound: Option<Expr>,
}

fn invalid(context: &TranslatorContext, reason: String) -> TranslationError {
    TranslationError::InvalidBound {
        clause: Clause::SkipToken,
        path: context.path().clone(),
        reason,
    }
}

fn boolean(nullable: bool) -> ExprType {
    ExprType::scalar(ValueType::Boolean, nullable)
}

fn null_test(op: UnaryOp, expr: &Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(expr.clone()),
        ty: boolean(false),
    }
}

/// Predicate for "this key sorts strictly after the cursor value"; `None`
/// when no value can sort after it
fn after(
    translator: &NodeTranslator<'_>,
    key: &CursorKey,
    null_ordering: NullOrdering,
) -> TranslationResult<Option<Expr>> {
    let ascending = key.direction == OrderDirection::Ascending;
    let nulls_last = ascending == (null_ordering == NullOrdering::Highest);

    let Some(bound) = &key.bound else {
        return Ok(if nulls_last {
            None
        } else {
            Some(null_test(UnaryOp::IsNotNull, &key.expr))
        });
    };

    let op = if ascending { BinaryOp::Gt } else { BinaryOp::Lt };
    let beyond = translator.build_binary(op, key.expr.clone(), bound.clone())?;
    if nulls_last && key.expr.ty().is_nullable() {
        let null = null_test(UnaryOp::IsNull, &key.expr);
        return translator.build_binary(BinaryOp::Or, beyond, null).map(Some);
    }
    Ok(Some(beyond))
}

fn equal(translator: &NodeTranslator<'_>, key: &CursorKey) -> TranslationResult<Expr> {
    match &key.bound {
        Some(bound) => translator.build_binary(BinaryOp::Eq, key.expr.clone(), bound.clone()),
        None => Ok(null_test(UnaryOp::IsNull, &key.expr)),
    }
}

pub fn apply(
    source: QueryExpr,
    values: &[SkipTokenNameValue],
    ordering: &[OrderByItem],
    context: &TranslatorContext,
    null_ordering: NullOrdering,
) -> TranslationResult<StageOutput> {
    if values.is_empty() {
        return Ok(StageOutput::passthrough(source, context));
    }

    if values.len() != ordering.len() {
        return Err(invalid(
            context,
            format!(
                "{} skip-token values for {} ordering keys",
                values.len(),
                ordering.len()
            ),
        ));
    }

    let translator = context.translator(Clause::SkipToken);
    let mut keys = Vec::with_capacity(values.len());
    let mut members = Vec::with_capacity(values.len());

    for (i, (value, item)) in values.iter().zip(ordering).enumerate() {
        let path = item.property_path().ok_or_else(|| {
            invalid(
                context,
                format!("ordering key {} is not a property", item.expression),
            )
        })?;
        if value.name != path.to_string() {
            return Err(invalid(
                context,
                format!(
                    "skip-token name '{}' does not match ordering key '{}'",
                    value.name, path
                ),
            ));
        }

        let expr = translator.resolve_path(path)?;
        if let Some(member) = expr.member_of(context.parameter()) {
            members.push(member.to_string());
        }

        let bound = if value.value.is_null() {
            None
        } else {
            let literal_type = value.value.value_type().ok_or_else(|| {
                TranslationError::TypeMismatch {
                    clause: Clause::SkipToken,
                    path: context.path().clone(),
                    message: format!("skip-token value {} is not a scalar", value.value),
                }
            })?;
            // Bind in the key's own type when the literal widens to it
            let (ty, literal) = match expr.ty().value_type() {
                Some(key_type)
                    if TypeCoercion::find_common_type(literal_type, key_type) == Some(key_type) =>
                {
                    match TypeCoercion::convert(&value.value, key_type) {
                        Some(converted) => (key_type, converted),
                        None => (literal_type, value.value.clone()),
                    }
                }
                _ => (literal_type, value.value.clone()),
            };
            let placeholder = context.register_bound(BoundKind::SkipToken(i), ty, literal);
            Some(Expr::Placeholder(placeholder))
        };

        keys.push(CursorKey {
            expr,
            direction: item.direction,
            bound,
        });
    }

    if !context
        .shape()
        .is_total_ordering(members.iter().map(String::as_str))
    {
        return Err(invalid(
            context,
            format!("ordering does not uniquely order rows of {}", context.shape()),
        ));
    }

    let mut disjuncts = Vec::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        let Some(mut conjunct) = after(&translator, key, null_ordering)? else {
            continue;
        };
        for prefix in keys[..i].iter().rev() {
            let equality = equal(&translator, prefix)?;
            conjunct = translator.build_binary(BinaryOp::And, equality, conjunct)?;
        }
        disjuncts.push(conjunct);
    }

    let mut disjuncts = disjuncts.into_iter();
    let predicate = match disjuncts.next() {
        None => Expr::Constant(Value::Boolean(false)),
        Some(first) => disjuncts.try_fold(first, |acc, next| {
            translator.build_binary(BinaryOp::Or, acc, next)
        })?,
    };

    log::debug!("Skip-token predicate over {}: {}", context.shape(), predicate);

    let expression = OperatorResolver::new(Clause::SkipToken, context.path())
        .filter(source, Lambda::new(context.parameter().clone(), predicate))?;
    Ok(StageOutput::passthrough(expression, context))
}
