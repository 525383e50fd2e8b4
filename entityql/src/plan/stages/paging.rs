// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Skip and Take stages, and the effective ordering used for paging
//!
//! Bounds are registered as placeholders and never inlined, so requests
//! differing only in `$skip`/`$top` produce identical expressions.

use super::StageOutput;
use crate::ast::{OrderByClause, OrderByItem};
use crate::expr::{BoundKind, Placeholder, QueryExpr};
use crate::plan::context::TranslatorContext;
use crate::plan::entry_factory::SkipTokenKey;
use crate::plan::error::{Clause, TranslationError, TranslationResult};
use crate::plan::resolver::OperatorResolver;
use crate::types::{Value, ValueType};

fn register(
    bound: Option<i64>,
    kind: BoundKind,
    clause: Clause,
    context: &TranslatorContext,
) -> TranslationResult<Option<Placeholder>> {
    match bound {
        None => Ok(None),
        Some(n) if n < 0 => Err(TranslationError::InvalidBound {
            clause,
            path: context.path().clone(),
            reason: format!("negative value {}", n),
        }),
        Some(n) => Ok(Some(context.register_bound(
            kind,
            ValueType::Int64,
            Value::Int64(n),
        ))),
    }
}

pub fn skip(
    source: QueryExpr,
    bound: Option<i64>,
    context: &TranslatorContext,
) -> TranslationResult<StageOutput> {
    match register(bound, BoundKind::Skip, Clause::Skip, context)? {
        None => Ok(StageOutput::passthrough(source, context)),
        Some(count) => {
            let expression = OperatorResolver::new(Clause::Skip, context.path()).skip(source, count)?;
            Ok(StageOutput::passthrough(expression, context))
        }
    }
}

pub fn take(
    source: QueryExpr,
    bound: Option<i64>,
    context: &TranslatorContext,
) -> TranslationResult<StageOutput> {
    match register(bound, BoundKind::Top, Clause::Top, context)? {
        None => Ok(StageOutput::passthrough(source, context)),
        Some(count) => {
            let expression = OperatorResolver::new(Clause::Top, context.path()).take(source, count)?;
            Ok(StageOutput::passthrough(expression, context))
        }
    }
}

/// Take bound with server paging: the smaller of `$top` and the page size.
/// A counted request is never truncated to a page.
pub fn take_bound(top: Option<i64>, page_size: i64, count: bool) -> Option<i64> {
    if page_size <= 0 || count {
        return top;
    }
    match top {
        Some(top) if top >= 0 => Some(top.min(page_size)),
        Some(negative) => Some(negative),
        None => Some(page_size),
    }
}

/// Requested ordering, completed with the shape's key members (ascending)
/// when paging so that every row has a unique position
pub fn effective_ordering(
    order_by: Option<&OrderByClause>,
    context: &TranslatorContext,
    page_size: i64,
) -> Vec<OrderByItem> {
    let mut items = order_by.map(|c| c.items.clone()).unwrap_or_default();
    if page_size <= 0 {
        return items;
    }

    for key in context.shape().keys() {
        // Tuple keys are exposed under their alias
        let name = context
            .aliases()
            .and_then(|aliases| aliases.alias(key))
            .unwrap_or(key.as_str());
        let present = items
            .iter()
            .any(|item| item.property_path().map(|p| p.to_string()).as_deref() == Some(name));
        if !present {
            items.push(OrderByItem::asc(name));
        }
    }
    items
}

/// Where each ordering key can be read from a result row; empty unless
/// every key is a plain member of the final shape
pub fn skip_token_keys(ordering: &[OrderByItem], context: &TranslatorContext) -> Vec<SkipTokenKey> {
    let translator = context.translator(Clause::SkipToken);
    let mut keys = Vec::with_capacity(ordering.len());
    for item in ordering {
        let Some(path) = item.property_path() else {
            return Vec::new();
        };
        let Ok(expr) = translator.resolve_path(path) else {
            return Vec::new();
        };
        let Some(member) = expr.member_of(context.parameter()) else {
            return Vec::new();
        };
        keys.push(SkipTokenKey {
            name: path.to_string(),
            member: member.to_string(),
        });
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::QueryOperator;
    use crate::plan::error::ErrorKind;
    use crate::plan::stages::fixtures;

    #[test]
    fn test_absent_bounds_are_noops() {
        let (source, context) = fixtures::orders();
        assert_eq!(skip(source.clone(), None, &context).unwrap().expression, source);
        assert_eq!(take(source.clone(), None, &context).unwrap().expression, source);
    }

    #[test]
    fn test_bounds_become_placeholders() {
        let (source, context) = fixtures::orders();
        let skipped = skip(source, Some(20), &context).unwrap();
        let taken = take(skipped.expression, Some(10), &skipped.context).unwrap();

        assert_eq!(
            taken.expression.operators(),
            vec![QueryOperator::Source, QueryOperator::Skip, QueryOperator::Take]
        );
        assert_eq!(
            taken.expression.to_string(),
            "Orders.Skip(@skip[Orders]).Take(@top[Orders])"
        );
        let constants = context.constants();
        assert_eq!(
            constants.value_at(BoundKind::Skip, context.path()),
            Some(&Value::Int64(20))
        );
    }

    #[test]
    fn test_negative_bound_rejected() {
        let (source, context) = fixtures::orders();
        let error = skip(source.clone(), Some(-1), &context).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidBound);
        assert_eq!(error.clause(), Clause::Skip);

        let error = take(source, Some(-5), &context).unwrap_err();
        assert_eq!(error.clause(), Clause::Top);
    }

    #[test]
    fn test_take_bound() {
        assert_eq!(take_bound(Some(50), 0, false), Some(50));
        assert_eq!(take_bound(Some(50), 20, false), Some(20));
        assert_eq!(take_bound(Some(5), 20, false), Some(5));
        assert_eq!(take_bound(None, 20, false), Some(20));
        assert_eq!(take_bound(None, 20, true), None);
    }

    #[test]
    fn test_effective_ordering_appends_missing_keys() {
        let (_, context) = fixtures::orders();
        let requested = OrderByClause::new(vec![OrderByItem::desc("Price")]);

        let unpaged = effective_ordering(Some(&requested), &context, 0);
        assert_eq!(unpaged, requested.items);

        let paged = effective_ordering(Some(&requested), &context, 10);
        assert_eq!(paged, vec![OrderByItem::desc("Price"), OrderByItem::asc("Id")]);

        let keyed = OrderByClause::new(vec![OrderByItem::desc("Id")]);
        assert_eq!(
            effective_ordering(Some(&keyed), &context, 10),
            vec![OrderByItem::desc("Id")]
        );
    }
}
