// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Aggregation stage
//!
//! Groups rows by the requested keys and computes the aggregates of each
//! group. The result rows are synthesized tuples `Item1..ItemN`, keys first,
//! addressed from here on through an alias map.

use super::StageOutput;
use crate::ast::{AggregationMethod, ApplyClause};
use crate::expr::{AggregateCall, ExprType, QueryExpr, QueryOperator};
use crate::model::{Member, Shape, ShapeKind};
use crate::plan::context::{AliasMap, TranslatorContext};
use crate::plan::entry_factory::{EntryFactory, EntryField, FieldAccessor};
use crate::plan::error::{Clause, TranslationError, TranslationResult};
use crate::plan::resolver::OperatorResolver;
use crate::types::ValueType;
use std::sync::Arc;

fn unsupported(context: &TranslatorContext, reason: String) -> TranslationError {
    TranslationError::UnsupportedShape {
        clause: Clause::Apply,
        path: context.path().clone(),
        operator: QueryOperator::Aggregate,
        shape: context.shape().name().to_string(),
        reason,
    }
}

fn mismatch(context: &TranslatorContext, message: String) -> TranslationError {
    TranslationError::TypeMismatch {
        clause: Clause::Apply,
        path: context.path().clone(),
        message,
    }
}

/// Result type of an aggregate over an input of the given scalar type
fn aggregate_type(
    context: &TranslatorContext,
    method: AggregationMethod,
    input: Option<&ExprType>,
) -> TranslationResult<ExprType> {
    let input_type = input.and_then(ExprType::value_type);

    match method {
        AggregationMethod::Count | AggregationMethod::CountDistinct => {
            Ok(ExprType::scalar(ValueType::Int64, false))
        }
        AggregationMethod::Sum | AggregationMethod::Average => match input_type {
            Some(ty) if ty.is_numeric() => Ok(match method {
                AggregationMethod::Sum if ty.is_integral() => ExprType::scalar(ValueType::Int64, false),
                AggregationMethod::Sum => ExprType::scalar(ValueType::Double, false),
                _ => ExprType::scalar(ValueType::Double, true),
            }),
            _ => Err(mismatch(
                context,
                format!(
                    "{:?} requires a numeric input, found {}",
                    method,
                    input.map(ToString::to_string).unwrap_or_default()
                ),
            )),
        },
        AggregationMethod::Min | AggregationMethod::Max => match input_type {
            Some(ty) => Ok(ExprType::scalar(ty, true)),
            None => Err(mismatch(
                context,
                format!("{:?} requires a scalar input", method),
            )),
        },
    }
}

pub fn apply(
    source: QueryExpr,
    clause: Option<&ApplyClause>,
    context: &TranslatorContext,
) -> TranslationResult<StageOutput> {
    let Some(apply) = clause else {
        return Ok(StageOutput::passthrough(source, context));
    };

    if apply.group_by.is_empty() && apply.aggregates.is_empty() {
        return Err(unsupported(context, "no group keys or aggregates".to_string()));
    }

    let translator = context.translator(Clause::Apply);
    let mut members = Vec::new();
    let mut aliases = AliasMap::new();
    let mut fields = Vec::new();
    let mut keys = Vec::new();
    let mut tuple_keys = Vec::new();

    let mut add_member = |alias: String, ty: &ExprType| -> TranslationResult<String> {
        if aliases.contains(&alias) {
            return Err(unsupported(context, format!("duplicate alias '{}'", alias)));
        }
        let name = format!("Item{}", members.len() + 1);
        let (value_type, nullable) = match ty {
            ExprType::Scalar { ty, nullable } => (*ty, *nullable),
            other => {
                return Err(unsupported(
                    context,
                    format!("'{}' of type {} cannot be grouped or aggregated", alias, other),
                ))
            }
        };
        members.push(Member::scalar(&name, value_type, nullable));
        aliases.insert(alias.clone(), name.clone());
        fields.push(EntryField {
            name: alias,
            accessor: FieldAccessor::Member(name.clone()),
        });
        Ok(name)
    };

    for key in &apply.group_by {
        let expr = translator.resolve_path(&key.property)?;
        let name = add_member(key.alias(), &expr.ty())?;
        tuple_keys.push(name);
        keys.push(expr);
    }

    let mut aggregates = Vec::new();
    for aggregate in &apply.aggregates {
        let argument = match (&aggregate.method, &aggregate.expression) {
            (AggregationMethod::Count, _) => None,
            (_, Some(expression)) => Some(translator.translate(expression)?),
            (method, None) => {
                return Err(unsupported(
                    context,
                    format!("{:?} '{}' has no input expression", method, aggregate.alias),
                ))
            }
        };
        let argument_type = argument.as_ref().map(|a| a.ty());
        let ty = aggregate_type(context, aggregate.method, argument_type.as_ref())?;
        add_member(aggregate.alias.clone(), &ty)?;
        aggregates.push(AggregateCall {
            method: aggregate.method,
            argument,
            ty,
        });
    }

    let tuple = Arc::new(Shape::new(
        &format!("{}Group", context.shape().name()),
        ShapeKind::Tuple,
        members,
        tuple_keys,
    ));

    let expression = OperatorResolver::new(Clause::Apply, context.path()).aggregate(
        source,
        context.parameter().clone(),
        keys,
        aggregates,
        tuple.clone(),
    )?;

    log::debug!(
        "Aggregated {} into {} ({} members)",
        context.shape().name(),
        tuple.name(),
        tuple.members().len()
    );

    let factory = EntryFactory::new(None, fields);
    let rebound = context.rebind_with_aliases(tuple, aliases);
    Ok(StageOutput::rebound(expression, rebound, Some(factory)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AggregateExpression, GroupByKey, PropertyPath, QueryNode};
    use crate::plan::error::ErrorKind;
    use crate::plan::stages::fixtures;

    fn sum_by_customer() -> ApplyClause {
        ApplyClause {
            group_by: vec![GroupByKey::new("CustomerId")],
            aggregates: vec![
                AggregateExpression::new(AggregationMethod::Sum, "Price", "Total"),
                AggregateExpression::count("Orders"),
            ],
        }
    }

    #[test]
    fn test_tuple_shape_and_aliases() {
        let (source, context) = fixtures::orders();
        let output = apply(source, Some(&sum_by_customer()), &context).unwrap();

        let shape = output.context.shape();
        assert_eq!(shape.kind(), ShapeKind::Tuple);
        assert_eq!(shape.keys(), &["Item1".to_string()]);

        let aliases = output.context.aliases().unwrap();
        assert_eq!(aliases.member("CustomerId"), Some("Item1"));
        assert_eq!(aliases.member("Total"), Some("Item2"));
        assert_eq!(aliases.member("Orders"), Some("Item3"));

        let factory = output.entry_factory.unwrap();
        assert_eq!(factory.field_names(), vec!["CustomerId", "Total", "Orders"]);
    }

    #[test]
    fn test_result_types() {
        let (source, context) = fixtures::orders();
        let output = apply(source, Some(&sum_by_customer()), &context).unwrap();
        let shape = output.context.shape();

        // Sum over a nullable Double stays non-null; Count is Int64
        assert_eq!(
            shape.member("Item2").map(|m| &m.ty),
            Some(&crate::model::MemberType::Scalar {
                ty: ValueType::Double,
                nullable: false
            })
        );
        assert_eq!(
            shape.member("Item3").map(|m| &m.ty),
            Some(&crate::model::MemberType::Scalar {
                ty: ValueType::Int64,
                nullable: false
            })
        );
    }

    #[test]
    fn test_aliases_resolve_after_grouping() {
        let (source, context) = fixtures::orders();
        let output = apply(source, Some(&sum_by_customer()), &context).unwrap();
        let translator = output.context.translator(Clause::OrderBy);

        let total = translator.resolve_path(&PropertyPath::new("Total")).unwrap();
        assert_eq!(total.member_of(output.context.parameter()), Some("Item2"));

        let error = translator
            .resolve_path(&PropertyPath::new("Price"))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnresolvedName);
    }

    #[test]
    fn test_group_by_navigation_path_aliases_to_path() {
        let (source, context) = fixtures::orders();
        let clause = ApplyClause {
            group_by: vec![GroupByKey::new("Customer/Name")],
            aggregates: vec![],
        };
        let output = apply(source, Some(&clause), &context).unwrap();
        assert_eq!(
            output.context.aliases().and_then(|a| a.member("Customer/Name")),
            Some("Item1")
        );
    }

    #[test]
    fn test_invalid_apply_clauses() {
        let (source, context) = fixtures::orders();

        let error = apply(source.clone(), Some(&ApplyClause::default()), &context).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedShape);

        let duplicate = ApplyClause {
            group_by: vec![GroupByKey::new("Name")],
            aggregates: vec![AggregateExpression::count("Name")],
        };
        let error = apply(source.clone(), Some(&duplicate), &context).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedShape);

        let sum_of_string = ApplyClause {
            group_by: vec![],
            aggregates: vec![AggregateExpression {
                method: AggregationMethod::Sum,
                expression: Some(QueryNode::property("Name")),
                alias: "Names".to_string(),
            }],
        };
        let error = apply(source, Some(&sum_of_string), &context).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    }
}
