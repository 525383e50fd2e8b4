// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Navigation stage
//!
//! Walks the resource path segment by segment. A to-many navigation is
//! flattened, a single-valued one is projected, and an inline filter is
//! applied to the rows of the new shape before the next segment.

use super::StageOutput;
use crate::ast::NavigationSegment;
use crate::expr::{Expr, ExprType, Lambda, QueryExpr, QueryOperator};
use crate::model::MemberType;
use crate::plan::context::TranslatorContext;
use crate::plan::error::{Clause, TranslationError, TranslationResult};
use crate::plan::resolver::OperatorResolver;

pub fn apply(
    source: QueryExpr,
    segments: &[NavigationSegment],
    context: &TranslatorContext,
) -> TranslationResult<StageOutput> {
    let mut expression = source;
    let mut current = context.clone();

    for segment in segments {
        if let Some(property) = &segment.property {
            let shape = current.shape().clone();
            let member = shape
                .member(property)
                .ok_or_else(|| TranslationError::UnresolvedName {
                    clause: Clause::Navigation,
                    path: current.path().clone(),
                    name: property.clone(),
                    shape: shape.name().to_string(),
                })?;

            let (target, multiplicity) = match &member.ty {
                MemberType::Navigation {
                    target,
                    multiplicity,
                } => (target, *multiplicity),
                _ => {
                    return Err(TranslationError::UnsupportedShape {
                        clause: Clause::Navigation,
                        path: current.path().clone(),
                        operator: QueryOperator::Select,
                        shape: shape.name().to_string(),
                        reason: format!("'{}' is not a navigation property", property),
                    })
                }
            };

            let target_shape = current.navigation_target(Clause::Navigation, property, target)?;
            let resolver = OperatorResolver::new(Clause::Navigation, current.path());
            let parameter = current.parameter().clone();

            expression = if multiplicity.is_many() {
                let access = Expr::member(
                    parameter.to_expr(),
                    property,
                    ExprType::Collection(target_shape.clone()),
                );
                resolver.select_many(expression, Lambda::new(parameter, access))?
            } else {
                let access = Expr::member(
                    parameter.to_expr(),
                    property,
                    ExprType::Record(target_shape.clone()),
                );
                resolver.select(expression, Lambda::new(parameter, access))?
            };

            log::debug!(
                "Navigated {}.{} ({:?}) to {}",
                shape.name(),
                property,
                multiplicity,
                target_shape.name()
            );
            current = current.rebind(target_shape);
        }

        if let Some(filter) = &segment.filter {
            let predicate = current
                .translator(Clause::Navigation)
                .translate_predicate(&filter.expression)?;
            expression =
                OperatorResolver::new(Clause::Navigation, current.path()).filter(expression, predicate)?;
        }
    }

    Ok(StageOutput::rebound(expression, current, None))
}
