// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! OrderBy stage
//!
//! Builds one stable multi-key ordering. The primary key is compared first
//! and later keys only break ties; rows equal under every key keep their
//! source order.

use super::StageOutput;
use crate::ast::OrderByItem;
use crate::expr::{QueryExpr, SortKey};
use crate::plan::context::TranslatorContext;
use crate::plan::error::{Clause, TranslationResult};
use crate::plan::resolver::OperatorResolver;

pub fn apply(
    source: QueryExpr,
    items: &[OrderByItem],
    context: &TranslatorContext,
) -> TranslationResult<StageOutput> {
    if items.is_empty() {
        return Ok(StageOutput::passthrough(source, context));
    }

    let translator = context.translator(Clause::OrderBy);
    let keys = items
        .iter()
        .map(|item| {
            Ok(SortKey {
                expr: translator.translate(&item.expression)?,
                direction: item.direction,
            })
        })
        .collect::<TranslationResult<Vec<_>>>()?;

    let expression = OperatorResolver::new(Clause::OrderBy, context.path()).order_by(
        source,
        context.parameter().clone(),
        keys,
    )?;
    Ok(StageOutput::passthrough(expression, context))
}
