// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Filter stage

use super::StageOutput;
use crate::ast::FilterClause;
use crate::expr::QueryExpr;
use crate::plan::context::TranslatorContext;
use crate::plan::error::{Clause, TranslationResult};
use crate::plan::resolver::OperatorResolver;

/// Keep the rows the predicate holds for; unknown counts as discard
pub fn apply(
    source: QueryExpr,
    clause: Option<&FilterClause>,
    context: &TranslatorContext,
) -> TranslationResult<StageOutput> {
    let Some(filter) = clause else {
        return Ok(StageOutput::passthrough(source, context));
    };

    let predicate = context
        .translator(Clause::Filter)
        .translate_predicate(&filter.expression)?;
    let expression = OperatorResolver::new(Clause::Filter, context.path()).filter(source, predicate)?;
    Ok(StageOutput::passthrough(expression, context))
}
