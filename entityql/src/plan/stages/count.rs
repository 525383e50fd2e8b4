// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Count stage

use super::StageOutput;
use crate::expr::QueryExpr;
use crate::plan::context::TranslatorContext;
use crate::plan::error::{Clause, TranslationResult};
use crate::plan::resolver::OperatorResolver;

/// Replace the rows with their number when a count was requested
pub fn apply(
    source: QueryExpr,
    count: bool,
    context: &TranslatorContext,
) -> TranslationResult<StageOutput> {
    if !count {
        return Ok(StageOutput::passthrough(source, context));
    }
    let expression = OperatorResolver::new(Clause::Count, context.path()).count(source)?;
    Ok(StageOutput::passthrough(expression, context))
}
