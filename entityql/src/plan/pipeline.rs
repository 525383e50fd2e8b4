// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Translation pipeline
//!
//! Threads a request through the stages in fixed order:
//!
//! ```text
//! Navigation -> Filter -> Aggregation -> Select -> OrderBy
//!            -> SkipToken -> Skip -> Take -> Count
//! ```
//!
//! Each stage sees the expression and context produced by the previous one.
//! A stage whose clause is absent leaves both untouched. Translation runs
//! on the caller's thread and keeps all mutable state local to the run.

use super::constants::ConstantBindings;
use super::context::TranslatorContext;
use super::entry_factory::EntryFactory;
use super::error::{Clause, TranslationError, TranslationResult};
use super::options::TranslationOptions;
use super::resolver::OperatorResolver;
use super::stages::{
    aggregation, count, filter, navigation, order_by, paging, select, skip_token, StageOutput,
};
use crate::ast::{OrderByItem, QueryRequest};
use crate::expr::{QueryExpr, QueryOperator};
use crate::model::{MetadataProvider, Shape, ShapeKind};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pipeline stages, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineStage {
    Navigation,
    Filter,
    Aggregation,
    Select,
    OrderBy,
    SkipToken,
    Skip,
    Take,
    Count,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// What one stage did during a translation
#[derive(Debug, Clone, Serialize)]
pub struct StageTrace {
    pub stage: PipelineStage,
    /// Whether the stage added operators to the expression
    pub applied: bool,
    pub duration: Duration,
}

/// Result of translating one request
#[derive(Debug, Clone)]
pub struct TranslatedQuery {
    pub expression: QueryExpr,
    pub entry_factory: EntryFactory,
    /// Values of every placeholder in `expression`
    pub constants: ConstantBindings,
    /// Ordering the result rows follow, including keys appended for paging
    pub ordering: Vec<OrderByItem>,
    pub trace: Vec<StageTrace>,
}

impl TranslatedQuery {
    /// Method-chain rendering of the expression
    pub fn explain(&self) -> String {
        self.expression.to_string()
    }

    /// Whether the expression yields a row count instead of rows
    pub fn is_count(&self) -> bool {
        self.expression.operator() == QueryOperator::Count
    }

    pub fn applied_stages(&self) -> Vec<PipelineStage> {
        self.trace
            .iter()
            .filter(|t| t.applied)
            .map(|t| t.stage)
            .collect()
    }
}

/// Records stage traces as the pipeline runs
struct StageRecorder {
    trace: Vec<StageTrace>,
}

impl StageRecorder {
    fn new() -> Self {
        Self {
            trace: Vec::with_capacity(9),
        }
    }

    fn run<F>(
        &mut self,
        stage: PipelineStage,
        expression: QueryExpr,
        apply: F,
    ) -> TranslationResult<StageOutput>
    where
        F: FnOnce(QueryExpr) -> TranslationResult<StageOutput>,
    {
        let started = Instant::now();
        let before = expression.operators().len();
        let output = apply(expression)?;
        let applied = output.expression.operators().len() != before;

        if applied {
            log::debug!("{} stage applied: {:?}", stage, output.expression.operator());
        } else {
            log::trace!("{} stage skipped", stage);
        }

        self.trace.push(StageTrace {
            stage,
            applied,
            duration: started.elapsed(),
        });
        Ok(output)
    }
}

/// Translates clause trees into native query expressions against one model
#[derive(Debug, Clone)]
pub struct ExpressionBuilder {
    model: Arc<dyn MetadataProvider>,
    options: TranslationOptions,
}

impl ExpressionBuilder {
    pub fn new(model: Arc<dyn MetadataProvider>, options: TranslationOptions) -> Self {
        Self { model, options }
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    pub fn model(&self) -> &Arc<dyn MetadataProvider> {
        &self.model
    }

    /// Entity set rows of the given shape belong to, if they are entities
    fn entity_set_of(&self, shape: &Shape, root: &Shape, request: &QueryRequest) -> Option<String> {
        if shape == root {
            return Some(request.entity_set.clone());
        }
        match shape.kind() {
            ShapeKind::Entity => self
                .model
                .entity_set_for_type(shape.name())
                .map(|set| set.name.clone()),
            _ => None,
        }
    }

    /// Translate one request
    pub fn translate(&self, request: &QueryRequest) -> TranslationResult<TranslatedQuery> {
        let path = request.path();
        let unresolved = |name: &str| TranslationError::UnresolvedName {
            clause: Clause::Navigation,
            path: path.clone(),
            name: name.to_string(),
            shape: "entity container".to_string(),
        };

        let entity_set = self
            .model
            .entity_set(&request.entity_set)
            .ok_or_else(|| unresolved(&request.entity_set))?;
        let root_shape = self
            .model
            .entity_shape(&entity_set.entity_type)
            .ok_or_else(|| unresolved(&entity_set.entity_type))?;

        log::debug!("Translating request over {}", request.entity_set);

        let root = TranslatorContext::new(self.model.clone(), root_shape.clone(), path);
        let source = OperatorResolver::source(&entity_set.name, root_shape.clone());
        let paging = self.options.is_paging();
        let mut recorder = StageRecorder::new();
        let mut entry_factory = None;

        let StageOutput {
            expression,
            context,
            ..
        } = recorder.run(PipelineStage::Navigation, source, |e| {
            navigation::apply(e, &request.navigation, &root)
        })?;

        let StageOutput {
            expression,
            context,
            ..
        } = recorder.run(PipelineStage::Filter, expression, |e| {
            filter::apply(e, request.filter.as_ref(), &context)
        })?;

        let StageOutput {
            expression,
            context,
            entry_factory: produced,
        } = recorder.run(PipelineStage::Aggregation, expression, |e| {
            aggregation::apply(e, request.apply.as_ref(), &context)
        })?;
        if produced.is_some() {
            entry_factory = produced;
        }

        let ordering =
            paging::effective_ordering(request.order_by.as_ref(), &context, self.options.page_size);
        let protected: &[OrderByItem] =
            if request.select_expand.is_some() || (request.order_by.is_some() && paging) {
                &ordering
            } else {
                &[]
            };
        let projected_set = self.entity_set_of(context.shape(), &root_shape, request);

        let StageOutput {
            expression,
            context,
            entry_factory: produced,
        } = recorder.run(PipelineStage::Select, expression, |e| {
            select::apply(
                e,
                request.select_expand.as_ref(),
                protected,
                projected_set,
                &context,
                &self.options,
            )
        })?;
        if produced.is_some() {
            entry_factory = produced;
        }

        let StageOutput {
            expression,
            context,
            ..
        } = recorder.run(PipelineStage::OrderBy, expression, |e| {
            order_by::apply(e, &ordering, &context)
        })?;

        let StageOutput {
            expression,
            context,
            ..
        } = recorder.run(PipelineStage::SkipToken, expression, |e| {
            skip_token::apply(
                e,
                &request.skip_token,
                &ordering,
                &context,
                self.options.null_ordering,
            )
        })?;

        let StageOutput {
            expression,
            context,
            ..
        } = recorder.run(PipelineStage::Skip, expression, |e| {
            paging::skip(e, request.skip, &context)
        })?;

        let top = paging::take_bound(request.top, self.options.page_size, request.count);
        let StageOutput {
            expression,
            context,
            ..
        } = recorder.run(PipelineStage::Take, expression, |e| {
            paging::take(e, top, &context)
        })?;

        let skip_token_keys = if paging && !request.count {
            paging::skip_token_keys(&ordering, &context)
        } else {
            Vec::new()
        };
        let entry_factory = entry_factory
            .unwrap_or_else(|| {
                let entity_set = self.entity_set_of(context.shape(), &root_shape, request);
                EntryFactory::from_shape(context.shape(), entity_set)
            })
            .with_skip_token_keys(skip_token_keys);

        let StageOutput {
            expression,
            context,
            ..
        } = recorder.run(PipelineStage::Count, expression, |e| {
            count::apply(e, request.count, &context)
        })?;

        let constants = context.constants();
        log::debug!(
            "Translated {} into {} operators with {} bound values",
            request.entity_set,
            expression.operators().len(),
            constants.len()
        );

        Ok(TranslatedQuery {
            expression,
            entry_factory,
            constants,
            ordering,
            trace: recorder.trace,
        })
    }
}
