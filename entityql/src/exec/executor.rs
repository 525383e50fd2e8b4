// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reference executor
//!
//! Evaluates a translated [`QueryExpr`] over a [`DataSource`] with the
//! placeholder bindings of its request. Predicates follow three-valued
//! logic: a row is kept only when the predicate is `true`. Ordering is a
//! stable multi-key sort honouring the configured null ordering, and groups
//! are emitted in order of first appearance.

use super::error::{ExecutionError, ExecutionResult};
use super::source::DataSource;
use crate::ast::{AggregationMethod, OrderDirection, QueryRequest, SkipTokenNameValue};
use crate::expr::eval::{self, ScalarError};
use crate::expr::{AggregateCall, Expr, Parameter, ParameterId, Placeholder, QueryExpr, QueryOp, SortKey};
use crate::model::Shape;
use crate::plan::{ConstantBindings, Entry, NullOrdering, TranslatedQuery, TranslationOptions};
use crate::types::{Record, Value, ValueType};
use serde::Serialize;
use std::cmp::Ordering;

/// Result of executing a query expression
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<Value>),
    Count(i64),
}

/// Materialized response of one translated request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub entries: Vec<Entry>,
    /// Row count of a `$count` request
    pub count: Option<i64>,
    /// Cursor for the next page when the page came back full
    pub next_skip_token: Option<Vec<SkipTokenNameValue>>,
}

impl QueryResult {
    /// Follow-up of `request` for the next page
    ///
    /// `$top` bounds the whole result, so the follow-up asks only for the rows
    /// this page left over. `None` when there is no next page or `$top` is
    /// used up.
    pub fn next_request(&self, request: &QueryRequest) -> Option<QueryRequest> {
        let token = self.next_skip_token.as_ref()?;
        let top = match request.top {
            Some(top) => {
                let remaining = top.saturating_sub(self.entries.len() as i64);
                if remaining <= 0 {
                    return None;
                }
                Some(remaining)
            }
            None => None,
        };
        Some(QueryRequest {
            skip_token: token.clone(),
            top,
            ..request.clone()
        })
    }
}

/// Row bindings of the enclosing lambdas, innermost first
#[derive(Clone, Copy, Default)]
struct Scope<'s> {
    frame: Option<&'s Frame<'s>>,
}

struct Frame<'s> {
    parameter: ParameterId,
    row: &'s Value,
    parent: Scope<'s>,
}

impl<'s> Scope<'s> {
    fn lookup(self, parameter: ParameterId) -> Option<&'s Value> {
        let mut current = self.frame;
        while let Some(frame) = current {
            if frame.parameter == parameter {
                return Some(frame.row);
            }
            current = frame.parent.frame;
        }
        None
    }
}

pub struct Executor<'a> {
    source: &'a dyn DataSource,
    constants: &'a ConstantBindings,
    null_ordering: NullOrdering,
}

impl<'a> Executor<'a> {
    pub fn new(source: &'a dyn DataSource, constants: &'a ConstantBindings) -> Self {
        Self {
            source,
            constants,
            null_ordering: NullOrdering::default(),
        }
    }

    pub fn with_null_ordering(mut self, null_ordering: NullOrdering) -> Self {
        self.null_ordering = null_ordering;
        self
    }

    pub fn execute(&self, query: &QueryExpr) -> ExecutionResult<QueryOutput> {
        self.run(query, Scope::default())
    }

    fn with_row<T>(
        &self,
        scope: Scope<'_>,
        parameter: &Parameter,
        row: &Value,
        f: impl FnOnce(Scope<'_>) -> T,
    ) -> T {
        let frame = Frame {
            parameter: parameter.id,
            row,
            parent: scope,
        };
        f(Scope {
            frame: Some(&frame),
        })
    }

    fn run(&self, query: &QueryExpr, scope: Scope<'_>) -> ExecutionResult<QueryOutput> {
        match &query.op {
            QueryOp::Count { source } => {
                let rows = self.rows(source, scope)?;
                Ok(QueryOutput::Count(rows.len() as i64))
            }
            _ => self.rows(query, scope).map(QueryOutput::Rows),
        }
    }

    fn bound(&self, placeholder: &Placeholder) -> ExecutionResult<usize> {
        let value = self.placeholder(placeholder)?;
        value
            .as_i64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| ExecutionError::InvalidBound(format!("{} = {}", placeholder.kind, value)))
    }

    fn placeholder(&self, placeholder: &Placeholder) -> ExecutionResult<Value> {
        self.constants.value(placeholder.id).cloned().ok_or_else(|| {
            ExecutionError::UnboundPlaceholder(format!("@{}[{}]", placeholder.kind, placeholder.path))
        })
    }

    // ==============================================================================
    // SEQUENCES
    // ==============================================================================

    fn rows(&self, query: &QueryExpr, scope: Scope<'_>) -> ExecutionResult<Vec<Value>> {
        match &query.op {
            QueryOp::Source { entity_set } => Ok(self.source.rows(entity_set)?.to_vec()),
            QueryOp::Collection { collection } => match self.evaluate(collection, scope)? {
                Value::List(items) => Ok(items),
                Value::Null => Ok(Vec::new()),
                record @ Value::Record(_) => Ok(vec![record]),
                other => Err(ExecutionError::InvalidRow(format!(
                    "{} is not a collection",
                    other
                ))),
            },
            QueryOp::Where { source, predicate } => {
                let rows = self.rows(source, scope)?;
                let mut kept = Vec::with_capacity(rows.len());
                for row in rows {
                    let verdict = self.with_row(scope, &predicate.parameter, &row, |inner| {
                        self.evaluate(&predicate.body, inner)
                    })?;
                    // Unknown discards the row
                    if verdict == Value::Boolean(true) {
                        kept.push(row);
                    }
                }
                Ok(kept)
            }
            QueryOp::Select { source, selector } => self
                .rows(source, scope)?
                .iter()
                .map(|row| {
                    self.with_row(scope, &selector.parameter, row, |inner| {
                        self.evaluate(&selector.body, inner)
                    })
                })
                .collect(),
            QueryOp::SelectMany { source, selector } => {
                let mut flattened = Vec::new();
                for row in self.rows(source, scope)? {
                    let nested = self.with_row(scope, &selector.parameter, &row, |inner| {
                        self.evaluate(&selector.body, inner)
                    })?;
                    match nested {
                        Value::List(items) => flattened.extend(items),
                        Value::Null => {}
                        other => flattened.push(other),
                    }
                }
                Ok(flattened)
            }
            QueryOp::Aggregate {
                source,
                parameter,
                keys,
                aggregates,
            } => {
                let shape = query.item_shape().ok_or_else(|| {
                    ExecutionError::InvalidRow("aggregate without a tuple shape".to_string())
                })?;
                let rows = self.rows(source, scope)?;
                self.aggregate(rows, parameter, keys, aggregates, shape, scope)
            }
            QueryOp::OrderBy {
                source,
                parameter,
                keys,
            } => {
                let rows = self.rows(source, scope)?;
                self.order(rows, parameter, keys, scope)
            }
            QueryOp::Skip { source, count } => {
                let count = self.bound(count)?;
                Ok(self.rows(source, scope)?.into_iter().skip(count).collect())
            }
            QueryOp::Take { source, count } => {
                let count = self.bound(count)?;
                let mut rows = self.rows(source, scope)?;
                rows.truncate(count);
                Ok(rows)
            }
            QueryOp::Count { source } => {
                let count = self.rows(source, scope)?.len() as i64;
                Ok(vec![Value::Int64(count)])
            }
        }
    }

    fn compare_keys(&self, left: &Value, right: &Value) -> Ordering {
        match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => match self.null_ordering {
                NullOrdering::Lowest => Ordering::Less,
                NullOrdering::Highest => Ordering::Greater,
            },
            (false, true) => match self.null_ordering {
                NullOrdering::Lowest => Ordering::Greater,
                NullOrdering::Highest => Ordering::Less,
            },
            (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
        }
    }

    fn order(
        &self,
        rows: Vec<Value>,
        parameter: &Parameter,
        keys: &[SortKey],
        scope: Scope<'_>,
    ) -> ExecutionResult<Vec<Value>> {
        let mut keyed = rows
            .into_iter()
            .map(|row| -> ExecutionResult<(Vec<Value>, Value)> {
                let values = self.with_row(scope, parameter, &row, |inner| {
                    keys.iter()
                        .map(|key| self.evaluate(&key.expr, inner))
                        .collect::<ExecutionResult<Vec<_>>>()
                })?;
                Ok((values, row))
            })
            .collect::<ExecutionResult<Vec<_>>>()?;

        keyed.sort_by(|(left, _), (right, _)| {
            for ((l, r), key) in left.iter().zip(right).zip(keys) {
                let ordering = match key.direction {
                    OrderDirection::Ascending => self.compare_keys(l, r),
                    OrderDirection::Descending => self.compare_keys(l, r).reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }

    fn aggregate(
        &self,
        rows: Vec<Value>,
        parameter: &Parameter,
        keys: &[Expr],
        aggregates: &[AggregateCall],
        shape: &Shape,
        scope: Scope<'_>,
    ) -> ExecutionResult<Vec<Value>> {
        let mut groups: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();
        for row in rows {
            let key = self.with_row(scope, parameter, &row, |inner| {
                keys.iter()
                    .map(|key| self.evaluate(key, inner))
                    .collect::<ExecutionResult<Vec<_>>>()
            })?;
            match groups.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, members)) => members.push(row),
                None => groups.push((key, vec![row])),
            }
        }

        // Aggregating without keys always yields one tuple
        if keys.is_empty() && groups.is_empty() {
            groups.push((Vec::new(), Vec::new()));
        }

        log::trace!("Aggregated into {} groups", groups.len());

        groups
            .into_iter()
            .map(|(mut values, members)| -> ExecutionResult<Value> {
                for aggregate in aggregates {
                    values.push(self.aggregate_value(aggregate, parameter, &members, scope)?);
                }
                let record: Record = shape
                    .members()
                    .iter()
                    .map(|m| m.name.clone())
                    .zip(values)
                    .collect();
                Ok(Value::Record(record))
            })
            .collect()
    }

    fn aggregate_value(
        &self,
        call: &AggregateCall,
        parameter: &Parameter,
        members: &[Value],
        scope: Scope<'_>,
    ) -> ExecutionResult<Value> {
        if call.method == AggregationMethod::Count {
            return Ok(Value::Int64(members.len() as i64));
        }
        let Some(argument) = &call.argument else {
            return Err(ExecutionError::InvalidAggregateInput {
                method: format!("{:?}", call.method),
                value: "no input".to_string(),
            });
        };

        let mut inputs = Vec::with_capacity(members.len());
        for row in members {
            let value = self.with_row(scope, parameter, row, |inner| self.evaluate(argument, inner))?;
            if !value.is_null() {
                inputs.push(value);
            }
        }

        let invalid = |value: &Value| ExecutionError::InvalidAggregateInput {
            method: format!("{:?}", call.method),
            value: value.to_string(),
        };

        match call.method {
            AggregationMethod::Count => Ok(Value::Int64(members.len() as i64)),
            AggregationMethod::CountDistinct => {
                let mut distinct: Vec<&Value> = Vec::new();
                for value in &inputs {
                    if !distinct.contains(&value) {
                        distinct.push(value);
                    }
                }
                Ok(Value::Int64(distinct.len() as i64))
            }
            AggregationMethod::Sum if call.ty.value_type() == Some(ValueType::Int64) => {
                let mut total: i64 = 0;
                for value in &inputs {
                    let n = value.as_i64().ok_or_else(|| invalid(value))?;
                    total = total
                        .checked_add(n)
                        .ok_or(ExecutionError::Scalar(ScalarError::Overflow("sum")))?;
                }
                Ok(Value::Int64(total))
            }
            AggregationMethod::Sum | AggregationMethod::Average => {
                let mut total = 0.0;
                for value in &inputs {
                    total += value.as_f64().ok_or_else(|| invalid(value))?;
                }
                match call.method {
                    AggregationMethod::Sum => Ok(Value::Double(total)),
                    _ if inputs.is_empty() => Ok(Value::Null),
                    _ => Ok(Value::Double(total / inputs.len() as f64)),
                }
            }
            AggregationMethod::Min | AggregationMethod::Max => {
                let mut best: Option<Value> = None;
                for value in inputs {
                    best = match best {
                        None => Some(value),
                        Some(current) => {
                            let ordering = value.compare(&current).ok_or_else(|| invalid(&value))?;
                            let replace = match call.method {
                                AggregationMethod::Min => ordering.is_lt(),
                                _ => ordering.is_gt(),
                            };
                            Some(if replace { value } else { current })
                        }
                    };
                }
                Ok(best.unwrap_or(Value::Null))
            }
        }
    }

    // ==============================================================================
    // SCALARS
    // ==============================================================================

    fn evaluate(&self, expr: &Expr, scope: Scope<'_>) -> ExecutionResult<Value> {
        match expr {
            Expr::Parameter(parameter) => scope
                .lookup(parameter.id)
                .cloned()
                .ok_or(ExecutionError::UnboundParameter(parameter.id.0)),
            Expr::Member { target, name, .. } => {
                // Direct member of a bound row: avoid cloning the whole row
                if let Expr::Parameter(parameter) = target.as_ref() {
                    if let Some(row) = scope.lookup(parameter.id) {
                        return Self::member(row, name);
                    }
                }
                let target = self.evaluate(target, scope)?;
                Self::member(&target, name)
            }
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Placeholder(placeholder) => self.placeholder(placeholder),
            Expr::Binary {
                op, left, right, ..
            } => {
                let left = self.evaluate(left, scope)?;
                let right = self.evaluate(right, scope)?;
                Ok(eval::binary(*op, &left, &right)?)
            }
            Expr::Unary { op, operand, .. } => {
                let operand = self.evaluate(operand, scope)?;
                Ok(eval::unary(*op, &operand)?)
            }
            Expr::Call {
                function,
                arguments,
                ..
            } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument, scope))
                    .collect::<ExecutionResult<Vec<_>>>()?;
                function
                    .evaluate(&arguments)
                    .map_err(|e| ExecutionError::Scalar(e.into()))
            }
            Expr::Convert { operand, to, .. } => {
                let operand = self.evaluate(operand, scope)?;
                Ok(eval::convert(&operand, *to)?)
            }
            Expr::Record { shape, fields } => {
                let mut record = Record::new();
                for (member, field) in shape.members().iter().zip(fields) {
                    record.insert(member.name.clone(), self.evaluate(field, scope)?);
                }
                Ok(Value::Record(record))
            }
            Expr::Query(query) => match self.run(query, scope)? {
                QueryOutput::Rows(rows) => Ok(Value::List(rows)),
                QueryOutput::Count(count) => Ok(Value::Int64(count)),
            },
            Expr::Single(query) => Ok(self
                .rows(query, scope)?
                .into_iter()
                .next()
                .unwrap_or(Value::Null)),
        }
    }

    fn member(row: &Value, name: &str) -> ExecutionResult<Value> {
        match row {
            Value::Record(record) => Ok(record.get(name).cloned().unwrap_or(Value::Null)),
            Value::Null => Ok(Value::Null),
            other => Err(ExecutionError::InvalidRow(format!(
                "{} has no member '{}'",
                other, name
            ))),
        }
    }
}

/// Execute a translated request and materialize its entries
///
/// With server paging, a full page also yields the skip-token of its last
/// row. The token alone does not carry `$top` across pages; build the
/// follow-up with [`QueryResult::next_request`].
pub fn materialize(
    translated: &TranslatedQuery,
    source: &dyn DataSource,
    options: &TranslationOptions,
) -> ExecutionResult<QueryResult> {
    let executor =
        Executor::new(source, &translated.constants).with_null_ordering(options.null_ordering);

    match executor.execute(&translated.expression)? {
        QueryOutput::Count(count) => Ok(QueryResult {
            entries: Vec::new(),
            count: Some(count),
            next_skip_token: None,
        }),
        QueryOutput::Rows(rows) => {
            let factory = &translated.entry_factory;
            let full_page = options.is_paging() && rows.len() as i64 >= options.page_size;
            let next_skip_token = match rows.last() {
                Some(last) if full_page && !factory.skip_token_keys().is_empty() => {
                    Some(factory.skip_token(last))
                }
                _ => None,
            };
            log::debug!(
                "Materialized {} entries (next page: {})",
                rows.len(),
                next_skip_token.is_some()
            );
            Ok(QueryResult {
                entries: rows.iter().map(|row| factory.create_entry(row)).collect(),
                count: None,
                next_skip_token,
            })
        }
    }
}
