// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Operator resolution
//!
//! Instantiates a generic sequence operator for the concrete shapes it is
//! applied to and builds the query node carrying that signature.

use super::error::{Clause, TranslationError, TranslationResult};
use crate::ast::ClausePath;
use crate::expr::{
    AggregateCall, Expr, ExprType, ItemType, Lambda, OperatorSignature, Parameter, Placeholder,
    QueryExpr, QueryOp, QueryOperator, SortKey,
};
use crate::model::Shape;
use crate::types::ValueType;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct OperatorResolver<'a> {
    clause: Clause,
    path: &'a ClausePath,
}

impl<'a> OperatorResolver<'a> {
    pub fn new(clause: Clause, path: &'a ClausePath) -> Self {
        Self { clause, path }
    }

    fn unsupported(&self, operator: QueryOperator, shape: &str, reason: &str) -> TranslationError {
        TranslationError::UnsupportedShape {
            clause: self.clause,
            path: self.path.clone(),
            operator,
            shape: shape.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Resolve the signature of `operator` applied to `input`, with the
    /// static types of its lambda results (or sort keys) as `arguments`
    pub fn resolve(
        &self,
        operator: QueryOperator,
        input: &ItemType,
        arguments: &[ExprType],
    ) -> TranslationResult<OperatorSignature> {
        let shape = match input {
            ItemType::Rows(shape) => shape.clone(),
            ItemType::Scalar(ty) => {
                return Err(self.unsupported(
                    operator,
                    &ty.to_string(),
                    "operator requires a row sequence",
                ))
            }
        };

        let output = match operator {
            QueryOperator::Source | QueryOperator::Collection => {
                return Err(self.unsupported(operator, shape.name(), "not applicable to a sequence"))
            }
            QueryOperator::Where => match arguments {
                [ty] if ty.is_boolean() => ItemType::Rows(shape.clone()),
                [ty] => {
                    return Err(TranslationError::TypeMismatch {
                        clause: self.clause,
                        path: self.path.clone(),
                        message: format!("predicate must be Boolean, found {}", ty),
                    })
                }
                _ => return Err(self.unsupported(operator, shape.name(), "expects one predicate")),
            },
            QueryOperator::Select | QueryOperator::Aggregate => match arguments {
                [ExprType::Record(target)] => ItemType::Rows(target.clone()),
                _ => {
                    return Err(self.unsupported(
                        operator,
                        shape.name(),
                        "selector must produce a record",
                    ))
                }
            },
            QueryOperator::SelectMany => match arguments {
                [ExprType::Collection(target)] => ItemType::Rows(target.clone()),
                _ => {
                    return Err(self.unsupported(
                        operator,
                        shape.name(),
                        "selector must produce a collection",
                    ))
                }
            },
            QueryOperator::OrderBy => {
                if arguments.is_empty() {
                    return Err(self.unsupported(operator, shape.name(), "no ordering keys"));
                }
                if let Some(key) = arguments
                    .iter()
                    .find(|ty| !matches!(ty, ExprType::Scalar { .. } | ExprType::Null))
                {
                    return Err(self.unsupported(
                        operator,
                        shape.name(),
                        &format!("{} is not comparable", key),
                    ));
                }
                ItemType::Rows(shape.clone())
            }
            QueryOperator::Skip | QueryOperator::Take => ItemType::Rows(shape.clone()),
            QueryOperator::Count => ItemType::Scalar(ValueType::Int64),
        };

        Ok(OperatorSignature {
            operator,
            input: Some(shape),
            output,
        })
    }

    /// Rows of a named entity set
    pub fn source(entity_set: &str, shape: Arc<Shape>) -> QueryExpr {
        QueryExpr::new(
            QueryOp::Source {
                entity_set: entity_set.to_string(),
            },
            OperatorSignature {
                operator: QueryOperator::Source,
                input: None,
                output: ItemType::Rows(shape),
            },
        )
    }

    /// Rows of a collection-valued expression; a record-valued expression
    /// yields zero or one row
    pub fn collection(&self, collection: Expr) -> TranslationResult<QueryExpr> {
        let shape = match collection.ty() {
            ExprType::Collection(shape) | ExprType::Record(shape) => shape,
            other => {
                return Err(self.unsupported(
                    QueryOperator::Collection,
                    &other.to_string(),
                    "not a navigation or collection",
                ))
            }
        };
        Ok(QueryExpr::new(
            QueryOp::Collection { collection },
            OperatorSignature {
                operator: QueryOperator::Collection,
                input: None,
                output: ItemType::Rows(shape),
            },
        ))
    }

    pub fn filter(&self, source: QueryExpr, predicate: Lambda) -> TranslationResult<QueryExpr> {
        let signature = self.resolve(
            QueryOperator::Where,
            source.item_type(),
            &[predicate.body.ty()],
        )?;
        Ok(QueryExpr::new(
            QueryOp::Where {
                source: Box::new(source),
                predicate,
            },
            signature,
        ))
    }

    pub fn select(&self, source: QueryExpr, selector: Lambda) -> TranslationResult<QueryExpr> {
        let signature = self.resolve(
            QueryOperator::Select,
            source.item_type(),
            &[selector.body.ty()],
        )?;
        Ok(QueryExpr::new(
            QueryOp::Select {
                source: Box::new(source),
                selector,
            },
            signature,
        ))
    }

    pub fn select_many(&self, source: QueryExpr, selector: Lambda) -> TranslationResult<QueryExpr> {
        let signature = self.resolve(
            QueryOperator::SelectMany,
            source.item_type(),
            &[selector.body.ty()],
        )?;
        Ok(QueryExpr::new(
            QueryOp::SelectMany {
                source: Box::new(source),
                selector,
            },
            signature,
        ))
    }

    pub fn aggregate(
        &self,
        source: QueryExpr,
        parameter: Parameter,
        keys: Vec<Expr>,
        aggregates: Vec<AggregateCall>,
        tuple: Arc<Shape>,
    ) -> TranslationResult<QueryExpr> {
        let signature = self.resolve(
            QueryOperator::Aggregate,
            source.item_type(),
            &[ExprType::Record(tuple)],
        )?;
        Ok(QueryExpr::new(
            QueryOp::Aggregate {
                source: Box::new(source),
                parameter,
                keys,
                aggregates,
            },
            signature,
        ))
    }

    pub fn order_by(
        &self,
        source: QueryExpr,
        parameter: Parameter,
        keys: Vec<SortKey>,
    ) -> TranslationResult<QueryExpr> {
        let key_types: Vec<ExprType> = keys.iter().map(|key| key.expr.ty()).collect();
        let signature = self.resolve(QueryOperator::OrderBy, source.item_type(), &key_types)?;
        Ok(QueryExpr::new(
            QueryOp::OrderBy {
                source: Box::new(source),
                parameter,
                keys,
            },
            signature,
        ))
    }

    pub fn skip(&self, source: QueryExpr, count: Placeholder) -> TranslationResult<QueryExpr> {
        let signature = self.resolve(QueryOperator::Skip, source.item_type(), &[])?;
        Ok(QueryExpr::new(
            QueryOp::Skip {
                source: Box::new(source),
                count,
            },
            signature,
        ))
    }

    pub fn take(&self, source: QueryExpr, count: Placeholder) -> TranslationResult<QueryExpr> {
        let signature = self.resolve(QueryOperator::Take, source.item_type(), &[])?;
        Ok(QueryExpr::new(
            QueryOp::Take {
                source: Box::new(source),
                count,
            },
            signature,
        ))
    }

    pub fn count(&self, source: QueryExpr) -> TranslationResult<QueryExpr> {
        let signature = self.resolve(QueryOperator::Count, source.item_type(), &[])?;
        Ok(QueryExpr::new(
            QueryOp::Count {
                source: Box::new(source),
            },
            signature,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Member, ShapeKind};
    use crate::plan::error::ErrorKind;

    fn rows() -> ItemType {
        ItemType::Rows(Arc::new(Shape::new(
            "Order",
            ShapeKind::Entity,
            vec![Member::scalar("Id", ValueType::Int32, false)],
            vec!["Id".to_string()],
        )))
    }

    #[test]
    fn test_count_yields_scalar() {
        let path = ClausePath::root("Orders");
        let resolver = OperatorResolver::new(Clause::Count, &path);
        let signature = resolver.resolve(QueryOperator::Count, &rows(), &[]).unwrap();
        assert_eq!(signature.output, ItemType::Scalar(ValueType::Int64));
    }

    #[test]
    fn test_operators_over_scalar_rejected() {
        let path = ClausePath::root("Orders");
        let resolver = OperatorResolver::new(Clause::Top, &path);
        let error = resolver
            .resolve(
                QueryOperator::Take,
                &ItemType::Scalar(ValueType::Int64),
                &[],
            )
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedShape);
    }

    #[test]
    fn test_non_boolean_predicate_is_type_mismatch() {
        let path = ClausePath::root("Orders");
        let resolver = OperatorResolver::new(Clause::Filter, &path);
        let error = resolver
            .resolve(
                QueryOperator::Where,
                &rows(),
                &[ExprType::scalar(ValueType::Int32, false)],
            )
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_order_by_record_key_rejected() {
        let path = ClausePath::root("Orders");
        let resolver = OperatorResolver::new(Clause::OrderBy, &path);
        let shape = rows().shape().cloned().unwrap();
        let error = resolver
            .resolve(QueryOperator::OrderBy, &rows(), &[ExprType::Record(shape)])
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedShape);
    }
}
