// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Stage builders
//!
//! Each stage consumes the current expression, its clause and the active
//! translator context, and returns the next expression together with the
//! context following stages must use. A stage with nothing to do returns
//! its input unchanged.

pub mod aggregation;
pub mod count;
pub mod filter;
pub mod navigation;
pub mod order_by;
pub mod paging;
pub mod select;
pub mod skip_token;

use super::context::TranslatorContext;
use super::entry_factory::EntryFactory;
use crate::expr::QueryExpr;

/// Result of applying one stage
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub expression: QueryExpr,
    pub context: TranslatorContext,
    /// Set by shape-changing stages that define the output fields
    pub entry_factory: Option<EntryFactory>,
}

impl StageOutput {
    /// Same shape, same context
    pub fn passthrough(expression: QueryExpr, context: &TranslatorContext) -> Self {
        Self {
            expression,
            context: context.clone(),
            entry_factory: None,
        }
    }

    pub fn rebound(
        expression: QueryExpr,
        context: TranslatorContext,
        entry_factory: Option<EntryFactory>,
    ) -> Self {
        Self {
            expression,
            context,
            entry_factory,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::ast::ClausePath;
    use crate::expr::QueryExpr;
    use crate::model::{EntityTypeBuilder, MetadataProvider, Model, Multiplicity};
    use crate::plan::context::TranslatorContext;
    use crate::plan::resolver::OperatorResolver;
    use crate::types::ValueType;
    use std::sync::Arc;

    pub fn model() -> Arc<dyn MetadataProvider> {
        let model = Model::builder()
            .entity_type(
                EntityTypeBuilder::new("Order")
                    .key("Id")
                    .property("Id", ValueType::Int32, false)
                    .property("Name", ValueType::String, false)
                    .property("Price", ValueType::Double, true)
                    .property("CustomerId", ValueType::Int32, false)
                    .navigation("Customer", "Customer", Multiplicity::One)
                    .navigation("Items", "OrderItem", Multiplicity::Many),
            )
            .entity_type(
                EntityTypeBuilder::new("Customer")
                    .key("Id")
                    .property("Id", ValueType::Int32, false)
                    .property("Name", ValueType::String, false)
                    .navigation("Orders", "Order", Multiplicity::Many),
            )
            .entity_type(
                EntityTypeBuilder::new("OrderItem")
                    .key("Id")
                    .property("Id", ValueType::Int32, false)
                    .property("OrderId", ValueType::Int32, false)
                    .property("Quantity", ValueType::Int32, false),
            )
            .entity_set("Orders", "Order")
            .entity_set("Customers", "Customer")
            .build()
            .expect("fixture model is valid");
        Arc::new(model)
    }

    /// Root context and source over `Orders`
    pub fn orders() -> (QueryExpr, TranslatorContext) {
        let model = model();
        let shape = model.entity_shape("Order").expect("Order is declared");
        let source = OperatorResolver::source("Orders", shape.clone());
        let context = TranslatorContext::new(model, shape, ClausePath::root("Orders"));
        (source, context)
    }
}
