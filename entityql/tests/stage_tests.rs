//! Stage builder properties
//!
//! Every stage is exercised directly through its public `apply` function
//! over the order model: absent clauses leave the expression untouched,
//! bound literals keep their placeholder identity across shape changes and
//! the select stage rebinds name resolution to the projected shape.

#[path = "testutils/mod.rs"]
mod testutils;

use entityql::ast::{OrderByItem, QueryNode, SelectExpandClause, SkipTokenNameValue};
use entityql::expr::{BoundKind, QueryExpr, QueryOperator};
use entityql::model::MetadataProvider;
use entityql::plan::stages::{
    aggregation, count, filter, navigation, order_by, paging, select, skip_token,
};
use entityql::plan::{
    Clause, ErrorKind, NullOrdering, OperatorResolver, TranslationOptions, TranslatorContext,
};
use entityql::{ClausePath, Value, ValueType};
use std::sync::Arc;
use testutils::order_fixture;

fn orders() -> (QueryExpr, TranslatorContext) {
    let model: Arc<dyn MetadataProvider> = Arc::new(order_fixture::model());
    let shape = model.entity_shape("Order").expect("Order is declared");
    let source = OperatorResolver::source("Orders", shape.clone());
    let context = TranslatorContext::new(model, shape, ClausePath::root("Orders"));
    (source, context)
}

#[test]
fn test_absent_clauses_leave_expression_unchanged() {
    order_fixture::init_logging();
    let (source, context) = orders();
    let options = TranslationOptions::default();

    let outputs = vec![
        navigation::apply(source.clone(), &[], &context).unwrap(),
        filter::apply(source.clone(), None, &context).unwrap(),
        aggregation::apply(source.clone(), None, &context).unwrap(),
        select::apply(
            source.clone(),
            None,
            &[],
            Some("Orders".to_string()),
            &context,
            &options,
        )
        .unwrap(),
        order_by::apply(source.clone(), &[], &context).unwrap(),
        skip_token::apply(source.clone(), &[], &[], &context, NullOrdering::Lowest).unwrap(),
        paging::skip(source.clone(), None, &context).unwrap(),
        paging::take(source.clone(), None, &context).unwrap(),
        count::apply(source.clone(), false, &context).unwrap(),
    ];

    for output in outputs {
        assert_eq!(output.expression, source);
        assert_eq!(output.context.shape().name(), "Order");
        assert!(output.entry_factory.is_none());
    }
    assert!(context.constants().is_empty());
}

#[test]
fn test_bound_registration_is_idempotent_per_path() {
    let (_, context) = orders();

    let first = context.register_bound(BoundKind::Top, ValueType::Int64, Value::Int64(10));
    let second = context.register_bound(BoundKind::Top, ValueType::Int64, Value::Int64(10));
    assert_eq!(first, second);

    // Identity survives a shape change in the same run
    let customer = context
        .model()
        .entity_shape("Customer")
        .expect("Customer is declared");
    let rebound = context.rebind(customer);
    let third = rebound.register_bound(BoundKind::Top, ValueType::Int64, Value::Int64(10));
    assert_eq!(first.id, third.id);

    let skip = rebound.register_bound(BoundKind::Skip, ValueType::Int64, Value::Int64(10));
    assert_ne!(first.id, skip.id);
    assert_eq!(context.constants().len(), 2);
}

#[test]
fn test_nested_paths_get_their_own_placeholders() {
    let (_, context) = orders();
    let items = context
        .model()
        .entity_shape("OrderItem")
        .expect("OrderItem is declared");

    let outer = context.register_bound(BoundKind::Top, ValueType::Int64, Value::Int64(5));
    let nested = context.nested(items, "Items");
    let inner = nested.register_bound(BoundKind::Top, ValueType::Int64, Value::Int64(5));

    assert_ne!(outer.id, inner.id);
    assert_eq!(inner.path.to_string(), "Orders/Items");
    // Both live in the one constant map of the run
    assert_eq!(context.constants().len(), 2);
}

#[test]
fn test_negative_bounds_rejected() {
    let (source, context) = orders();
    let error = paging::skip(source.clone(), Some(-1), &context).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidBound);
    assert_eq!(error.clause(), Clause::Skip);

    let error = paging::take(source, Some(-3), &context).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidBound);
    assert_eq!(error.clause(), Clause::Top);
}

#[test]
fn test_select_scopes_later_name_resolution() {
    let (source, context) = orders();
    let clause = SelectExpandClause::properties(&["Id", "Status"]);

    let output = select::apply(
        source,
        Some(&clause),
        &[],
        Some("Orders".to_string()),
        &context,
        &TranslationOptions::default(),
    )
    .unwrap();

    let translator = output.context.translator(Clause::OrderBy);
    assert!(translator.translate(&QueryNode::property("Status")).is_ok());

    let error = translator
        .translate(&QueryNode::property("Total"))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnresolvedName);
    assert_eq!(error.clause(), Clause::OrderBy);

    // The pre-select context still sees the entity
    assert!(context
        .translator(Clause::Filter)
        .translate(&QueryNode::property("Total"))
        .is_ok());
}

#[test]
fn test_skip_token_registers_typed_cursor_values() {
    let (source, context) = orders();
    let ordering = vec![
        OrderByItem::asc("Priority"),
        OrderByItem::desc("Total"),
        OrderByItem::asc("Id"),
    ];
    let cursor = vec![
        SkipTokenNameValue::new("Priority", 5),
        SkipTokenNameValue::new("Total", 10.0),
        SkipTokenNameValue::new("Id", 4),
    ];

    let output =
        skip_token::apply(source, &cursor, &ordering, &context, NullOrdering::Lowest).unwrap();

    assert_eq!(
        output.expression.operators(),
        vec![QueryOperator::Source, QueryOperator::Where]
    );
    let constants = context.constants();
    let path = ClausePath::root("Orders");
    assert_eq!(
        constants.value_at(BoundKind::SkipToken(0), &path),
        Some(&Value::Int32(5))
    );
    assert_eq!(
        constants.value_at(BoundKind::SkipToken(1), &path),
        Some(&Value::Double(10.0))
    );
}

#[test]
fn test_skip_token_requires_total_ordering() {
    let (source, context) = orders();
    let error = skip_token::apply(
        source,
        &[SkipTokenNameValue::new("Priority", 1)],
        &[OrderByItem::asc("Priority")],
        &context,
        NullOrdering::Lowest,
    )
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidBound);
    assert_eq!(error.clause(), Clause::SkipToken);
}
