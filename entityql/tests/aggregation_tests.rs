//! Group-by and aggregate requests over the order model

#[path = "testutils/mod.rs"]
mod testutils;

use entityql::ast::{
    AggregateExpression, AggregationMethod, ApplyClause, FilterClause, GroupByKey, OrderByClause,
    OrderByItem, QueryNode, SelectExpandClause,
};
use entityql::plan::{Clause, ErrorKind, PipelineStage};
use entityql::{QueryRequest, Value};
use testutils::order_fixture::{column, OrderFixture};

fn grouped(group_by: &[&str], aggregates: Vec<AggregateExpression>) -> QueryRequest {
    let mut request = QueryRequest::new("Orders");
    request.apply = Some(ApplyClause {
        group_by: group_by.iter().map(|key| GroupByKey::new(key)).collect(),
        aggregates,
    });
    request
}

fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

#[test]
fn test_alias_shadows_entity_property() {
    let fixture = OrderFixture::new();
    // "Total" is also a property of Order; after grouping it names the sum
    let mut request = grouped(
        &["Status"],
        vec![AggregateExpression::new(AggregationMethod::Sum, "Total", "Total")],
    );
    request.order_by = Some(OrderByClause::new(vec![OrderByItem::desc("Total")]));

    let translated = fixture.translate(&request).unwrap();
    assert_eq!(translated.entry_factory.field_names(), vec!["Status", "Total"]);
    assert_eq!(translated.entry_factory.entity_set(), None);

    let result = fixture.query(&request);
    assert_eq!(column(&result, "Status"), strings(&["Open", "Shipped", "Cancelled"]));
    assert_eq!(
        column(&result, "Total"),
        vec![Value::Double(500.0), Value::Double(125.5), Value::Double(15.0)]
    );
}

#[test]
fn test_order_by_aggregate_alias() {
    let fixture = OrderFixture::new();
    let mut request = grouped(
        &["Status"],
        vec![AggregateExpression::new(AggregationMethod::Sum, "Total", "TotalY")],
    );
    request.order_by = Some(OrderByClause::new(vec![OrderByItem::asc("TotalY")]));

    let result = fixture.query(&request);
    assert_eq!(column(&result, "Status"), strings(&["Cancelled", "Shipped", "Open"]));
}

#[test]
fn test_groups_in_first_appearance_order() {
    let fixture = OrderFixture::new();
    let request = grouped(
        &["CustomerId"],
        vec![
            AggregateExpression::count("Orders"),
            AggregateExpression::new(AggregationMethod::Average, "Total", "AverageTotal"),
            AggregateExpression::new(AggregationMethod::Max, "Priority", "MaxPriority"),
        ],
    );

    let result = fixture.query(&request);
    assert_eq!(
        column(&result, "CustomerId"),
        vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)]
    );
    assert_eq!(
        column(&result, "Orders"),
        vec![Value::Int64(3), Value::Int64(3), Value::Int64(2)]
    );
    // Null totals are left out of the average
    assert_eq!(result.entries[1].value("AverageTotal"), Some(&Value::Double(45.5)));
    assert_eq!(result.entries[2].value("AverageTotal"), Some(&Value::Double(157.5)));
    assert_eq!(
        column(&result, "MaxPriority"),
        vec![Value::Int32(3), Value::Int32(3), Value::Int32(2)]
    );
}

#[test]
fn test_aggregate_without_keys_yields_one_row() {
    let fixture = OrderFixture::new();
    let mut request = grouped(
        &[],
        vec![
            AggregateExpression::new(AggregationMethod::Sum, "Priority", "PrioritySum"),
            AggregateExpression::count("Orders"),
        ],
    );
    request.filter = Some(FilterClause::new(QueryNode::binary(
        entityql::ast::BinaryOperator::NotEqual,
        QueryNode::property("Status"),
        QueryNode::literal("Cancelled"),
    )));

    let result = fixture.query(&request);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].value("PrioritySum"), Some(&Value::Int64(13)));
    assert_eq!(result.entries[0].value("Orders"), Some(&Value::Int64(7)));
}

#[test]
fn test_select_after_aggregation_owns_the_factory() {
    let fixture = OrderFixture::new();
    let mut request = grouped(&["Status"], vec![AggregateExpression::count("Orders")]);
    request.select_expand = Some(SelectExpandClause::properties(&["Orders"]));

    let translated = fixture.translate(&request).unwrap();
    assert_eq!(translated.entry_factory.field_names(), vec!["Orders"]);
    assert_eq!(
        translated.applied_stages(),
        vec![PipelineStage::Aggregation, PipelineStage::Select]
    );

    let result = fixture.query(&request);
    assert_eq!(
        column(&result, "Orders"),
        vec![Value::Int64(4), Value::Int64(3), Value::Int64(1)]
    );
}

#[test]
fn test_pre_aggregation_names_no_longer_resolve() {
    let fixture = OrderFixture::new();
    let mut request = grouped(&["Status"], vec![AggregateExpression::count("Orders")]);
    request.order_by = Some(OrderByClause::new(vec![OrderByItem::asc("Priority")]));

    let error = fixture.translate(&request).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnresolvedName);
    assert_eq!(error.clause(), Clause::OrderBy);
}

#[test]
fn test_invalid_apply_clauses() {
    let fixture = OrderFixture::new();

    let error = fixture
        .translate(&grouped(
            &["Status"],
            vec![AggregateExpression::new(AggregationMethod::Sum, "Status", "Bad")],
        ))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::TypeMismatch);
    assert_eq!(error.clause(), Clause::Apply);

    let error = fixture
        .translate(&grouped(
            &["Status"],
            vec![AggregateExpression::count("Status")],
        ))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnsupportedShape);

    let error = fixture
        .translate(&grouped(&["Region"], vec![]))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnresolvedName);
}
