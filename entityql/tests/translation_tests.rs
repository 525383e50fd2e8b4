//! End-to-end translation and execution over the order model
//!
//! Covers navigation flattening, filter semantics (three-valued logic,
//! functions, promotion), the default entry factory and error reporting.

#[path = "testutils/mod.rs"]
mod testutils;

use entityql::ast::{
    BinaryOperator, FilterClause, NavigationSegment, PropertyPath, QueryNode, UnaryOperator,
};
use entityql::plan::{Clause, ErrorKind, FieldAccessor, PipelineStage};
use entityql::{QueryRequest, TranslationOptions, Value};
use testutils::order_fixture::{column, ints, OrderFixture};

fn filtered(expression: QueryNode) -> QueryRequest {
    let mut request = QueryRequest::new("Orders");
    request.filter = Some(FilterClause::new(expression));
    request
}

fn property(name: &str) -> QueryNode {
    QueryNode::property(name)
}

#[test]
fn test_navigation_filters_expanded_rows() {
    let fixture = OrderFixture::new();
    let mut request = QueryRequest::new("Orders");
    request.navigation = vec![
        NavigationSegment::root().with_filter(QueryNode::less_than(
            property("Id"),
            QueryNode::literal(3),
        )),
        NavigationSegment::property("Items").with_filter(QueryNode::greater_than(
            property("Quantity"),
            QueryNode::literal(1),
        )),
    ];

    // Two orders with three items each, two of which match per order
    let result = fixture.query(&request);
    assert_eq!(result.entries.len(), 4);
    assert_eq!(column(&result, "Id"), ints(&[12, 13, 22, 23]));

    request.count = true;
    let counted = fixture.query(&request);
    assert_eq!(counted.count, Some(4));
}

#[test]
fn test_navigation_entries_use_target_entity_set() {
    let fixture = OrderFixture::new();
    let mut request = QueryRequest::new("Customers");
    request.navigation = vec![NavigationSegment::property("Orders").with_filter(
        QueryNode::equal(property("Status"), QueryNode::literal("Open")),
    )];

    let translated = fixture.translate(&request).unwrap();
    assert_eq!(translated.entry_factory.entity_set(), Some("Orders"));
    assert_eq!(translated.applied_stages(), vec![PipelineStage::Navigation]);

    let result = fixture.query(&request);
    assert_eq!(column(&result, "Id"), ints(&[1, 7, 3, 5]));
}

#[test]
fn test_single_valued_navigation_projects() {
    let fixture = OrderFixture::new();
    let mut request = QueryRequest::new("Orders");
    request.navigation = vec![
        NavigationSegment::root().with_filter(QueryNode::equal(property("Id"), QueryNode::literal(4))),
        NavigationSegment::property("Customer"),
    ];

    let result = fixture.query(&request);
    assert_eq!(result.entries.len(), 1);
    let customer = &result.entries[0];
    assert_eq!(customer.field_names(), vec!["Id", "Name", "City"]);
    assert_eq!(customer.value("Name"), Some(&Value::from("Bob")));
    assert_eq!(customer.value("City"), Some(&Value::Null));
}

#[test]
fn test_navigation_errors() {
    let fixture = OrderFixture::new();

    let mut request = QueryRequest::new("Orders");
    request.navigation = vec![NavigationSegment::property("Lines")];
    let error = fixture.translate(&request).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnresolvedName);
    assert_eq!(error.clause(), Clause::Navigation);

    request.navigation = vec![NavigationSegment::property("Status")];
    let error = fixture.translate(&request).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnsupportedShape);
}

#[test]
fn test_null_comparisons_discard_rows() {
    let fixture = OrderFixture::new();

    let over = QueryNode::greater_than(property("Total"), QueryNode::literal(50.0));
    let result = fixture.query(&filtered(over.clone()));
    assert_eq!(column(&result, "Id"), ints(&[1, 2, 5, 7]));

    // not(unknown) is still unknown
    let result = fixture.query(&filtered(QueryNode::unary(UnaryOperator::Not, over)));
    assert_eq!(column(&result, "Id"), ints(&[4, 6]));
}

#[test]
fn test_eq_null_tests_for_null() {
    let fixture = OrderFixture::new();

    let result = fixture.query(&filtered(QueryNode::equal(property("Total"), QueryNode::null())));
    assert_eq!(column(&result, "Id"), ints(&[3, 8]));

    let result = fixture.query(&filtered(QueryNode::binary(
        BinaryOperator::NotEqual,
        QueryNode::null(),
        property("Total"),
    )));
    assert_eq!(column(&result, "Id"), ints(&[1, 2, 4, 5, 6, 7]));
}

#[test]
fn test_kleene_or_keeps_true_disjunct() {
    let fixture = OrderFixture::new();
    // unknown || true is true
    let result = fixture.query(&filtered(QueryNode::or(
        QueryNode::greater_than(property("Total"), QueryNode::literal(100.0)),
        QueryNode::equal(property("CustomerId"), QueryNode::literal(2)),
    )));
    assert_eq!(column(&result, "Id"), ints(&[1, 3, 4, 5, 8]));
}

#[test]
fn test_mixed_numeric_operands_are_promoted() {
    let fixture = OrderFixture::new();
    let result = fixture.query(&filtered(QueryNode::greater_than(
        property("Total"),
        QueryNode::literal(100),
    )));
    assert_eq!(column(&result, "Id"), ints(&[1, 5]));

    let result = fixture.query(&filtered(QueryNode::less_than(
        QueryNode::binary(
            BinaryOperator::Multiply,
            property("Priority"),
            QueryNode::literal(40.0),
        ),
        property("Total"),
    )));
    assert_eq!(column(&result, "Id"), ints(&[1, 2, 5]));
}

#[test]
fn test_functions_and_navigation_paths() {
    let fixture = OrderFixture::new();

    let result = fixture.query(&filtered(QueryNode::call(
        "startswith",
        vec![property("Status"), QueryNode::literal("Ship")],
    )));
    assert_eq!(column(&result, "Id"), ints(&[2, 4, 8]));

    let result = fixture.query(&filtered(QueryNode::equal(
        property("Customer/Name"),
        QueryNode::literal("Alice"),
    )));
    assert_eq!(column(&result, "Id"), ints(&[1, 2, 7]));

    let result = fixture.query(&filtered(QueryNode::greater_than(
        QueryNode::CollectionCount(PropertyPath::new("Items")),
        QueryNode::literal(2),
    )));
    assert_eq!(column(&result, "Id"), ints(&[1, 2]));
}

#[test]
fn test_filter_errors_name_their_clause() {
    let fixture = OrderFixture::new();

    let error = fixture
        .translate(&filtered(QueryNode::equal(
            property("Discount"),
            QueryNode::literal(1),
        )))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnresolvedName);
    assert_eq!(error.clause(), Clause::Filter);
    assert_eq!(error.path().to_string(), "Orders");

    let error = fixture
        .translate(&filtered(QueryNode::call("soundex", vec![property("Status")])))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnsupportedFunction);

    let error = fixture
        .translate(&filtered(QueryNode::greater_than(
            property("Status"),
            QueryNode::literal(5),
        )))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::TypeMismatch);

    let error = fixture.translate(&QueryRequest::new("Invoices")).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnresolvedName);
}

#[test]
fn test_default_entry_factory_reads_declared_properties() {
    let fixture = OrderFixture::new();
    let translated = fixture.translate(&QueryRequest::new("Orders")).unwrap();

    let factory = &translated.entry_factory;
    assert_eq!(
        factory.field_names(),
        vec!["Id", "CustomerId", "Status", "Total", "Priority"]
    );
    assert!(factory
        .fields()
        .iter()
        .all(|f| f.accessor == FieldAccessor::Member(f.name.clone())));
    assert_eq!(factory.entity_set(), Some("Orders"));

    let result = fixture.query(&QueryRequest::new("Orders"));
    assert_eq!(result.entries.len(), 8);
    assert_eq!(result.entries[2].value("Total"), Some(&Value::Null));
    // Navigation members are not output fields
    assert!(result.entries[0].get("Items").is_none());
}

#[test]
fn test_request_loaded_from_json() {
    let fixture = OrderFixture::new();
    let request = QueryRequest::from_json(
        r#"{
            "entity_set": "Orders",
            "filter": { "expression": { "Binary": {
                "operator": "Equal",
                "left": { "Property": { "segments": ["Status"] } },
                "right": { "Literal": { "String": "Shipped" } }
            } } },
            "order_by": { "items": [
                { "expression": { "Property": { "segments": ["Total"] } }, "direction": "Descending" }
            ] },
            "skip": 1
        }"#,
    )
    .unwrap();

    let result = fixture.query(&request);
    // Shipped orders by Total desc with nulls lowest: 2, 4, 8
    assert_eq!(column(&result, "Id"), ints(&[4, 8]));
}

#[test]
fn test_count_ignores_paging() {
    let fixture = OrderFixture::with_options(
        TranslationOptions::default().with_page_size(2),
    );
    let mut request = QueryRequest::new("Orders");
    request.count = true;
    let result = fixture.query(&request);
    assert_eq!(result.count, Some(8));
    assert!(result.entries.is_empty());
    assert!(result.next_skip_token.is_none());
}
