//! Order-management fixture for EntityQL integration tests
//!
//! Customers place orders, orders hold items, items may belong to a
//! category. Navigation properties are stored inline on each row the way a
//! document store would return them.

use entityql::model::{EntityTypeBuilder, Multiplicity};
use entityql::plan::TranslationResult;
use entityql::{
    materialize, ExpressionBuilder, InMemorySource, Model, QueryRequest, QueryResult, Record,
    TranslatedQuery, TranslationOptions, Value, ValueType,
};
use std::sync::Arc;

/// Initialize logging once per test binary; honours `RUST_LOG`
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn model() -> Model {
    Model::builder()
        .entity_type(
            EntityTypeBuilder::new("Customer")
                .key("Id")
                .property("Id", ValueType::Int32, false)
                .property("Name", ValueType::String, false)
                .property("City", ValueType::String, true)
                .navigation("Orders", "Order", Multiplicity::Many),
        )
        .entity_type(
            EntityTypeBuilder::new("Order")
                .key("Id")
                .property("Id", ValueType::Int32, false)
                .property("CustomerId", ValueType::Int32, false)
                .property("Status", ValueType::String, false)
                .property("Total", ValueType::Double, true)
                .property("Priority", ValueType::Int32, false)
                .navigation("Customer", "Customer", Multiplicity::One)
                .navigation("Items", "OrderItem", Multiplicity::Many),
        )
        .entity_type(
            EntityTypeBuilder::new("OrderItem")
                .key("Id")
                .property("Id", ValueType::Int32, false)
                .property("OrderId", ValueType::Int32, false)
                .property("Sku", ValueType::String, false)
                .property("Quantity", ValueType::Int32, false)
                .property("UnitPrice", ValueType::Double, false)
                .navigation("Category", "Category", Multiplicity::ZeroOrOne),
        )
        .entity_type(
            EntityTypeBuilder::new("Category")
                .key("Id")
                .property("Id", ValueType::Int32, false)
                .property("Name", ValueType::String, false),
        )
        .entity_set("Customers", "Customer")
        .entity_set("Orders", "Order")
        .entity_set("OrderItems", "OrderItem")
        .entity_set("Categories", "Category")
        .build()
        .expect("order model is valid")
}

fn category(id: i32, name: &str) -> Record {
    Record::new().with("Id", id).with("Name", name)
}

fn customer(id: i32, name: &str, city: Option<&str>) -> Record {
    Record::new()
        .with("Id", id)
        .with("Name", name)
        .with("City", city)
}

fn item(id: i32, order: i32, sku: &str, quantity: i32, price: f64, cat: Option<Record>) -> Record {
    Record::new()
        .with("Id", id)
        .with("OrderId", order)
        .with("Sku", sku)
        .with("Quantity", quantity)
        .with("UnitPrice", price)
        .with("Category", cat)
}

/// (Id, CustomerId, Status, Total, Priority)
const ORDERS: [(i32, i32, &str, Option<f64>, i32); 8] = [
    (1, 1, "Open", Some(120.0), 2),
    (2, 1, "Shipped", Some(80.0), 1),
    (3, 2, "Open", None, 2),
    (4, 2, "Shipped", Some(45.5), 3),
    (5, 3, "Open", Some(300.0), 1),
    (6, 3, "Cancelled", Some(15.0), 2),
    (7, 1, "Open", Some(80.0), 3),
    (8, 2, "Shipped", None, 1),
];

fn customers() -> Vec<Record> {
    vec![
        customer(1, "Alice", Some("Berlin")),
        customer(2, "Bob", None),
        customer(3, "Carol", Some("Paris")),
    ]
}

fn items() -> Vec<Record> {
    let tools = category(1, "Tools");
    let garden = category(2, "Garden");
    vec![
        item(11, 1, "HAMMER", 1, 12.5, Some(tools.clone())),
        item(12, 1, "NAILS", 2, 3.0, Some(tools.clone())),
        item(13, 1, "SAW", 3, 20.0, Some(tools.clone())),
        item(21, 2, "RAKE", 1, 15.0, Some(garden.clone())),
        item(22, 2, "HOSE", 2, 25.0, Some(garden.clone())),
        item(23, 2, "SEEDS", 3, 2.5, None),
        item(51, 5, "DRILL", 4, 75.0, Some(tools)),
        item(52, 5, "GLOVES", 1, 8.0, Some(garden)),
    ]
}

fn orders() -> Vec<Record> {
    let customers = customers();
    let items = items();
    ORDERS
        .iter()
        .map(|&(id, customer_id, status, total, priority)| {
            let owner = customers
                .iter()
                .find(|c| c.get("Id") == Some(&Value::Int32(customer_id)))
                .cloned();
            let lines: Vec<Value> = items
                .iter()
                .filter(|i| i.get("OrderId") == Some(&Value::Int32(id)))
                .cloned()
                .map(Value::Record)
                .collect();
            Record::new()
                .with("Id", id)
                .with("CustomerId", customer_id)
                .with("Status", status)
                .with("Total", total)
                .with("Priority", priority)
                .with("Customer", owner)
                .with("Items", lines)
        })
        .collect()
}

fn customers_with_orders() -> Vec<Record> {
    let orders = orders();
    customers()
        .into_iter()
        .map(|mut c| {
            let id = c.get("Id").cloned();
            let placed: Vec<Value> = orders
                .iter()
                .filter(|o| o.get("CustomerId") == id.as_ref())
                .cloned()
                .map(Value::Record)
                .collect();
            c.insert("Orders", placed);
            c
        })
        .collect()
}

pub fn source() -> InMemorySource {
    InMemorySource::new()
        .with_records("Customers", customers_with_orders())
        .with_records("Orders", orders())
        .with_records("OrderItems", items())
        .with_records(
            "Categories",
            vec![category(1, "Tools"), category(2, "Garden")],
        )
}

/// Model, rows and options of one test
pub struct OrderFixture {
    builder: ExpressionBuilder,
    source: InMemorySource,
}

impl OrderFixture {
    pub fn new() -> Self {
        Self::with_options(TranslationOptions::default())
    }

    pub fn with_options(options: TranslationOptions) -> Self {
        init_logging();
        Self {
            builder: ExpressionBuilder::new(Arc::new(model()), options),
            source: source(),
        }
    }

    pub fn builder(&self) -> &ExpressionBuilder {
        &self.builder
    }

    pub fn source(&self) -> &InMemorySource {
        &self.source
    }

    pub fn translate(&self, request: &QueryRequest) -> TranslationResult<TranslatedQuery> {
        self.builder.translate(request)
    }

    /// Translate and execute, panicking on any error
    pub fn query(&self, request: &QueryRequest) -> QueryResult {
        let translated = self
            .translate(request)
            .unwrap_or_else(|e| panic!("translation failed: {}", e));
        materialize(&translated, &self.source, self.builder.options())
            .unwrap_or_else(|e| panic!("execution failed: {}", e))
    }

    /// Follow skip-tokens from the first page until a page comes back short
    /// or `$top` is used up
    pub fn all_pages(&self, request: &QueryRequest) -> Vec<QueryResult> {
        let mut pages = Vec::new();
        let mut next = request.clone();
        loop {
            let page = self.query(&next);
            let follow_up = page.next_request(&next);
            pages.push(page);
            match follow_up {
                Some(request) if pages.len() < 100 => next = request,
                _ => break,
            }
        }
        pages
    }
}

/// Scalar values of one field across entries
pub fn column(result: &QueryResult, field: &str) -> Vec<Value> {
    result
        .entries
        .iter()
        .map(|entry| entry.value(field).cloned().unwrap_or(Value::Null))
        .collect()
}

pub fn ints(values: &[i32]) -> Vec<Value> {
    values.iter().map(|v| Value::Int32(*v)).collect()
}
