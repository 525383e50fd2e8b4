// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Parsed clause trees
//!
//! These are the structured inputs handed over by the query-string parser.
//! They describe intent over property and alias names; nothing here is bound
//! to a shape yet.

use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Originating path of a clause: the entity set followed by any expanded
/// navigation properties, e.g. `Orders/Items`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ClausePath(Vec<String>);

impl ClausePath {
    pub fn root(entity_set: impl Into<String>) -> Self {
        Self(vec![entity_set.into()])
    }

    /// Path of a clause nested under the given navigation property
    pub fn child(&self, navigation: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(navigation.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }
}

impl fmt::Display for ClausePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Slash-separated property path, e.g. `Customer/Name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyPath {
    pub segments: Vec<String>,
}

impl PropertyPath {
    pub fn new(path: &str) -> Self {
        Self {
            segments: path.split('/').map(str::to_string).collect(),
        }
    }

    pub fn is_single(&self) -> bool {
        self.segments.len() == 1
    }

    pub fn first(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }
}

impl From<&str> for PropertyPath {
    fn from(path: &str) -> Self {
        PropertyPath::new(path)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Predicate/value node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryNode {
    Property(PropertyPath),
    Literal(Value),
    Binary(BinaryNode),
    Unary(UnaryNode),
    FunctionCall(FunctionCallNode),
    Convert(ConvertNode),
    /// Number of rows behind a collection-valued navigation, `Items/$count`
    CollectionCount(PropertyPath),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryNode {
    pub operator: BinaryOperator,
    pub left: Box<QueryNode>,
    pub right: Box<QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryNode {
    pub operator: UnaryOperator,
    pub operand: Box<QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallNode {
    pub name: String,
    pub arguments: Vec<QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertNode {
    pub source: Box<QueryNode>,
    pub target: ValueType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Logical
    And,
    Or,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Negate,
}

impl QueryNode {
    pub fn property(path: &str) -> Self {
        QueryNode::Property(PropertyPath::new(path))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        QueryNode::Literal(value.into())
    }

    pub fn null() -> Self {
        QueryNode::Literal(Value::Null)
    }

    pub fn binary(operator: BinaryOperator, left: QueryNode, right: QueryNode) -> Self {
        QueryNode::Binary(BinaryNode {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(operator: UnaryOperator, operand: QueryNode) -> Self {
        QueryNode::Unary(UnaryNode {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn call(name: &str, arguments: Vec<QueryNode>) -> Self {
        QueryNode::FunctionCall(FunctionCallNode {
            name: name.to_string(),
            arguments,
        })
    }

    pub fn convert(source: QueryNode, target: ValueType) -> Self {
        QueryNode::Convert(ConvertNode {
            source: Box::new(source),
            target,
        })
    }

    pub fn equal(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::Equal, left, right)
    }

    pub fn greater_than(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::GreaterThan, left, right)
    }

    pub fn less_than(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::LessThan, left, right)
    }

    pub fn and(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::And, left, right)
    }

    pub fn or(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::Or, left, right)
    }

    /// All property paths referenced anywhere below this node
    pub fn property_paths(&self) -> Vec<&PropertyPath> {
        let mut paths = Vec::new();
        self.collect_property_paths(&mut paths);
        paths
    }

    fn collect_property_paths<'a>(&'a self, out: &mut Vec<&'a PropertyPath>) {
        match self {
            QueryNode::Property(path) | QueryNode::CollectionCount(path) => out.push(path),
            QueryNode::Literal(_) => {}
            QueryNode::Binary(node) => {
                node.left.collect_property_paths(out);
                node.right.collect_property_paths(out);
            }
            QueryNode::Unary(node) => node.operand.collect_property_paths(out),
            QueryNode::FunctionCall(node) => {
                for argument in &node.arguments {
                    argument.collect_property_paths(out);
                }
            }
            QueryNode::Convert(node) => node.source.collect_property_paths(out),
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Property(path) => write!(f, "{}", path),
            QueryNode::Literal(value) => write!(f, "{}", value),
            QueryNode::Binary(node) => {
                write!(f, "({} {:?} {})", node.left, node.operator, node.right)
            }
            QueryNode::Unary(node) => write!(f, "{:?}({})", node.operator, node.operand),
            QueryNode::FunctionCall(node) => {
                write!(f, "{}(", node.name)?;
                for (i, argument) in node.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
            QueryNode::Convert(node) => write!(f, "cast({}, {})", node.source, node.target),
            QueryNode::CollectionCount(path) => write!(f, "{}/$count", path),
        }
    }
}

/// `$filter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub expression: QueryNode,
}

impl FilterClause {
    pub fn new(expression: QueryNode) -> Self {
        Self { expression }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

/// One ordering key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expression: QueryNode,
    pub direction: OrderDirection,
}

impl OrderByItem {
    pub fn asc(path: &str) -> Self {
        Self {
            expression: QueryNode::property(path),
            direction: OrderDirection::Ascending,
        }
    }

    pub fn desc(path: &str) -> Self {
        Self {
            expression: QueryNode::property(path),
            direction: OrderDirection::Descending,
        }
    }

    /// The property path when the key is a plain property reference
    pub fn property_path(&self) -> Option<&PropertyPath> {
        match &self.expression {
            QueryNode::Property(path) => Some(path),
            _ => None,
        }
    }
}

/// `$orderby`, primary key first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderByClause {
    pub items: Vec<OrderByItem>,
}

impl OrderByClause {
    pub fn new(items: Vec<OrderByItem>) -> Self {
        Self { items }
    }
}

/// One step of the resource path. `property: None` is the entity set itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigationSegment {
    pub property: Option<String>,
    pub filter: Option<FilterClause>,
}

impl NavigationSegment {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn property(name: &str) -> Self {
        Self {
            property: Some(name.to_string()),
            filter: None,
        }
    }

    pub fn with_filter(mut self, expression: QueryNode) -> Self {
        self.filter = Some(FilterClause::new(expression));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationMethod {
    Sum,
    Min,
    Max,
    Average,
    CountDistinct,
    /// Row count of the group (`$count as Alias`)
    Count,
}

/// Group key of an apply clause; aliased to its path unless renamed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByKey {
    pub property: PropertyPath,
    pub alias: Option<String>,
}

impl GroupByKey {
    pub fn new(path: &str) -> Self {
        Self {
            property: PropertyPath::new(path),
            alias: None,
        }
    }

    pub fn alias(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| self.property.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateExpression {
    pub method: AggregationMethod,
    pub expression: Option<QueryNode>,
    pub alias: String,
}

impl AggregateExpression {
    pub fn new(method: AggregationMethod, path: &str, alias: &str) -> Self {
        Self {
            method,
            expression: Some(QueryNode::property(path)),
            alias: alias.to_string(),
        }
    }

    pub fn count(alias: &str) -> Self {
        Self {
            method: AggregationMethod::Count,
            expression: None,
            alias: alias.to_string(),
        }
    }
}

/// `$apply=groupby((keys), aggregate(...))`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplyClause {
    pub group_by: Vec<GroupByKey>,
    pub aggregates: Vec<AggregateExpression>,
}

/// Requested field of a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectItem {
    Property(PropertyPath),
    Expand(ExpandItem),
    Computed(ComputeItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandItem {
    pub navigation: String,
    #[serde(default)]
    pub options: ExpandOptions,
}

/// Query options nested inside one expanded navigation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandOptions {
    pub select: Option<SelectExpandClause>,
    pub filter: Option<FilterClause>,
    pub order_by: Option<OrderByClause>,
    pub skip: Option<i64>,
    pub top: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeItem {
    pub alias: String,
    pub expression: QueryNode,
}

/// `$select` and `$expand`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectExpandClause {
    pub items: Vec<SelectItem>,
    /// `$select=*` or expand-only: every structural property is projected
    pub all_selected: bool,
}

impl SelectExpandClause {
    pub fn properties(paths: &[&str]) -> Self {
        Self {
            items: paths
                .iter()
                .map(|p| SelectItem::Property(PropertyPath::new(p)))
                .collect(),
            all_selected: false,
        }
    }

    pub fn with_expand(mut self, navigation: &str, options: ExpandOptions) -> Self {
        self.items.push(SelectItem::Expand(ExpandItem {
            navigation: navigation.to_string(),
            options,
        }));
        self
    }

    pub fn with_computed(mut self, alias: &str, expression: QueryNode) -> Self {
        self.items.push(SelectItem::Computed(ComputeItem {
            alias: alias.to_string(),
            expression,
        }));
        self
    }
}

/// One key value of the last row of the previous page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipTokenNameValue {
    pub name: String,
    pub value: Value,
}

impl SkipTokenNameValue {
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// A fully parsed request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub entity_set: String,
    pub navigation: Vec<NavigationSegment>,
    pub filter: Option<FilterClause>,
    pub apply: Option<ApplyClause>,
    pub select_expand: Option<SelectExpandClause>,
    pub order_by: Option<OrderByClause>,
    pub skip_token: Vec<SkipTokenNameValue>,
    pub skip: Option<i64>,
    pub top: Option<i64>,
    pub count: bool,
}

impl QueryRequest {
    pub fn new(entity_set: &str) -> Self {
        Self {
            entity_set: entity_set.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn path(&self) -> ClausePath {
        ClausePath::root(self.entity_set.clone())
    }
}
