// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Entry factories
//!
//! An entry factory is built once per request and describes how to pull
//! each named output field out of one materialized row. Expanded
//! navigations carry a nested factory for their rows.

use crate::ast::SkipTokenNameValue;
use crate::model::Shape;
use crate::types::{Record, Value};
use serde::Serialize;

/// How one output field is read from a row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldAccessor {
    /// Value of a row member
    Member(String),
    /// Fixed value, independent of the row
    Constant(Value),
    /// Expanded navigation materialized through its own factory
    Nested {
        member: String,
        factory: Box<EntryFactory>,
        many: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryField {
    pub name: String,
    pub accessor: FieldAccessor,
}

/// Position of one ordering key in the rows a factory reads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipTokenKey {
    /// Property path as the client names it in a skip-token
    pub name: String,
    /// Row member holding the value
    pub member: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EntryFactory {
    entity_set: Option<String>,
    fields: Vec<EntryField>,
    skip_token_keys: Vec<SkipTokenKey>,
}

/// Materialized value of one output field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EntryValue {
    Value(Value),
    Single(Option<Box<Entry>>),
    Many(Vec<Entry>),
}

/// Named output fields of one row, in factory order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Entry {
    pub fields: Vec<(String, EntryValue)>,
}

impl Entry {
    pub fn get(&self, name: &str) -> Option<&EntryValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Scalar value of a field, `None` for nested or absent fields
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name) {
            Some(EntryValue::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl EntryFactory {
    pub fn new(entity_set: Option<String>, fields: Vec<EntryField>) -> Self {
        Self {
            entity_set,
            fields,
            skip_token_keys: Vec::new(),
        }
    }

    /// Default factory: every declared output property of the shape, read
    /// directly from the row
    pub fn from_shape(shape: &Shape, entity_set: Option<String>) -> Self {
        let fields = shape
            .output_members()
            .map(|member| EntryField {
                name: member.name.clone(),
                accessor: FieldAccessor::Member(member.name.clone()),
            })
            .collect();
        Self::new(entity_set, fields)
    }

    pub fn with_skip_token_keys(mut self, keys: Vec<SkipTokenKey>) -> Self {
        self.skip_token_keys = keys;
        self
    }

    /// Entity set the entries belong to, when they are entities
    pub fn entity_set(&self) -> Option<&str> {
        self.entity_set.as_deref()
    }

    pub fn fields(&self) -> &[EntryField] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn skip_token_keys(&self) -> &[SkipTokenKey] {
        &self.skip_token_keys
    }

    /// Materialize one row; members missing from the row read as null
    pub fn create_entry(&self, row: &Value) -> Entry {
        let record = row.as_record();
        let member = |name: &str| -> Value {
            record
                .and_then(|r| r.get(name))
                .cloned()
                .unwrap_or(Value::Null)
        };

        let fields = self
            .fields
            .iter()
            .map(|field| {
                let value = match &field.accessor {
                    FieldAccessor::Member(name) => EntryValue::Value(member(name)),
                    FieldAccessor::Constant(value) => EntryValue::Value(value.clone()),
                    FieldAccessor::Nested {
                        member: name,
                        factory,
                        many: true,
                    } => {
                        let rows = member(name);
                        let entries: Vec<Entry> = rows
                            .as_list()
                            .map(|rows| rows.iter().map(|r| factory.create_entry(r)).collect())
                            .unwrap_or_default();
                        EntryValue::Many(entries)
                    }
                    FieldAccessor::Nested {
                        member: name,
                        factory,
                        many: false,
                    } => match member(name) {
                        Value::Null => EntryValue::Single(None),
                        nested => EntryValue::Single(Some(Box::new(factory.create_entry(&nested)))),
                    },
                };
                (field.name.clone(), value)
            })
            .collect();

        Entry { fields }
    }

    /// Skip-token of the row a page ended on; empty when the request had no
    /// total ordering to page by
    pub fn skip_token(&self, row: &Value) -> Vec<SkipTokenNameValue> {
        let record = row.as_record();
        self.skip_token_keys
            .iter()
            .map(|key| SkipTokenNameValue {
                name: key.name.clone(),
                value: record
                    .and_then(|r: &Record| r.get(&key.member))
                    .cloned()
                    .unwrap_or(Value::Null),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Member, ShapeKind};
    use crate::types::ValueType;

    fn shape() -> Shape {
        let mut hidden = Member::scalar("Id", ValueType::Int32, false);
        hidden.hidden = true;
        Shape::new(
            "OrderProjection",
            ShapeKind::Projection,
            vec![Member::scalar("Name", ValueType::String, false), hidden],
            vec!["Id".to_string()],
        )
    }

    #[test]
    fn test_default_factory_skips_hidden_members() {
        let factory = EntryFactory::from_shape(&shape(), Some("Orders".to_string()));
        assert_eq!(factory.field_names(), vec!["Name"]);
        assert_eq!(factory.entity_set(), Some("Orders"));
    }

    #[test]
    fn test_create_entry_with_nested_and_constant_fields() {
        let nested = EntryFactory::new(
            None,
            vec![EntryField {
                name: "Sku".to_string(),
                accessor: FieldAccessor::Member("Sku".to_string()),
            }],
        );
        let factory = EntryFactory::new(
            None,
            vec![
                EntryField {
                    name: "Name".to_string(),
                    accessor: FieldAccessor::Member("Name".to_string()),
                },
                EntryField {
                    name: "Source".to_string(),
                    accessor: FieldAccessor::Constant(Value::from("web")),
                },
                EntryField {
                    name: "Items".to_string(),
                    accessor: FieldAccessor::Nested {
                        member: "Items".to_string(),
                        factory: Box::new(nested),
                        many: true,
                    },
                },
            ],
        );

        let row = Value::Record(
            Record::new()
                .with("Name", "first")
                .with(
                    "Items",
                    vec![
                        Value::Record(Record::new().with("Sku", "A-1")),
                        Value::Record(Record::new().with("Sku", "B-2")),
                    ],
                ),
        );

        let entry = factory.create_entry(&row);
        assert_eq!(entry.field_names(), vec!["Name", "Source", "Items"]);
        assert_eq!(entry.value("Source"), Some(&Value::from("web")));
        match entry.get("Items") {
            Some(EntryValue::Many(items)) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].value("Sku"), Some(&Value::from("B-2")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_skip_token_reads_hidden_keys() {
        let factory = EntryFactory::from_shape(&shape(), None).with_skip_token_keys(vec![
            SkipTokenKey {
                name: "Id".to_string(),
                member: "Id".to_string(),
            },
        ]);
        let row = Value::Record(Record::new().with("Name", "x").with("Id", 42));
        let token = factory.skip_token(&row);
        assert_eq!(token, vec![SkipTokenNameValue::new("Id", 42)]);
    }
}
