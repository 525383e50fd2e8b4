// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Row shapes
//!
//! A shape is the structural type of the item flowing through a query
//! pipeline: a declared entity, an aggregation tuple or a projected record.
//! It is identified by its set of addressable members.

use crate::types::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What produced a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Entity,
    Tuple,
    Projection,
}

/// Declared cardinality of a navigation property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    One,
    ZeroOrOne,
    Many,
}

impl Multiplicity {
    pub fn is_many(self) -> bool {
        self == Multiplicity::Many
    }
}

/// Type of one addressable member
#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub enum MemberType {
    Scalar { ty: ValueType, nullable: bool },
    /// Entity navigation, resolved against the model by target type name
    Navigation {
        target: String,
        multiplicity: Multiplicity,
    },
    /// Inline single record (projected single-valued expansion)
    Record(Arc<Shape>),
    /// Inline collection (projected collection-valued expansion)
    Collection(Arc<Shape>),
}

#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub struct Member {
    pub name: String,
    pub ty: MemberType,
    /// Carried for pipeline use only (ordering keys), never an output field
    pub hidden: bool,
}

impl Member {
    pub fn scalar(name: &str, ty: ValueType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            ty: MemberType::Scalar { ty, nullable },
            hidden: false,
        }
    }

    pub fn navigation(name: &str, target: &str, multiplicity: Multiplicity) -> Self {
        Self {
            name: name.to_string(),
            ty: MemberType::Navigation {
                target: target.to_string(),
                multiplicity,
            },
            hidden: false,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.ty, MemberType::Scalar { .. })
    }

    /// Declared output property: a visible structural member
    pub fn is_output(&self) -> bool {
        self.is_scalar() && !self.hidden
    }
}

#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub struct Shape {
    name: String,
    kind: ShapeKind,
    members: Vec<Member>,
    keys: Vec<String>,
}

impl Shape {
    pub fn new(name: &str, kind: ShapeKind, members: Vec<Member>, keys: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            members,
            keys,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Visible structural members, in declaration order
    pub fn output_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_output())
    }

    /// Members that together identify a row; empty when the shape has no
    /// known identity (e.g. a projection that dropped a key)
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Whether ordering by the given members orders every row uniquely
    pub fn is_total_ordering<'a>(&self, ordered_members: impl IntoIterator<Item = &'a str>) -> bool {
        if self.keys.is_empty() {
            return false;
        }
        let ordered: Vec<&str> = ordered_members.into_iter().collect();
        self.keys.iter().all(|key| ordered.contains(&key.as_str()))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_shape() -> Shape {
        Shape::new(
            "Order",
            ShapeKind::Entity,
            vec![
                Member::scalar("Id", ValueType::Int32, false),
                Member::scalar("Name", ValueType::String, true),
                Member::navigation("Items", "OrderItem", Multiplicity::Many),
            ],
            vec!["Id".to_string()],
        )
    }

    #[test]
    fn test_output_members_skip_navigation() {
        let shape = order_shape();
        let names: Vec<&str> = shape.output_members().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Name"]);
    }

    #[test]
    fn test_total_ordering_requires_keys() {
        let shape = order_shape();
        assert!(shape.is_total_ordering(["Name", "Id"]));
        assert!(!shape.is_total_ordering(["Name"]));

        let keyless = Shape::new("Projection", ShapeKind::Projection, vec![], vec![]);
        assert!(!keyless.is_total_ordering(["Id"]));
    }
}
