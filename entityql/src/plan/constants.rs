// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Constant placeholder registry
//!
//! Bound literals (skip, top, skip-token values) never appear inline in a
//! translated expression. They are registered here, keyed by kind and
//! clause path, and the expression refers to them through a placeholder.
//! Two requests that differ only in those literals therefore translate to
//! structurally identical expressions.

use crate::ast::ClausePath;
use crate::expr::{BoundKind, Placeholder, PlaceholderId};
use crate::types::{Value, ValueType};
use serde::Serialize;

/// A placeholder together with the literal it stands for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceholderBinding {
    pub placeholder: Placeholder,
    pub value: Value,
}

/// Append-only registry for one pipeline run
#[derive(Debug, Default)]
pub struct ConstantMap {
    bindings: Vec<PlaceholderBinding>,
}

impl ConstantMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a literal, or return the placeholder already registered for
    /// the same kind at the same path
    pub fn register(
        &mut self,
        kind: BoundKind,
        path: &ClausePath,
        ty: ValueType,
        value: Value,
    ) -> Placeholder {
        if let Some(existing) = self
            .bindings
            .iter()
            .find(|b| b.placeholder.kind == kind && &b.placeholder.path == path)
        {
            if existing.value != value {
                log::warn!(
                    "@{}[{}] re-registered with {}, keeping {}",
                    kind,
                    path,
                    value,
                    existing.value
                );
            }
            return existing.placeholder.clone();
        }

        let placeholder = Placeholder {
            id: PlaceholderId(self.bindings.len() as u32),
            kind,
            path: path.clone(),
            ty,
        };
        log::trace!("Registered @{}[{}] = {}", kind, path, value);
        self.bindings.push(PlaceholderBinding {
            placeholder: placeholder.clone(),
            value,
        });
        placeholder
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Snapshot of the bindings registered so far
    pub fn bindings(&self) -> ConstantBindings {
        ConstantBindings {
            bindings: self.bindings.clone(),
        }
    }
}

/// Frozen placeholder values of one translated request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConstantBindings {
    bindings: Vec<PlaceholderBinding>,
}

impl ConstantBindings {
    pub fn value(&self, id: PlaceholderId) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|b| b.placeholder.id == id)
            .map(|b| &b.value)
    }

    /// Value bound to the placeholder of the given kind at the given path
    pub fn value_at(&self, kind: BoundKind, path: &ClausePath) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|b| b.placeholder.kind == kind && &b.placeholder.path == path)
            .map(|b| &b.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaceholderBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_path_reuses_placeholder() {
        let mut constants = ConstantMap::new();
        let path = ClausePath::root("Orders");

        let first = constants.register(BoundKind::Top, &path, ValueType::Int64, Value::Int64(10));
        let second = constants.register(BoundKind::Top, &path, ValueType::Int64, Value::Int64(10));

        assert_eq!(first, second);
        assert_eq!(constants.len(), 1);
    }

    #[test]
    fn test_distinct_kinds_and_paths_get_distinct_placeholders() {
        let mut constants = ConstantMap::new();
        let root = ClausePath::root("Orders");
        let nested = root.child("Items");

        let top = constants.register(BoundKind::Top, &root, ValueType::Int64, Value::Int64(5));
        let skip = constants.register(BoundKind::Skip, &root, ValueType::Int64, Value::Int64(5));
        let nested_top =
            constants.register(BoundKind::Top, &nested, ValueType::Int64, Value::Int64(5));

        assert_ne!(top.id, skip.id);
        assert_ne!(top.id, nested_top.id);
        assert_eq!(constants.len(), 3);
    }

    #[test]
    fn test_first_value_wins_on_reregistration() {
        let mut constants = ConstantMap::new();
        let path = ClausePath::root("Orders");

        let placeholder =
            constants.register(BoundKind::Skip, &path, ValueType::Int64, Value::Int64(20));
        constants.register(BoundKind::Skip, &path, ValueType::Int64, Value::Int64(40));

        let bindings = constants.bindings();
        assert_eq!(bindings.value(placeholder.id), Some(&Value::Int64(20)));
        assert_eq!(
            bindings.value_at(BoundKind::Skip, &path),
            Some(&Value::Int64(20))
        );
    }
}
