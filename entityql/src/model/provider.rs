// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Metadata provider trait and the in-memory model
//!
//! The provider is read-only and shared across concurrent translations;
//! nothing in the translation core ever mutates it.

use super::error::{ModelError, ModelResult};
use super::shape::{Member, MemberType, Multiplicity, Shape, ShapeKind};
use crate::types::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Named entry point into the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    pub name: String,
    pub entity_type: String,
}

/// Source of entity, property, key and navigation declarations
///
/// Implementations must be safe to share between threads; translations read
/// them without synchronization.
pub trait MetadataProvider: Send + Sync + fmt::Debug {
    /// Shape of a declared entity type
    fn entity_shape(&self, type_name: &str) -> Option<Arc<Shape>>;

    /// Entity set by name
    fn entity_set(&self, name: &str) -> Option<&EntitySet>;

    /// First entity set whose element type is the given entity type
    fn entity_set_for_type(&self, type_name: &str) -> Option<&EntitySet>;
}

/// Immutable entity model
#[derive(Debug, Clone)]
pub struct Model {
    shapes: HashMap<String, Arc<Shape>>,
    entity_sets: Vec<EntitySet>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    pub fn entity_sets(&self) -> &[EntitySet] {
        &self.entity_sets
    }
}

impl MetadataProvider for Model {
    fn entity_shape(&self, type_name: &str) -> Option<Arc<Shape>> {
        self.shapes.get(type_name).cloned()
    }

    fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.entity_sets.iter().find(|set| set.name == name)
    }

    fn entity_set_for_type(&self, type_name: &str) -> Option<&EntitySet> {
        self.entity_sets
            .iter()
            .find(|set| set.entity_type == type_name)
    }
}

/// Declaration of one entity type
#[derive(Debug, Clone)]
pub struct EntityTypeBuilder {
    name: String,
    keys: Vec<String>,
    members: Vec<Member>,
}

impl EntityTypeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            keys: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn key(mut self, property: &str) -> Self {
        self.keys.push(property.to_string());
        self
    }

    pub fn property(mut self, name: &str, ty: ValueType, nullable: bool) -> Self {
        self.members.push(Member::scalar(name, ty, nullable));
        self
    }

    pub fn navigation(mut self, name: &str, target: &str, multiplicity: Multiplicity) -> Self {
        self.members
            .push(Member::navigation(name, target, multiplicity));
        self
    }
}

/// Builder for [`Model`]
#[derive(Debug, Default)]
pub struct ModelBuilder {
    entity_types: Vec<EntityTypeBuilder>,
    entity_sets: Vec<EntitySet>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_type(mut self, entity_type: EntityTypeBuilder) -> Self {
        self.entity_types.push(entity_type);
        self
    }

    pub fn entity_set(mut self, name: &str, entity_type: &str) -> Self {
        self.entity_sets.push(EntitySet {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
        });
        self
    }

    /// Validate declarations and freeze the model
    pub fn build(self) -> ModelResult<Model> {
        let declared: Vec<&str> = self.entity_types.iter().map(|t| t.name.as_str()).collect();

        let mut shapes = HashMap::new();
        for entity_type in &self.entity_types {
            if shapes.contains_key(&entity_type.name) {
                return Err(ModelError::DuplicateDeclaration(entity_type.name.clone()));
            }

            for (i, member) in entity_type.members.iter().enumerate() {
                if entity_type.members[..i].iter().any(|m| m.name == member.name) {
                    return Err(ModelError::DuplicateDeclaration(format!(
                        "{}.{}",
                        entity_type.name, member.name
                    )));
                }
                if let MemberType::Navigation { target, .. } = &member.ty {
                    if !declared.contains(&target.as_str()) {
                        return Err(ModelError::UnknownNavigationTarget {
                            entity_type: entity_type.name.clone(),
                            navigation: member.name.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }

            for key in &entity_type.keys {
                let is_scalar = entity_type
                    .members
                    .iter()
                    .any(|m| &m.name == key && m.is_scalar());
                if !is_scalar {
                    return Err(ModelError::UnknownKey {
                        entity_type: entity_type.name.clone(),
                        key: key.clone(),
                    });
                }
            }

            let shape = Shape::new(
                &entity_type.name,
                ShapeKind::Entity,
                entity_type.members.clone(),
                entity_type.keys.clone(),
            );
            shapes.insert(entity_type.name.clone(), Arc::new(shape));
        }

        for set in &self.entity_sets {
            if !shapes.contains_key(&set.entity_type) {
                return Err(ModelError::UnknownEntityType(set.entity_type.clone()));
            }
        }

        log::debug!(
            "Model built: {} entity types, {} entity sets",
            shapes.len(),
            self.entity_sets.len()
        );

        Ok(Model {
            shapes,
            entity_sets: self.entity_sets,
        })
    }
}
