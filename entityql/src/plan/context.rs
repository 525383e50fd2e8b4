// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Translator context
//!
//! A context binds one row parameter to the current shape. Stages that
//! change the shape return a new context instead of mutating the old one.
//! Every context derived within one pipeline run shares the same pipeline
//! state, which holds the constant map and the parameter counter; that
//! state only ever grows.

use super::constants::{ConstantBindings, ConstantMap};
use super::error::{Clause, TranslationError, TranslationResult};
use super::translator::NodeTranslator;
use crate::ast::ClausePath;
use crate::expr::{BoundKind, Parameter, ParameterId, Placeholder};
use crate::model::{MemberType, MetadataProvider, Shape};
use crate::types::{Value, ValueType};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

/// Output alias → synthesized tuple member
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasMap {
    entries: Vec<(String, String)>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, member: impl Into<String>) {
        self.entries.push((alias.into(), member.into()));
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.iter().any(|(a, _)| a == alias)
    }

    /// Member a given alias denotes
    pub fn member(&self, alias: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, member)| member.as_str())
    }

    /// Alias under which a given member is exposed
    pub fn alias(&self, member: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, m)| m == member)
            .map(|(alias, _)| alias.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, m)| (a.as_str(), m.as_str()))
    }
}

/// Mutable state of one pipeline run; never shared between requests
#[derive(Debug, Default)]
pub(crate) struct PipelineState {
    constants: RefCell<ConstantMap>,
    next_parameter: Cell<u32>,
}

#[derive(Debug, Clone)]
pub struct TranslatorContext {
    model: Arc<dyn MetadataProvider>,
    parameter: Parameter,
    aliases: Option<Arc<AliasMap>>,
    path: ClausePath,
    state: Rc<PipelineState>,
}

impl TranslatorContext {
    /// Root context of a fresh pipeline run
    pub fn new(model: Arc<dyn MetadataProvider>, shape: Arc<Shape>, path: ClausePath) -> Self {
        let state = Rc::new(PipelineState::default());
        let parameter = Self::allocate_parameter(&state, shape);
        Self {
            model,
            parameter,
            aliases: None,
            path,
            state,
        }
    }

    fn allocate_parameter(state: &PipelineState, shape: Arc<Shape>) -> Parameter {
        let id = state.next_parameter.get();
        state.next_parameter.set(id + 1);
        Parameter::new(ParameterId(id), shape)
    }

    /// Context for a new shape; aliases of the old shape are dropped
    pub fn rebind(&self, shape: Arc<Shape>) -> Self {
        Self {
            model: self.model.clone(),
            parameter: Self::allocate_parameter(&self.state, shape),
            aliases: None,
            path: self.path.clone(),
            state: self.state.clone(),
        }
    }

    /// Context for a synthesized tuple shape addressed through aliases
    pub fn rebind_with_aliases(&self, shape: Arc<Shape>, aliases: AliasMap) -> Self {
        Self {
            aliases: Some(Arc::new(aliases)),
            ..self.rebind(shape)
        }
    }

    /// Context of a request nested under a navigation property; it shares
    /// this run's constant map
    pub fn nested(&self, shape: Arc<Shape>, navigation: &str) -> Self {
        Self {
            path: self.path.child(navigation),
            ..self.rebind(shape)
        }
    }

    /// Fresh parameter over an arbitrary shape, e.g. for a lambda over a
    /// navigation target
    pub fn new_parameter(&self, shape: Arc<Shape>) -> Parameter {
        Self::allocate_parameter(&self.state, shape)
    }

    pub fn model(&self) -> &Arc<dyn MetadataProvider> {
        &self.model
    }

    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.parameter.shape
    }

    pub fn aliases(&self) -> Option<&AliasMap> {
        self.aliases.as_deref()
    }

    pub fn path(&self) -> &ClausePath {
        &self.path
    }

    pub fn translator(&self, clause: Clause) -> NodeTranslator<'_> {
        NodeTranslator::new(self, clause)
    }

    /// Register a bound literal at this context's path
    pub fn register_bound(&self, kind: BoundKind, ty: ValueType, value: Value) -> Placeholder {
        self.state
            .constants
            .borrow_mut()
            .register(kind, &self.path, ty, value)
    }

    pub fn constants(&self) -> ConstantBindings {
        self.state.constants.borrow().bindings()
    }

    /// Shape a navigation member leads to
    pub fn navigation_target(
        &self,
        clause: Clause,
        member: &str,
        target: &str,
    ) -> TranslationResult<Arc<Shape>> {
        self.model
            .entity_shape(target)
            .ok_or_else(|| TranslationError::UnresolvedName {
                clause,
                path: self.path.clone(),
                name: format!("{}.{}", member, target),
                shape: self.shape().name().to_string(),
            })
    }

    /// Nested shape carried by a member: navigation target, projected
    /// record or projected collection
    pub fn member_target(
        &self,
        clause: Clause,
        name: &str,
        ty: &MemberType,
    ) -> TranslationResult<Option<Arc<Shape>>> {
        match ty {
            MemberType::Scalar { .. } => Ok(None),
            MemberType::Navigation { target, .. } => {
                self.navigation_target(clause, name, target).map(Some)
            }
            MemberType::Record(shape) | MemberType::Collection(shape) => Ok(Some(shape.clone())),
        }
    }
}
