// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Model declaration errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Duplicate declaration: {0}")]
    DuplicateDeclaration(String),

    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Key '{key}' is not a structural property of {entity_type}")]
    UnknownKey { entity_type: String, key: String },

    #[error("Navigation {entity_type}.{navigation} targets undeclared type {target}")]
    UnknownNavigationTarget {
        entity_type: String,
        navigation: String,
        target: String,
    },
}

pub type ModelResult<T> = Result<T, ModelError>;
