// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Translation errors
//!
//! All errors are deterministic for identical clause trees and metadata and
//! are never retried inside the translator. Each names the clause it came
//! from and the clause path of the (possibly nested) request.

use crate::ast::ClausePath;
use crate::expr::QueryOperator;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Request clause an error or placeholder originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Clause {
    Navigation,
    Filter,
    Apply,
    Select,
    OrderBy,
    SkipToken,
    Skip,
    Top,
    Count,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Clause::Navigation => "navigation",
            Clause::Filter => "$filter",
            Clause::Apply => "$apply",
            Clause::Select => "$select",
            Clause::OrderBy => "$orderby",
            Clause::SkipToken => "$skiptoken",
            Clause::Skip => "$skip",
            Clause::Top => "$top",
            Clause::Count => "$count",
        };
        f.write_str(name)
    }
}

/// Fieldless error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnresolvedName,
    UnsupportedFunction,
    TypeMismatch,
    UnsupportedShape,
    InvalidBound,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    #[error("{clause} at {path}: '{name}' is not a member of {shape}")]
    UnresolvedName {
        clause: Clause,
        path: ClausePath,
        name: String,
        shape: String,
    },

    #[error("{clause} at {path}: unsupported function '{name}'")]
    UnsupportedFunction {
        clause: Clause,
        path: ClausePath,
        name: String,
    },

    #[error("{clause} at {path}: type mismatch: {message}")]
    TypeMismatch {
        clause: Clause,
        path: ClausePath,
        message: String,
    },

    #[error("{clause} at {path}: {operator:?} is not supported over {shape}: {reason}")]
    UnsupportedShape {
        clause: Clause,
        path: ClausePath,
        operator: QueryOperator,
        shape: String,
        reason: String,
    },

    #[error("{clause} at {path}: invalid bound: {reason}")]
    InvalidBound {
        clause: Clause,
        path: ClausePath,
        reason: String,
    },
}

impl TranslationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslationError::UnresolvedName { .. } => ErrorKind::UnresolvedName,
            TranslationError::UnsupportedFunction { .. } => ErrorKind::UnsupportedFunction,
            TranslationError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            TranslationError::UnsupportedShape { .. } => ErrorKind::UnsupportedShape,
            TranslationError::InvalidBound { .. } => ErrorKind::InvalidBound,
        }
    }

    pub fn clause(&self) -> Clause {
        match self {
            TranslationError::UnresolvedName { clause, .. }
            | TranslationError::UnsupportedFunction { clause, .. }
            | TranslationError::TypeMismatch { clause, .. }
            | TranslationError::UnsupportedShape { clause, .. }
            | TranslationError::InvalidBound { clause, .. } => *clause,
        }
    }

    pub fn path(&self) -> &ClausePath {
        match self {
            TranslationError::UnresolvedName { path, .. }
            | TranslationError::UnsupportedFunction { path, .. }
            | TranslationError::TypeMismatch { path, .. }
            | TranslationError::UnsupportedShape { path, .. }
            | TranslationError::InvalidBound { path, .. } => path,
        }
    }
}

pub type TranslationResult<T> = Result<T, TranslationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_clause_and_path() {
        let error = TranslationError::InvalidBound {
            clause: Clause::Top,
            path: ClausePath::root("Orders").child("Items"),
            reason: "negative value -1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "$top at Orders/Items: invalid bound: negative value -1"
        );
        assert_eq!(error.kind(), ErrorKind::InvalidBound);
        assert_eq!(error.clause(), Clause::Top);
    }
}
