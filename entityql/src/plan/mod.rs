// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Translation of request clause trees into native query expressions
//!
//! [`ExpressionBuilder`] runs the stage pipeline over one request. Scalar
//! clause nodes are translated by [`NodeTranslator`] against the active
//! [`TranslatorContext`]; sequence operators are instantiated by
//! [`OperatorResolver`]. Literal bounds are collected into a per-request
//! constant map so that structurally equal requests produce identical
//! expressions.

pub mod constants;
pub mod context;
pub mod entry_factory;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod resolver;
pub mod stages;
pub mod translator;

pub use constants::{ConstantBindings, ConstantMap, PlaceholderBinding};
pub use context::{AliasMap, TranslatorContext};
pub use entry_factory::{Entry, EntryFactory, EntryField, EntryValue, FieldAccessor, SkipTokenKey};
pub use error::{Clause, ErrorKind, TranslationError, TranslationResult};
pub use options::{NullOrdering, TranslationOptions};
pub use pipeline::{ExpressionBuilder, PipelineStage, StageTrace, TranslatedQuery};
pub use resolver::OperatorResolver;
pub use translator::NodeTranslator;
