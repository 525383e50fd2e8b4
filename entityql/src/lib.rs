// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! EntityQL - Query expression translation for entity data services
//!
//! EntityQL converts a parsed query request (filter predicate, ordering
//! keys, projection and expansion tree, group-by/aggregation, navigation
//! path and keyset-pagination cursor) into a composable query expression
//! over an abstract data source, plus an entry factory that pulls the named
//! output fields out of each result row.
//!
//! # Features
//!
//! - **Shape tracking**: references are rebound as the row shape changes
//!   from entity to navigated collection, aggregated tuple and projection
//! - **Three-valued logic**: null comparisons, `eq null` rewriting and
//!   Kleene `and`/`or`
//! - **Keyset pagination**: skip-token predicates honouring direction and
//!   null ordering, and next-page cursors from the entry factory
//! - **Plan caching**: bound literals become placeholders, so structurally
//!   equal requests share a cached plan
//!
//! # Usage
//!
//! ```ignore
//! let builder = ExpressionBuilder::new(model, TranslationOptions::default());
//! let translated = builder.translate(&QueryRequest::from_json(json)?)?;
//! println!("{}", translated.explain());
//! ```

pub mod ast;
pub mod cache;
pub mod exec;
pub mod expr;
pub mod functions;
pub mod model;
pub mod plan;
pub mod types;

// Re-export the main API
pub use ast::{ClausePath, QueryRequest};
pub use cache::{PlanCache, PlanCacheConfig, PreparedQuery};
pub use exec::{materialize, DataSource, Executor, InMemorySource, QueryResult};
pub use model::{MetadataProvider, Model};
pub use plan::{
    EntryFactory, ExpressionBuilder, NullOrdering, TranslatedQuery, TranslationError,
    TranslationOptions,
};
pub use types::{Record, Value, ValueType};

/// EntityQL version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// EntityQL crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
