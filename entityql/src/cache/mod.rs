// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Plan caching
//!
//! Structurally identical requests translate to identical expressions with
//! their literal bounds held aside as placeholder bindings, so one cached
//! plan serves all of them.

pub mod cache_config;
pub mod fingerprint;
pub mod plan_cache;

pub use cache_config::PlanCacheConfig;
pub use fingerprint::fingerprint;
pub use plan_cache::{CachedPlan, PlanCache, PlanCacheStats, PreparedQuery};
