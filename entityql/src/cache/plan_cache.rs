// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Plan caching across requests
//!
//! Requests are always translated (translation is what collects their bound
//! values); the cache then shares one plan between every request whose
//! expression fingerprints alike.

use super::cache_config::PlanCacheConfig;
use super::fingerprint::fingerprint;
use crate::ast::{OrderByItem, QueryRequest};
use crate::expr::QueryExpr;
use crate::plan::{ConstantBindings, EntryFactory, ExpressionBuilder, TranslatedQuery, TranslationResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Request-independent part of a translation
#[derive(Debug)]
pub struct CachedPlan {
    pub fingerprint: u64,
    pub expression: QueryExpr,
    pub entry_factory: EntryFactory,
    pub ordering: Vec<OrderByItem>,
}

impl CachedPlan {
    pub fn explain(&self) -> String {
        self.expression.to_string()
    }
}

/// A shared plan with the bound values of one request
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub plan: Arc<CachedPlan>,
    pub constants: ConstantBindings,
    pub cache_hit: bool,
}

impl PreparedQuery {
    /// Reassemble a translated query for execution
    pub fn to_translated(&self) -> TranslatedQuery {
        TranslatedQuery {
            expression: self.plan.expression.clone(),
            entry_factory: self.plan.entry_factory.clone(),
            constants: self.constants.clone(),
            ordering: self.plan.ordering.clone(),
            trace: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct PlanCacheEntry {
    plan: Arc<CachedPlan>,
    usage_count: u64,
    last_used: Instant,
}

/// Plan cache statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlanCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub current_entries: usize,
}

impl PlanCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct PlanCache {
    config: PlanCacheConfig,
    entries: RwLock<HashMap<u64, PlanCacheEntry>>,
    stats: RwLock<PlanCacheStats>,
}

impl PlanCache {
    pub fn new(config: PlanCacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(PlanCacheStats::default()),
        }
    }

    pub fn config(&self) -> &PlanCacheConfig {
        &self.config
    }

    /// Translate a request and share its plan with earlier requests of the
    /// same structure
    pub fn prepare(
        &self,
        builder: &ExpressionBuilder,
        request: &QueryRequest,
    ) -> TranslationResult<PreparedQuery> {
        let translated = builder.translate(request)?;
        let key = fingerprint(&translated.expression);

        if !self.config.enabled {
            return Ok(PreparedQuery {
                plan: Arc::new(Self::plan_of(key, translated.clone())),
                constants: translated.constants,
                cache_hit: false,
            });
        }

        if let Some(plan) = self.lookup(key, &translated.expression) {
            log::debug!("Plan cache hit for {} ({:016x})", request.entity_set, key);
            return Ok(PreparedQuery {
                plan,
                constants: translated.constants,
                cache_hit: true,
            });
        }

        log::debug!("Plan cache miss for {} ({:016x})", request.entity_set, key);
        let constants = translated.constants.clone();
        let plan = Arc::new(Self::plan_of(key, translated));
        self.insert(key, plan.clone());

        Ok(PreparedQuery {
            plan,
            constants,
            cache_hit: false,
        })
    }

    fn plan_of(key: u64, translated: TranslatedQuery) -> CachedPlan {
        CachedPlan {
            fingerprint: key,
            expression: translated.expression,
            entry_factory: translated.entry_factory,
            ordering: translated.ordering,
        }
    }

    fn lookup(&self, key: u64, expression: &QueryExpr) -> Option<Arc<CachedPlan>> {
        let mut entries = self.entries.write();
        let found = match entries.get_mut(&key) {
            // Equal fingerprints of unequal expressions are a collision
            Some(entry) if entry.plan.expression == *expression => {
                entry.usage_count += 1;
                entry.last_used = Instant::now();
                Some(entry.plan.clone())
            }
            Some(_) => {
                log::warn!("Plan cache fingerprint collision on {:016x}", key);
                None
            }
            None => None,
        };

        let mut stats = self.stats.write();
        match found {
            Some(_) => stats.hits += 1,
            None => stats.misses += 1,
        }
        found
    }

    fn insert(&self, key: u64, plan: Arc<CachedPlan>) {
        let mut entries = self.entries.write();

        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            // Least used first, oldest among equals
            let victim = entries
                .iter()
                .min_by(|(_, a), (_, b)| {
                    a.usage_count
                        .cmp(&b.usage_count)
                        .then(a.last_used.cmp(&b.last_used))
                })
                .map(|(k, _)| *k);
            if let Some(victim) = victim {
                entries.remove(&victim);
                self.stats.write().evictions += 1;
                log::debug!("Plan cache evicted {:016x}", victim);
            }
        }

        if self.config.max_entries > 0 {
            entries.insert(
                key,
                PlanCacheEntry {
                    plan,
                    usage_count: 0,
                    last_used: Instant::now(),
                },
            );
        }
        self.stats.write().current_entries = entries.len();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> PlanCacheStats {
        let mut stats = self.stats.read().clone();
        stats.current_entries = self.entries.read().len();
        stats
    }

    /// Clear all cached plans
    pub fn clear(&self) {
        self.entries.write().clear();
        self.stats.write().current_entries = 0;
    }
}
